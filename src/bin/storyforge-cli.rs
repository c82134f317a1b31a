//! Storyforge CLI - 命令行客户端
//!
//! 通过 HTTP 调用 storyforge 服务，逐步打印生成中的章节，Ctrl-C 取消。

use std::io::Write;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use storyforge::application::{AiStatusCache, ChapterDraft, DraftController, DraftStatus};
use storyforge::config::{load_config, load_config_from_path, LogConfig};
use storyforge::domain::generation::GenerationRequest;
use storyforge::infrastructure::adapters::{StoryforgeClient, StoryforgeClientConfig};
use storyforge::logging;

#[derive(Parser)]
#[command(author, version, about = "Storyforge command-line client", long_about = None)]
struct Cli {
    /// 配置文件路径
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// 服务端地址，覆盖 client.base_url
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether AI generation is available on the server
    Status,
    /// Generate a book title
    Title {
        #[arg(long)]
        genre: String,
        #[arg(long)]
        characters: String,
        #[arg(long)]
        setting: String,
        #[arg(long)]
        theme: Option<String>,
    },
    /// Generate a chapter and print it as it arrives
    Generate {
        /// Continue an existing story (fields and chapter number come from it)
        #[arg(long)]
        story: Option<Uuid>,
        #[arg(long, required_unless_present = "story")]
        prompt: Option<String>,
        #[arg(long, required_unless_present = "story")]
        genre: Option<String>,
        #[arg(long, required_unless_present = "story")]
        characters: Option<String>,
        #[arg(long, required_unless_present = "story")]
        setting: Option<String>,
        #[arg(long, default_value_t = 1)]
        chapter: u32,
        #[arg(long)]
        language: Option<String>,
        /// Save the finished draft as a new chapter of --story
        #[arg(long, requires = "story")]
        save: bool,
        /// Reveal the manual writing template instead of calling the AI
        #[arg(long)]
        manual: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config_from_path(Some(path)),
        None => load_config(),
    }
    .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // CLI 默认只输出警告，避免干扰章节文本
    logging::init(&LogConfig {
        level: if config.log.level == "info" {
            "warn".to_string()
        } else {
            config.log.level.clone()
        },
        json: config.log.json,
    });

    let base_url = cli.server.clone().unwrap_or_else(|| config.client.base_url.clone());
    let client = Arc::new(
        StoryforgeClient::new(StoryforgeClientConfig::new(base_url))
            .context("Failed to create HTTP client")?,
    );

    match cli.command {
        Commands::Status => {
            let cache = AiStatusCache::new(client.clone(), config.client.status_ttl());
            let status = cache.get().await.context("Failed to query AI status")?;
            println!(
                "{} ({} / {})",
                status.message, status.provider, status.model
            );
            println!("AI available: {}", status.ai_available);
        }
        Commands::Title {
            genre,
            characters,
            setting,
            theme,
        } => {
            let title = client
                .generate_title(&genre, &characters, &setting, theme.as_deref())
                .await
                .context("Failed to generate title")?;
            println!("{}", title.title);
            if let Some(message) = title.message {
                eprintln!("{message}");
            }
        }
        Commands::Generate {
            story,
            prompt,
            genre,
            characters,
            setting,
            chapter,
            language,
            save,
            manual,
        } => {
            let request = match story {
                Some(id) => {
                    let story = client
                        .get_story(id)
                        .await
                        .with_context(|| format!("Failed to load story {id}"))?;
                    let request = story.next_generation_request(prompt);
                    match language {
                        Some(code) => request.with_language(code),
                        None => request,
                    }
                }
                None => {
                    let chapter_number =
                        NonZeroU32::new(chapter).context("--chapter must be a positive integer")?;
                    GenerationRequest::new(
                        prompt.unwrap_or_default(),
                        genre.unwrap_or_default(),
                        characters.unwrap_or_default(),
                        setting.unwrap_or_default(),
                        chapter_number,
                    )
                    .with_language(language.unwrap_or_else(|| "en".to_string()))
                }
            };
            let chapter_number = request.chapter_number.get();

            let controller = Arc::new(DraftController::new(client.clone(), config.client.reveal()));
            let draft = run_generation(controller, request, manual).await?;

            report(&draft);

            if save {
                if let Some(story_id) = story {
                    save_draft(&client, story_id, &draft, chapter_number).await?;
                }
            }
        }
    }

    Ok(())
}

/// 驱动一次生成：前台打印进度，Ctrl-C 取消
async fn run_generation(
    controller: Arc<DraftController>,
    request: GenerationRequest,
    manual: bool,
) -> anyhow::Result<ChapterDraft> {
    let done = CancellationToken::new();
    let printer = tokio::spawn(print_progress(controller.subscribe(), done.clone()));

    let interrupt = tokio::spawn({
        let controller = controller.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                controller.cancel();
            }
        }
    });

    let result = if manual {
        controller.start_manual(&request).await
    } else {
        controller.generate(request).await
    };

    interrupt.abort();
    done.cancel();
    printer.await.context("Progress printer failed")?;

    Ok(result?)
}

/// 增量打印草稿文本；文本被整体替换（例如切换到模板）时重新打印
async fn print_progress(mut rx: watch::Receiver<ChapterDraft>, done: CancellationToken) {
    let mut printed = String::new();
    loop {
        let finished = tokio::select! {
            changed = rx.changed() => changed.is_err(),
            _ = done.cancelled() => true,
        };

        let text = rx.borrow_and_update().text.clone();
        render(&mut printed, &text);

        if finished {
            break;
        }
    }
    println!();
}

fn render(printed: &mut String, text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Some(suffix) = text.strip_prefix(printed.as_str()) {
        let _ = write!(stdout, "{suffix}");
    } else if !text.is_empty() {
        let _ = write!(stdout, "\n\n{text}");
    }
    let _ = stdout.flush();
    *printed = text.to_string();
}

fn report(draft: &ChapterDraft) {
    match draft.status {
        DraftStatus::Complete | DraftStatus::Failed => {
            eprintln!(
                "[{}] {} words{}",
                draft.status.as_str(),
                draft.word_count,
                if draft.ai_generated { ", AI generated" } else { ", template" }
            );
        }
        _ => {}
    }
    if let Some(message) = &draft.message {
        eprintln!("{message}");
    }
}

async fn save_draft(
    client: &StoryforgeClient,
    story_id: Uuid,
    draft: &ChapterDraft,
    chapter_number: u32,
) -> anyhow::Result<()> {
    let Some(chapter) = draft.to_new_chapter(chapter_number) else {
        eprintln!("Nothing to save");
        return Ok(());
    };
    let saved = client
        .create_chapter(story_id, &chapter)
        .await
        .context("Failed to save chapter")?;
    eprintln!("Saved chapter {} ({})", saved.chapter_number, saved.id);
    Ok(())
}
