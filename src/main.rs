//! Storyforge - 故事写作服务
//!
//! 启动 HTTP 服务：章节生成（SSE）、书名生成、AI 状态、故事存储

use std::sync::Arc;

use storyforge::application::{AvailabilityGate, CompletionPort};
use storyforge::config::{load_config, print_config, ProviderKind};
use storyforge::infrastructure::adapters::{DeepSeekClient, DeepSeekClientConfig, ScriptedCompletion};
use storyforge::infrastructure::http::{AppState, HttpServer, ServerConfig};
use storyforge::infrastructure::memory::InMemoryStoryStore;
use storyforge::logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    logging::init(&config.log);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Storyforge starting");
    print_config(&config);

    // 补全引擎
    let completion: Arc<dyn CompletionPort> = match config.ai.provider {
        ProviderKind::Deepseek => {
            let client_config = DeepSeekClientConfig {
                base_url: config.ai.base_url.clone(),
                model: config.ai.model.clone(),
                timeout_secs: config.ai.timeout_secs,
                connect_timeout_secs: config.ai.connect_timeout_secs,
                ..Default::default()
            };
            Arc::new(DeepSeekClient::new(client_config)?)
        }
        ProviderKind::Scripted => {
            tracing::warn!("Using scripted completion provider, AI output is canned");
            Arc::new(ScriptedCompletion::demo())
        }
    };

    // 凭证缺失是受支持的配置：生成走模板章节
    let gate = AvailabilityGate::new(config.ai.api_key_env.clone(), config.ai.configured_key());
    if !gate.is_available() {
        tracing::info!(
            env_var = %gate.env_var(),
            "AI credential not configured, chapters will use templates"
        );
    }

    let store = Arc::new(InMemoryStoryStore::new());
    let state = AppState::new(completion, store, gate, config.generation_settings());

    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let server = HttpServer::new(server_config, state);

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            match tokio::signal::ctrl_c().await {
                Ok(()) => tracing::info!("Received shutdown signal"),
                Err(err) => {
                    // 无法监听信号时继续运行，由进程管理器终止
                    tracing::error!(error = %err, "Failed to listen for shutdown signal");
                    std::future::pending::<()>().await
                }
            }
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
