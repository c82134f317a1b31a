//! 提示词构建

use super::GenerationRequest;

/// 章节生成的系统提示词
pub fn system_prompt(request: &GenerationRequest) -> String {
    let language = request.language();
    let previous = request
        .previous_chapters_summary
        .as_deref()
        .map(|summary| format!("Previous chapters summary: {}", summary))
        .unwrap_or_default();

    format!(
        "You are a creative storyteller. Generate engaging, age-appropriate stories based on the user's preferences.

IMPORTANT: {instruction}

Story Details:
- Genre: {genre}
- Main Characters: {characters}
- Setting: {setting}
- Chapter Number: {chapter}
- Language: {name}

{previous}

Write a compelling chapter that:
1. Is approximately 300-500 words
2. Advances the plot meaningfully
3. Maintains consistency with previous chapters
4. Includes dialogue and descriptive scenes
5. Ends with a hook for the next chapter (unless it's the final chapter)
6. Uses markdown formatting for better readability (headings, emphasis, etc.)
7. Is written entirely in {name}

Format the response as a complete chapter with proper paragraphs and markdown formatting. Ensure all text, including dialogue, narration, and descriptions, is in {name}.",
        instruction = language.instruction,
        genre = request.genre,
        characters = request.characters,
        setting = request.setting,
        chapter = request.chapter_number,
        name = language.name,
        previous = previous,
    )
}

/// 书名生成的用户提示词
pub fn title_prompt(genre: &str, characters: &str, setting: &str, theme: Option<&str>) -> String {
    let theme = theme
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(|t| format!("The theme involves {}.", t))
        .unwrap_or_default();
    format!(
        "Generate a creative and engaging book title for a {genre} story featuring {characters} set in {setting}. {theme} Return only the title, nothing else."
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::num::NonZeroU32;

    #[test]
    fn test_system_prompt_uses_language_and_details() {
        let req = GenerationRequest::new("p", "Mystery", "Inspector Lu", "Harbin", NonZeroU32::MIN)
            .with_language("zh")
            .with_previous_chapters(Some("Chapter 1: a body in the snow...".into()));
        let prompt = system_prompt(&req);
        assert!(prompt.contains("IMPORTANT: 用清晰、引人入胜的中文写作。"));
        assert!(prompt.contains("- Main Characters: Inspector Lu"));
        assert!(prompt.contains("- Chapter Number: 1"));
        assert!(prompt.contains("Previous chapters summary: Chapter 1: a body in the snow..."));
        assert!(prompt.contains("Is written entirely in Chinese"));
    }

    #[test]
    fn test_title_prompt_theme_is_optional() {
        let with = title_prompt("Sci-Fi", "Kai", "Mars", Some("loss"));
        assert!(with.contains("The theme involves loss."));
        let without = title_prompt("Sci-Fi", "Kai", "Mars", None);
        assert!(!without.contains("theme"));
        assert!(without.ends_with("Return only the title, nothing else."));
    }
}
