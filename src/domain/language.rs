//! Language Resolver
//!
//! 语言代码 → 显示名称 + 写作指令。未知代码回退到 `en`。

/// 单个语言配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Language {
    /// ISO 639-1 代码
    pub code: &'static str,
    /// 英文显示名称（写入提示词和事件负载）
    pub name: &'static str,
    /// 以目标语言书写的写作指令
    pub instruction: &'static str,
}

/// 默认语言代码
pub const DEFAULT_LANGUAGE: &str = "en";

/// 生成接口支持的全部语言
pub const SUPPORTED_LANGUAGES: &[Language] = &[
    Language { code: "en", name: "English", instruction: "Write in clear, engaging English." },
    Language { code: "es", name: "Spanish", instruction: "Escribe en español claro y atractivo." },
    Language { code: "fr", name: "French", instruction: "Écrivez en français clair et engageant." },
    Language { code: "de", name: "German", instruction: "Schreiben Sie in klarem, ansprechendem Deutsch." },
    Language { code: "it", name: "Italian", instruction: "Scrivi in italiano chiaro e coinvolgente." },
    Language { code: "pt", name: "Portuguese", instruction: "Escreva em português claro e envolvente." },
    Language { code: "ru", name: "Russian", instruction: "Пишите на ясном, увлекательном русском языке." },
    Language { code: "ja", name: "Japanese", instruction: "明確で魅力的な日本語で書いてください。" },
    Language { code: "ko", name: "Korean", instruction: "명확하고 매력적인 한국어로 작성하세요." },
    Language { code: "zh", name: "Chinese", instruction: "用清晰、引人入胜的中文写作。" },
    Language { code: "ar", name: "Arabic", instruction: "اكتب باللغة العربية الواضحة والجذابة." },
    Language { code: "hi", name: "Hindi", instruction: "स्पष्ट, आकर्षक हिंदी में लिखें।" },
    Language { code: "nl", name: "Dutch", instruction: "Schrijf in helder, boeiend Nederlands." },
    Language { code: "sv", name: "Swedish", instruction: "Skriv på klar, engagerande svenska." },
    Language { code: "no", name: "Norwegian", instruction: "Skriv på klar, engasjerende norsk." },
    Language { code: "da", name: "Danish", instruction: "Skriv på klart, engagerende dansk." },
    Language { code: "fi", name: "Finnish", instruction: "Kirjoita selkeää, mukaansatempaavaa suomea." },
    Language { code: "pl", name: "Polish", instruction: "Pisz w jasnym, angażującym języku polskim." },
    Language { code: "tr", name: "Turkish", instruction: "Açık, ilgi çekici Türkçe yazın." },
    Language { code: "th", name: "Thai", instruction: "เขียนเป็นภาษาไทยที่ชัดเจนและน่าสนใจ" },
];

/// 拥有本地化模板正文的语言
const TEMPLATED_LANGUAGES: &[&str] = &["en", "es"];

impl Language {
    /// 按代码解析语言，大小写不敏感，未知代码回退到英文
    pub fn resolve(code: &str) -> &'static Language {
        let code = code.trim();
        SUPPORTED_LANGUAGES
            .iter()
            .find(|lang| lang.code.eq_ignore_ascii_case(code))
            .unwrap_or(&SUPPORTED_LANGUAGES[0])
    }

    /// 代码是否在支持列表中
    pub fn is_supported(code: &str) -> bool {
        SUPPORTED_LANGUAGES
            .iter()
            .any(|lang| lang.code.eq_ignore_ascii_case(code.trim()))
    }

    /// 是否有本地化的模板章节；没有时模板生成器使用英文正文
    pub fn has_template(&self) -> bool {
        TEMPLATED_LANGUAGES.contains(&self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_code() {
        let lang = Language::resolve("es");
        assert_eq!(lang.name, "Spanish");
        assert!(lang.instruction.starts_with("Escribe"));
    }

    #[test]
    fn test_resolve_is_case_insensitive() {
        assert_eq!(Language::resolve(" FR ").code, "fr");
    }

    #[test]
    fn test_unknown_code_falls_back_to_english() {
        let lang = Language::resolve("xx");
        assert_eq!(lang.code, DEFAULT_LANGUAGE);
        assert!(!Language::is_supported("xx"));
    }

    #[test]
    fn test_template_coverage_gap() {
        assert!(Language::resolve("en").has_template());
        assert!(Language::resolve("es").has_template());
        assert!(!Language::resolve("ja").has_template());
        let covered = SUPPORTED_LANGUAGES.iter().filter(|l| l.has_template()).count();
        assert!(covered < SUPPORTED_LANGUAGES.len());
    }
}
