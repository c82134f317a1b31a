//! Fallback Title Generator
//!
//! 无 AI 时的书名候选，由角色首词、场景词和类型拼出 8 种模式，随机取一个。

use rand::seq::SliceRandom;
use rand::Rng;

/// 所有兜底失败时的最后书名
pub const UNTITLED: &str = "An Untitled Adventure";

/// 生成全部书名候选（顺序固定）
pub fn fallback_title_candidates(genre: &str, characters: &str, setting: &str) -> Vec<String> {
    let hero = first_word(characters).unwrap_or("Heroes");
    let setting_words: Vec<&str> = setting.split(' ').collect();
    let place = first_word(setting);
    let tail = setting_words[setting_words.len().saturating_sub(2)..].join(" ");
    let head = setting_words[..setting_words.len().min(2)].join(" ");

    vec![
        format!("The {} of {}", genre, hero),
        format!("{} and the {}", hero, tail),
        format!("Chronicles of {}", place.unwrap_or("Adventure")),
        format!("The {} {}", place.unwrap_or("Mysterious"), genre),
        format!("{}'s Quest", hero),
        format!("Legends of {}", head),
        format!("The {} Chronicles", genre),
        format!("{} in {}", hero, place.unwrap_or("Wonderland")),
    ]
}

/// 随机挑选一个书名
pub fn pick_fallback_title<R: Rng + ?Sized>(
    rng: &mut R,
    genre: &str,
    characters: &str,
    setting: &str,
) -> String {
    fallback_title_candidates(genre, characters, setting)
        .choose(rng)
        .cloned()
        .unwrap_or_else(|| UNTITLED.to_string())
}

fn first_word(text: &str) -> Option<&str> {
    text.split(' ').next().filter(|w| !w.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_candidates_use_first_words() {
        let titles = fallback_title_candidates("Mystery", "Ada Lovelace", "the foggy docks of London");
        assert_eq!(titles.len(), 8);
        assert_eq!(titles[0], "The Mystery of Ada");
        assert_eq!(titles[1], "Ada and the of London");
        assert_eq!(titles[2], "Chronicles of the");
        assert_eq!(titles[4], "Ada's Quest");
        assert_eq!(titles[5], "Legends of the foggy");
        assert_eq!(titles[6], "The Mystery Chronicles");
    }

    #[test]
    fn test_blank_inputs_use_placeholders() {
        let titles = fallback_title_candidates("Fantasy", "", "");
        assert_eq!(titles[0], "The Fantasy of Heroes");
        assert_eq!(titles[3], "The Mysterious Fantasy");
        assert_eq!(titles[7], "Heroes in Wonderland");
    }

    #[test]
    fn test_pick_is_one_of_the_candidates() {
        let mut rng = StdRng::seed_from_u64(7);
        let candidates = fallback_title_candidates("Sci-Fi", "Kai", "Europa Station");
        for _ in 0..20 {
            let title = pick_fallback_title(&mut rng, "Sci-Fi", "Kai", "Europa Station");
            assert!(candidates.contains(&title));
        }
    }
}
