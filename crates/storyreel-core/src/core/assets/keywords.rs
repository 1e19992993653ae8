//! Keyword and file name derivation for new assets.

/// Words ignored when deriving keywords from a prompt
const STOP_WORDS: [&str; 4] = ["the", "and", "with", "into"];

/// Keyword attached to every generated asset
pub const GENERATED_KEYWORD: &str = "ai-generated";

/// Derives keywords for a generated asset: the generated marker followed by
/// the first two prompt words longer than three characters.
pub fn prompt_keywords(prompt: &str) -> Vec<String> {
    let lowered = prompt.to_lowercase();
    let mut keywords = vec![GENERATED_KEYWORD.to_string()];
    keywords.extend(
        lowered
            .split(' ')
            .filter(|w| w.chars().count() > 3 && !STOP_WORDS.contains(w))
            .take(2)
            .map(str::to_string),
    );
    keywords
}

/// Derives a single keyword from an uploaded file name: the part before the
/// first dot with non-alphanumerics replaced by spaces.
pub fn filename_keywords(file_name: &str) -> Vec<String> {
    let stem = file_name.split('.').next().unwrap_or_default();
    let keyword: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase();
    vec![keyword]
}

/// File name for a generated scene image.
pub fn generated_file_name(prompt: &str, part: usize, parts: usize) -> String {
    let head: String = prompt
        .chars()
        .take(15)
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    if parts > 1 {
        format!("{head}_pt{}.png", part + 1)
    } else {
        format!("{head}.png")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_keywords_skip_short_and_stop_words() {
        assert_eq!(
            prompt_keywords("The cat with boots jumps into the river"),
            vec!["ai-generated", "boots", "jumps"]
        );
        assert_eq!(prompt_keywords("a b c"), vec!["ai-generated"]);
    }

    #[test]
    fn test_filename_keywords() {
        assert_eq!(filename_keywords("my.holiday.jpg"), vec!["my"]);
        assert_eq!(filename_keywords("City_Night-2.png"), vec!["city night 2"]);
    }

    #[test]
    fn test_generated_file_name() {
        assert_eq!(generated_file_name("Sunset over lake", 0, 1), "Sunset_over_lak.png");
        assert_eq!(generated_file_name("Short", 2, 4), "Short_pt3.png");
    }
}
