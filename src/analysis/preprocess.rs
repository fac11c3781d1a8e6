//! Deterministic text normalization applied before tokenization.

use once_cell::sync::Lazy;
use regex::Regex;

// Same patterns the model saw during fine-tuning; changing them would shift
// the input distribution.
static URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"http\S+|www.\S+").expect("url pattern"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern"));

/// Placeholder substituted for URL-like substrings.
pub const URL_TOKEN: &str = "[URL]";

/// Normalizes raw text: URL-like substrings become [`URL_TOKEN`], any run of
/// whitespace collapses to a single space, and leading/trailing whitespace
/// is trimmed. Pure and total; the empty string maps to itself.
pub fn normalize(text: &str) -> String {
    let without_urls = URL_RE.replace_all(text, URL_TOKEN);
    let collapsed = WHITESPACE_RE.replace_all(&without_urls, " ");
    collapsed.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_urls_and_collapses_whitespace() {
        assert_eq!(
            normalize("Check this out http://bad.site now!!"),
            "Check this out [URL] now!!"
        );
    }

    #[test]
    fn handles_www_urls() {
        assert_eq!(normalize("see www.example.com please"), "see [URL] please");
    }

    #[test]
    fn collapses_newlines_and_tabs() {
        assert_eq!(normalize("a\r\nb\t\tc   d"), "a b c d");
    }

    #[test]
    fn trims_edges() {
        assert_eq!(normalize("  привет мир  "), "привет мир");
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   \n\t "), "");
    }

    #[test]
    fn output_has_no_whitespace_runs_or_urls() {
        let samples = [
            "hello    world",
            "ссылка http://a.b/c\nи ещё www.x.y конец",
            "\n\n\nмного\r\rстрок\t",
        ];
        for s in samples {
            let out = normalize(s);
            assert!(!out.contains("  "), "whitespace run in {:?}", out);
            assert!(!out.contains("http"), "raw url in {:?}", out);
            assert_eq!(out, out.trim());
        }
    }
}
