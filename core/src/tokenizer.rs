use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref RE: Regex = Regex::new(r"[\p{L}\p{N}]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Text normalizer shared by indexing and querying. Both sides must agree on
/// `stem` for lookups to hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tokenizer {
    stem: bool,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self { stem: true }
    }
}

impl Tokenizer {
    pub fn new(stem: bool) -> Self {
        Self { stem }
    }

    /// NFKC normalization, lowercase, maximal letter/digit runs, then
    /// optional English stemming. Order of the input is preserved.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }
        let normalized = text.nfkc().collect::<String>().to_lowercase();
        RE.find_iter(&normalized)
            .map(|mat| {
                let token = mat.as_str();
                if self.stem { STEMMER.stem(token).into_owned() } else { token.to_string() }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tokenize() {
        let t = Tokenizer::new(true).tokenize("Running, runner's run!");
        assert!(t.iter().any(|w| w == "run"));
    }

    #[test]
    fn without_stemming_tokens_are_only_case_folded() {
        let t = Tokenizer::new(false).tokenize("Running DOGS");
        assert_eq!(t, vec!["running", "dogs"]);
    }

    #[test]
    fn empty_input_yields_nothing() {
        assert!(Tokenizer::default().tokenize("").is_empty());
        assert!(Tokenizer::default().tokenize("  --- !! ").is_empty());
    }
}
