use zonedex_core::Tokenizer;

#[test]
fn it_normalizes_and_stems() {
    let words = Tokenizer::new(true).tokenize("Running Runners RUN! The ﬁle menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    // NFKC folds the ligature
    assert!(words.contains(&"file".to_string()));
}

#[test]
fn it_keeps_digits_and_order() {
    let words = Tokenizer::new(false).tokenize("CS121 covers ACM, 2024 edition");
    assert_eq!(words, vec!["cs121", "covers", "acm", "2024", "edition"]);
}

#[test]
fn it_keeps_stopwords() {
    let words = Tokenizer::new(true).tokenize("master of software engineering");
    assert!(words.contains(&"of".to_string()));
}
