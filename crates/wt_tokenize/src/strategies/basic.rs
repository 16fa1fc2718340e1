use regex::Regex;
use wt_core::Result;

use super::{compile, entity_pattern, whitespace_pattern, TokenizationStrategy};

// whitespace plus the punctuation set
const DELIMITERS: &str = r#"[\s,;:!?.\-()\[\]"'`]+"#;

/// Splits on whitespace and a fixed punctuation set, keeping tokens of two
/// or more characters that start with a letter or digit.
#[derive(Debug, Clone)]
pub struct BasicTokenizer {
    entity: Regex,
    whitespace: Regex,
    delimiters: Regex,
}

impl BasicTokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entity: entity_pattern()?,
            whitespace: whitespace_pattern()?,
            delimiters: compile("delimiter", DELIMITERS)?,
        })
    }

    fn clean_text(&self, text: &str) -> String {
        let text = self.entity.replace_all(text, " ");
        self.whitespace.replace_all(&text, " ").into_owned()
    }

    fn is_valid_token(word: &str) -> bool {
        let mut chars = word.chars();
        match chars.next() {
            Some(first) => first.is_alphanumeric() && chars.next().is_some(),
            None => false,
        }
    }
}

impl TokenizationStrategy for BasicTokenizer {
    fn name(&self) -> &str {
        "Basic"
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let cleaned = self.clean_text(text);
        self.delimiters
            .split(&cleaned)
            .map(str::trim)
            .filter(|word| Self::is_valid_token(word))
            .map(str::to_lowercase)
            .collect()
    }
}
