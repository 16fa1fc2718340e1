use regex::Regex;
use wt_core::Result;

use super::{compile, entity_pattern, TokenizationStrategy};

/// Strips every non-word, non-whitespace character before splitting, so
/// any punctuation (not just a fixed set) separates words.
#[derive(Debug, Clone)]
pub struct WordTokenizer {
    entity: Regex,
    non_word: Regex,
}

impl WordTokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            entity: entity_pattern()?,
            non_word: compile("non-word", r"[^\w\s]")?,
        })
    }
}

impl TokenizationStrategy for WordTokenizer {
    fn name(&self) -> &str {
        "Word"
    }

    fn tokenize(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let text = self.entity.replace_all(text, " ");
        let text = self.non_word.replace_all(&text, " ");
        text.split_whitespace()
            .filter(|word| word.chars().count() > 1)
            .map(str::to_lowercase)
            .collect()
    }
}
