use chrono::Utc;
use tracing::debug;
use wt_core::{Error, RawArticle, Result, TokenizedArticle};

use crate::strategies::{create_strategy, Strategy, StrategyKind};

/// Applies the configured strategy to articles and free text.
#[derive(Debug, Clone)]
pub struct TokenizationService {
    strategy: Strategy,
}

impl TokenizationService {
    pub fn new(strategy: Strategy) -> Self {
        Self { strategy }
    }

    pub fn with_kind(kind: StrategyKind) -> Result<Self> {
        let strategy = create_strategy(kind).map_err(|e| match e {
            Error::Tokenization(_) => e,
            other => Error::Tokenization(format!("Failed to build {} strategy: {}", kind, other)),
        })?;
        Ok(Self::new(strategy))
    }

    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    pub fn kind(&self) -> StrategyKind {
        self.strategy.kind()
    }

    /// Tokenize an article's content. Articles with an empty title or
    /// content are rejected before the strategy runs.
    pub fn tokenize_article(&self, article: RawArticle) -> Result<TokenizedArticle> {
        if !article.is_valid() {
            return Err(Error::Tokenization(format!(
                "Cannot tokenize invalid article (id {}): title and content must not be empty",
                article.external_id
            )));
        }

        let tokens = self.strategy.tokenize(&article.content);
        debug!(
            "{} strategy produced {} tokens for '{}'",
            self.strategy_name(),
            tokens.len(),
            article.title
        );

        Ok(TokenizedArticle {
            article,
            tokens,
            tokenized_at: Utc::now(),
        })
    }

    pub fn tokenize_text(&self, text: &str) -> Vec<String> {
        self.strategy.tokenize(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn article(title: &str, content: &str) -> RawArticle {
        RawArticle {
            title: title.to_string(),
            content: content.to_string(),
            external_id: 123,
            retrieved_at: Utc::now(),
        }
    }

    #[test]
    fn test_tokenize_article() {
        let service = TokenizationService::with_kind(StrategyKind::Basic).unwrap();
        let tokenized = service
            .tokenize_article(article("Cat", "Cats are animals."))
            .unwrap();
        assert_eq!(tokenized.tokens, vec!["cats", "are", "animals"]);
        assert_eq!(tokenized.article.title, "Cat");
        assert!(tokenized.is_valid());
    }

    #[test]
    fn test_tokenize_article_rejects_invalid_article() {
        let service = TokenizationService::with_kind(StrategyKind::Word).unwrap();
        let err = service.tokenize_article(article("", "Cats are animals.")).unwrap_err();
        assert!(matches!(err, Error::Tokenization(_)));
        let err = service.tokenize_article(article("Cat", "  ")).unwrap_err();
        assert!(matches!(err, Error::Tokenization(_)));
    }

    #[test]
    fn test_tokenize_text_uses_selected_strategy() {
        let basic = TokenizationService::with_kind(StrategyKind::Basic).unwrap();
        let word = TokenizationService::with_kind(StrategyKind::Word).unwrap();
        assert_eq!(basic.strategy_name(), "Basic");
        assert_eq!(word.kind(), StrategyKind::Word);

        // '#' is outside the basic punctuation set but is not a word char
        assert_eq!(basic.tokenize_text("#rust rocks"), vec!["rocks"]);
        assert_eq!(word.tokenize_text("#rust rocks"), vec!["rust", "rocks"]);
    }

    #[test]
    fn test_tokenize_text_empty() {
        let service = TokenizationService::with_kind(StrategyKind::Basic).unwrap();
        assert!(service.tokenize_text("").is_empty());
    }
}
