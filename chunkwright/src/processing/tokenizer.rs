use std::sync::Arc;

use tiktoken_rs::CoreBPE;

/// Token counting for budget decisions. Uses the cl100k_base encoding;
/// if the encoder cannot be constructed, falls back to a chars/4
/// approximation so the pipeline still produces bounded chunks.
#[derive(Clone)]
pub struct TokenCounter {
    bpe: Option<Arc<CoreBPE>>,
}

impl TokenCounter {
    pub fn new() -> Self {
        match tiktoken_rs::cl100k_base() {
            Ok(bpe) => Self {
                bpe: Some(Arc::new(bpe)),
            },
            Err(e) => {
                tracing::warn!(error = %e, "cl100k_base unavailable, using chars/4 estimate");
                Self { bpe: None }
            }
        }
    }

    pub fn count(&self, text: &str) -> usize {
        match &self.bpe {
            Some(bpe) => bpe.encode_with_special_tokens(text).len(),
            None => text.chars().count().div_ceil(4),
        }
    }
}

impl Default for TokenCounter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCounter")
            .field("encoder", &self.bpe.as_ref().map(|_| "cl100k_base"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_is_zero_tokens() {
        let counter = TokenCounter::new();
        assert_eq!(counter.count(""), 0);
    }

    #[test]
    fn test_counts_grow_with_text() {
        let counter = TokenCounter::new();
        let short = counter.count("hello");
        let long = counter.count("hello world, this is a longer sentence with more words");
        assert!(short >= 1);
        assert!(long > short);
    }

    #[test]
    fn test_fallback_estimate() {
        let counter = TokenCounter { bpe: None };
        assert_eq!(counter.count("abcdefgh"), 2);
        assert_eq!(counter.count("abc"), 1);
    }

    #[test]
    fn test_clone_shares_encoder() {
        let counter = TokenCounter::new();
        let clone = counter.clone();
        assert_eq!(counter.count("same text"), clone.count("same text"));
    }
}
