/// Approximate token counter used while a stream is still in flight.
///
/// This is a heuristic, not a tokenizer: subword tokenizers usually emit a
/// little more than one token per whitespace word, and fragments without any
/// whitespace (punctuation, partial words) are priced by character density.
/// Authoritative counts from the server always take precedence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TokenEstimator {
    pub tokens_per_word: f64,
    pub chars_per_token: f64,
}

impl TokenEstimator {
    pub const DEFAULT_TOKENS_PER_WORD: f64 = 1.3;
    pub const DEFAULT_CHARS_PER_TOKEN: f64 = 3.0;

    pub fn new(tokens_per_word: f64, chars_per_token: f64) -> Self {
        Self {
            tokens_per_word,
            chars_per_token,
        }
    }

    /// Returns `0` for blank input and at least `1` otherwise.
    pub fn estimate(&self, text: &str) -> u32 {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return 0;
        }

        let words = trimmed.split_whitespace().count();
        if words > 0 {
            return ((words as f64 * self.tokens_per_word) as u32).max(1);
        }

        // Character-density fallback for fragments without word boundaries.
        let chars = trimmed.chars().count();
        ((chars as f64 / self.chars_per_token) as u32).max(1)
    }
}

impl Default for TokenEstimator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TOKENS_PER_WORD, Self::DEFAULT_CHARS_PER_TOKEN)
    }
}

pub fn estimate_tokens(text: &str) -> u32 {
    TokenEstimator::default().estimate(text)
}
