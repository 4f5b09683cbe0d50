//! Word-based chunking of converted markdown.

/// Default chunk size in whitespace-separated words.
pub const DEFAULT_MAX_TOKENS: usize = 64;

/// Splits text into chunks of at most `max_tokens` words.
///
/// Paragraphs (blank-line separated) are kept together while they fit; a
/// paragraph longer than `max_tokens` is split on word boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Chunker {
    max_tokens: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_TOKENS)
    }
}

impl Chunker {
    /// `max_tokens` of zero is treated as one.
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens: max_tokens.max(1),
        }
    }

    pub fn max_tokens(&self) -> usize {
        self.max_tokens
    }

    pub fn chunk(&self, text: &str) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        for paragraph in text.split("\n\n") {
            let words: Vec<&str> = paragraph.split_whitespace().collect();
            if words.is_empty() {
                continue;
            }
            if !current.is_empty() && current.len() + words.len() > self.max_tokens {
                chunks.push(current.join(" "));
                current.clear();
            }
            for word in words {
                if current.len() == self.max_tokens {
                    chunks.push(current.join(" "));
                    current.clear();
                }
                current.push(word);
            }
        }
        if !current.is_empty() {
            chunks.push(current.join(" "));
        }
        chunks
    }
}
