//! Content moderation against a forbidden-word list.
//!
//! The list is a text file with one substring per line. It is re-read on every
//! check, so edits take effect on the next message without a restart. Matching
//! is case-insensitive substring search. If the file cannot be read the check
//! passes (fail-open): moderation must never take the chat down.

use std::path::{Path, PathBuf};

/// Parsed forbidden-word list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForbiddenWords {
    /// Lowercased, trimmed, non-empty entries
    words: Vec<String>,
}

impl ForbiddenWords {
    /// Parse list contents. Blank lines are skipped; an empty entry would
    /// otherwise match every message.
    pub fn parse(contents: &str) -> Self {
        let words = contents
            .lines()
            .map(str::trim)
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        Self { words }
    }

    /// First entry contained in `text`, ignoring case.
    pub fn first_match(&self, text: &str) -> Option<&str> {
        let text = text.to_lowercase();
        self.words.iter().find(|w| text.contains(w.as_str())).map(String::as_str)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

/// Stateless message checker bound to a forbidden-word file.
#[derive(Debug, Clone)]
pub struct Moderator {
    words_path: PathBuf,
}

impl Moderator {
    /// Create a moderator reading its list from `words_path`.
    pub fn new(words_path: impl Into<PathBuf>) -> Self {
        Self { words_path: words_path.into() }
    }

    /// Path of the forbidden-word list.
    pub fn words_path(&self) -> &Path {
        &self.words_path
    }

    /// Whether `text` contains a forbidden word.
    pub async fn violates(&self, text: &str) -> bool {
        self.first_violation(text).await.is_some()
    }

    /// The forbidden word `text` contains, if any.
    pub async fn first_violation(&self, text: &str) -> Option<String> {
        let words = self.load().await?;
        words.first_match(text).map(str::to_string)
    }

    async fn load(&self) -> Option<ForbiddenWords> {
        match tokio::fs::read_to_string(&self.words_path).await {
            Ok(contents) => Some(ForbiddenWords::parse(&contents)),
            Err(e) => {
                tracing::debug!(
                    path = %self.words_path.display(),
                    "Forbidden-word list unreadable, allowing message: {}",
                    e
                );
                None
            },
        }
    }
}
