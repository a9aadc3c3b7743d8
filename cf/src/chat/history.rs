//! Conversation history and its file store
//!
//! The store holds one JSON object per line. It is read once when a session
//! starts and rewritten in full after every change.
//!
//! Older files hold plain `"{label}: text"` lines instead, with multi-line
//! replies spilling onto the lines that follow. Those are still read, and the
//! next save converts them. A line that fits neither form is an error rather
//! than something to drop, since the rewrite would erase it for good.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::persist::write_atomically;

/// History load/save errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read history {}: {}", .path.display(), .source)]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write history {}: {}", .path.display(), .source)]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to encode history: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Unrecognized history line {} in {}: {:?}", .line, .path.display(), .text)]
    Unrecognized { path: PathBuf, line: usize, text: String },
}

/// Who said it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub text: String,
}

impl ConversationTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
        }
    }
}

/// Line-oriented history file
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
    user_label: String,
    bot_label: String,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            user_label: crate::DEFAULT_USER_LABEL.to_string(),
            bot_label: crate::DEFAULT_BOT_LABEL.to_string(),
        }
    }

    /// Speaker labels that prefix turns in plain-text history files
    pub fn with_labels(mut self, user_label: impl Into<String>, bot_label: impl Into<String>) -> Self {
        self.user_label = user_label.into();
        self.bot_label = bot_label.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored turn
    ///
    /// A missing file is an empty history. Blank lines are ignored.
    pub fn load(&self) -> Result<Vec<ConversationTurn>, StorageError> {
        debug!(path = ?self.path, "HistoryStore::load: called");
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("HistoryStore::load: no history file, starting empty");
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let mut turns: Vec<ConversationTurn> = Vec::new();
        // Whether the last turn came from a plain-text line and may continue
        let mut plain_open = false;
        let mut plain_lines = 0;
        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if let Ok(turn) = serde_json::from_str::<ConversationTurn>(line) {
                turns.push(turn);
                plain_open = false;
                continue;
            }

            plain_lines += 1;
            if let Some(turn) = self.parse_labeled(line) {
                turns.push(turn);
                plain_open = true;
            } else if let Some(last) = turns.last_mut().filter(|_| plain_open) {
                last.text.push('\n');
                last.text.push_str(line);
            } else {
                return Err(StorageError::Unrecognized {
                    path: self.path.clone(),
                    line: line_no + 1,
                    text: line.to_string(),
                });
            }
        }

        if plain_lines > 0 {
            info!(path = %self.path.display(), lines = plain_lines, "Read plain-text history; it will be rewritten as JSON lines");
        }
        debug!(turns = turns.len(), "HistoryStore::load: done");
        Ok(turns)
    }

    fn parse_labeled(&self, line: &str) -> Option<ConversationTurn> {
        let text_after = |label: &str| {
            line.strip_prefix(label)
                .and_then(|rest| rest.strip_prefix(':'))
                .map(|rest| rest.trim_start().to_string())
        };
        if let Some(text) = text_after(&self.user_label) {
            Some(ConversationTurn::user(text))
        } else {
            text_after(&self.bot_label).map(ConversationTurn::assistant)
        }
    }

    /// Replace the stored history with `turns`
    pub fn save(&self, turns: &[ConversationTurn]) -> Result<(), StorageError> {
        debug!(path = ?self.path, turns = turns.len(), "HistoryStore::save: called");
        let mut content = String::new();
        for turn in turns {
            content.push_str(&serde_json::to_string(turn)?);
            content.push('\n');
        }
        write_atomically(&self.path, content.as_bytes()).map_err(|source| StorageError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
