//! Conversation variant: a chat bot over the same generation contract

mod greeting;
mod history;
mod repl;
mod session;
mod speech;

pub use greeting::{DayPeriod, MARKERS, greeting, greeting_for, slow_print};
pub use history::{ConversationTurn, HistoryStore, Role, StorageError};
pub use repl::{ChatCommand, ChatRepl};
pub use session::{CONTEXT_PREFIX, ConversationSession, SessionParams, TurnReply};
pub use speech::{AudioPlayer, CommandPlayer, OpenAiSpeech, Speaker, SpeechError, SpeechSynthesizer, audio_file_name};
