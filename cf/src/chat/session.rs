//! Conversation session: windowed context, one generation per turn
//!
//! The session owns the in-memory history. It loads it once when opened and
//! saves the full history after every change. A turn only touches history
//! when generation succeeds; the user and assistant turns are appended
//! together so the log never holds an unanswered message.

use tracing::{debug, info, warn};

use super::history::{ConversationTurn, HistoryStore, Role, StorageError};
use crate::config::ChatConfig;
use crate::generator::{GenerationError, SectionGenerator};
use crate::text::clean_generated_text;

/// Prefix of the system context sent with every turn
pub const CONTEXT_PREFIX: &str = "Conversation so far: ";

/// Per-session generation and formatting parameters
#[derive(Debug, Clone)]
pub struct SessionParams {
    pub window: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub user_label: String,
    pub bot_label: String,
}

impl Default for SessionParams {
    fn default() -> Self {
        Self::from(&ChatConfig::default())
    }
}

impl From<&ChatConfig> for SessionParams {
    fn from(config: &ChatConfig) -> Self {
        Self {
            window: config.window,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            user_label: config.user_label.clone(),
            bot_label: config.bot_label.clone(),
        }
    }
}

/// Outcome of a successful turn
#[derive(Debug)]
pub struct TurnReply {
    /// Cleaned assistant text
    pub text: String,
    /// Set when the reply was produced but saving history failed
    pub persist_error: Option<StorageError>,
}

/// Stateful chat over a [`SectionGenerator`]
pub struct ConversationSession {
    generator: SectionGenerator,
    store: HistoryStore,
    history: Vec<ConversationTurn>,
    params: SessionParams,
}

impl ConversationSession {
    /// Open a session, loading any stored history
    pub fn open(generator: SectionGenerator, store: HistoryStore, params: SessionParams) -> Result<Self, StorageError> {
        debug!(path = ?store.path(), ?params, "ConversationSession::open: called");
        let history = store.load()?;
        info!(turns = history.len(), path = %store.path().display(), "Loaded conversation history");
        Ok(Self {
            generator,
            store,
            history,
            params,
        })
    }

    pub fn history(&self) -> &[ConversationTurn] {
        &self.history
    }

    pub fn params(&self) -> &SessionParams {
        &self.params
    }

    fn label(&self, role: Role) -> &str {
        match role {
            Role::User => &self.params.user_label,
            Role::Assistant => &self.params.bot_label,
        }
    }

    /// System context for the next turn
    ///
    /// The most recent `window` turns, counting the pending user turn, each
    /// rendered `"{label}: {text}"` and joined by single spaces.
    pub fn system_context(&self, pending: &ConversationTurn) -> String {
        let turns: Vec<&ConversationTurn> = self.history.iter().chain(std::iter::once(pending)).collect();
        let start = turns.len().saturating_sub(self.params.window);
        let conversation = turns[start..]
            .iter()
            .map(|turn| format!("{}: {}", self.label(turn.role), turn.text))
            .collect::<Vec<_>>()
            .join(" ");
        format!("{}{}", CONTEXT_PREFIX, conversation)
    }

    /// Run one turn
    ///
    /// On generation failure the history is left exactly as it was. On
    /// success both turns are appended and the history saved; a save failure
    /// is reported in the reply instead of discarding it.
    pub async fn turn(&mut self, message: &str) -> Result<TurnReply, GenerationError> {
        debug!(message_len = message.len(), "turn: called");
        let user_turn = ConversationTurn::user(message);
        let system_context = self.system_context(&user_turn);

        let raw = self
            .generator
            .generate(message, &system_context, self.params.max_tokens, self.params.temperature)
            .await?;
        let text = clean_generated_text(&raw);

        self.history.push(user_turn);
        self.history.push(ConversationTurn::assistant(text.clone()));

        let persist_error = self.store.save(&self.history).err();
        if let Some(e) = &persist_error {
            warn!(error = %e, "Reply generated but history was not saved");
        }
        debug!(turns = self.history.len(), "turn: done");
        Ok(TurnReply { text, persist_error })
    }

    /// Forget the conversation and save the empty history
    pub fn clear(&mut self) -> Result<(), StorageError> {
        debug!(turns = self.history.len(), "clear: called");
        self.history.clear();
        self.store.save(&self.history)?;
        info!("Conversation history cleared");
        Ok(())
    }
}
