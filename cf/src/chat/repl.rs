//! Interactive chat loop

use std::io;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, error, info, warn};

use super::greeting::{greeting, slow_print};
use super::session::ConversationSession;
use super::speech::Speaker;
use crate::config::ChatConfig;

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Exit,
    Clear,
    Message(String),
    Empty,
}

impl ChatCommand {
    pub fn parse(line: &str) -> Self {
        let input = line.trim();
        if input.is_empty() {
            return Self::Empty;
        }
        match input.to_lowercase().as_str() {
            "exit" | "quit" => Self::Exit,
            "clear" => Self::Clear,
            _ => Self::Message(input.to_string()),
        }
    }
}

/// Chat session bound to the terminal
pub struct ChatRepl {
    session: ConversationSession,
    speaker: Option<Speaker>,
    config: ChatConfig,
}

impl ChatRepl {
    pub fn new(session: ConversationSession, speaker: Option<Speaker>, config: ChatConfig) -> Self {
        Self {
            session,
            speaker,
            config,
        }
    }

    /// Greet, then read lines until exit or end of input
    pub async fn run(&mut self) -> Result<()> {
        debug!(speech = self.speaker.is_some(), "ChatRepl::run: called");
        let message = greeting(&self.config.user_name);
        slow_print(&mut io::stdout(), &message, self.config.greeting_delay()).await?;

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;
        let prompt = format!("{}: ", self.config.user_label);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => match ChatCommand::parse(&line) {
                    ChatCommand::Empty => continue,
                    ChatCommand::Exit => {
                        info!("Chat ended by user");
                        break;
                    }
                    ChatCommand::Clear => {
                        let _ = rl.add_history_entry(line.trim());
                        self.clear();
                    }
                    ChatCommand::Message(text) => {
                        let _ = rl.add_history_entry(&text);
                        self.handle_message(&text).await;
                    }
                },
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Goodbye!");
        Ok(())
    }

    fn clear(&mut self) {
        match self.session.clear() {
            Ok(()) => println!("{}", "Conversation history cleared.".dimmed()),
            Err(e) => {
                warn!(error = %e, "Failed to clear history");
                println!("{} {}", "Warning:".yellow(), e);
            }
        }
    }

    async fn handle_message(&mut self, text: &str) {
        let reply = match self.session.turn(text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(error = %e, "Turn failed");
                println!("{} {}", "Error:".red().bold(), e);
                return;
            }
        };

        println!("{} {}", format!("{}:", self.config.bot_label).bright_blue().bold(), reply.text);
        if let Some(e) = &reply.persist_error {
            println!("{} {}", "Warning:".yellow(), e);
        }

        if let Some(speaker) = &self.speaker
            && let Err(e) = speaker.speak(&reply.text).await
        {
            warn!(error = %e, "Speech failed");
            println!("{} {}", "Speech unavailable:".yellow(), e);
        }
    }
}
