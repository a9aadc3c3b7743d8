//! Spoken replies: text-to-speech synthesis and local playback

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;

#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("Speech configuration error: {0}")]
    Config(String),

    #[error("Speech request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Speech API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Audio file {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start audio player '{command}': {source}")]
    PlayerSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Audio player '{command}' exited with {status}")]
    PlayerFailed { command: String, status: String },
}

/// Turns text into encoded audio
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError>;
}

/// Plays an audio file to completion
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, path: &Path) -> Result<(), SpeechError>;
}

/// OpenAI-compatible `/v1/audio/speech` synthesizer producing mp3
pub struct OpenAiSpeech {
    base_url: String,
    api_key: String,
    model: String,
    voice: String,
    http: Client,
}

impl OpenAiSpeech {
    pub fn from_config(config: &SpeechConfig) -> Result<Self, SpeechError> {
        debug!(base_url = %config.base_url, model = %config.model, "OpenAiSpeech::from_config: called");
        let api_key = config.api_key().ok_or_else(|| {
            SpeechError::Config(format!(
                "API key not found. Set the {} environment variable.",
                config.api_key_env
            ))
        })?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            voice: config.voice.clone(),
            http: Client::new(),
        })
    }

    fn build_request_body(&self, text: &str) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "input": text,
            "voice": self.voice,
            "response_format": "mp3",
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SpeechError> {
        debug!(chars = text.chars().count(), voice = %self.voice, "synthesize: called");
        let response = self
            .http
            .post(format!("{}/v1/audio/speech", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&self.build_request_body(text))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SpeechError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Plays audio by running an external command with the file path appended
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
    pub fn new(command: &[String]) -> Result<Self, SpeechError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| SpeechError::Config("player command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
        })
    }
}

#[async_trait]
impl AudioPlayer for CommandPlayer {
    async fn play(&self, path: &Path) -> Result<(), SpeechError> {
        debug!(program = %self.program, ?path, "CommandPlayer::play: called");
        let status = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .arg(path)
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await
            .map_err(|source| SpeechError::PlayerSpawn {
                command: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::PlayerFailed {
                command: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// File name for one synthesized reply
pub fn audio_file_name(unix_millis: u128) -> String {
    format!("response_{}.mp3", unix_millis)
}

/// Synthesizes a reply, saves it, plays it
pub struct Speaker {
    synthesizer: Box<dyn SpeechSynthesizer>,
    player: Box<dyn AudioPlayer>,
    audio_dir: PathBuf,
    keep_audio: bool,
}

impl Speaker {
    pub fn new(
        synthesizer: Box<dyn SpeechSynthesizer>,
        player: Box<dyn AudioPlayer>,
        audio_dir: impl Into<PathBuf>,
        keep_audio: bool,
    ) -> Self {
        Self {
            synthesizer,
            player,
            audio_dir: audio_dir.into(),
            keep_audio,
        }
    }

    /// Build the configured speaker; `None` when speech is disabled
    pub fn from_config(config: &SpeechConfig) -> Result<Option<Self>, SpeechError> {
        debug!(enabled = config.enabled, "Speaker::from_config: called");
        if !config.enabled {
            return Ok(None);
        }
        let synthesizer = OpenAiSpeech::from_config(config)?;
        let player = CommandPlayer::new(&config.player)?;
        Ok(Some(Self::new(
            Box::new(synthesizer),
            Box::new(player),
            &config.audio_dir,
            config.keep_audio,
        )))
    }

    /// Speak `text`, returning the audio path
    ///
    /// Returns once playback finishes. The file is removed afterwards unless
    /// audio is kept, including when playback fails.
    pub async fn speak(&self, text: &str) -> Result<PathBuf, SpeechError> {
        debug!(chars = text.chars().count(), "speak: called");
        let audio = self.synthesizer.synthesize(text).await?;

        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        let path = self.audio_dir.join(audio_file_name(millis));
        let io_error = |source| SpeechError::Io {
            path: path.clone(),
            source,
        };

        tokio::fs::create_dir_all(&self.audio_dir).await.map_err(io_error)?;
        tokio::fs::write(&path, &audio).await.map_err(io_error)?;
        info!(path = %path.display(), bytes = audio.len(), "Saved reply audio");

        let played = self.player.play(&path).await;

        if !self.keep_audio
            && let Err(e) = tokio::fs::remove_file(&path).await
        {
            warn!(path = %path.display(), error = %e, "Failed to remove reply audio");
        }
        played.map(|()| path)
    }
}
