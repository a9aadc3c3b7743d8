//! ChapterForge configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main ChapterForge configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[serde(rename = "log-level")]
    pub log_level: Option<String>,

    /// Generation endpoint configuration
    pub llm: LlmConfig,

    /// Retry and sampling parameters for chapter generation
    pub generation: GenerationConfig,

    /// Book output configuration
    pub book: BookConfig,

    /// Conversation session configuration
    pub chat: ChatConfig,
}

impl Config {
    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .chapterforge.yml
        let local_config = PathBuf::from(".chapterforge.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/chapterforge/chapterforge.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("chapterforge").join("chapterforge.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is initialized
    ///
    /// Errors are swallowed: a broken config file is reported properly by
    /// [`Config::load`] once logging is up.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        let candidates = match config_path {
            Some(path) => vec![path.clone()],
            None => {
                let mut paths = vec![PathBuf::from(".chapterforge.yml")];
                if let Some(dir) = dirs::config_dir() {
                    paths.push(dir.join("chapterforge").join("chapterforge.yml"));
                }
                paths
            }
        };

        candidates
            .iter()
            .find(|p| p.exists())
            .and_then(|p| fs::read_to_string(p).ok())
            .and_then(|content| serde_yaml::from_str::<Config>(&content).ok())
            .and_then(|config| config.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Generation endpoint configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name ("gradio" or "openai")
    pub provider: String,

    /// Endpoint base URL (service address)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Gradio route name (gradio provider only)
    #[serde(rename = "api-name")]
    pub api_name: String,

    /// Model identifier (openai provider only)
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "gradio".to_string(),
            base_url: "https://chuanli11-chat-llama-3-2-3b-instruct-uncensored.hf.space".to_string(),
            api_name: "chat".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "HF_TOKEN".to_string(),
            timeout_ms: 300_000,
        }
    }
}

impl LlmConfig {
    /// Read the API key, if the configured environment variable is set
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Retry and sampling parameters used for chapter generation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Attempts per unit before giving up
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Fixed pause after each failed attempt in milliseconds
    #[serde(rename = "backoff-ms")]
    pub backoff_ms: u64,

    /// Maximum tokens per chapter
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            backoff_ms: 5_000,
            max_tokens: 4_000,
            temperature: 0.6,
        }
    }
}

impl GenerationConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

/// Book output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BookConfig {
    /// Default book manifest path
    pub manifest: PathBuf,

    /// Output PDF path
    pub output: PathBuf,

    /// Words per estimated page
    #[serde(rename = "words-per-page")]
    pub words_per_page: usize,

    /// Directory holding the TTF font family
    #[serde(rename = "font-dir")]
    pub font_dir: PathBuf,

    /// Font family name; files are `{family}-Regular.ttf`, `-Bold`, `-Italic`, `-BoldItalic`
    #[serde(rename = "font-family")]
    pub font_family: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            manifest: PathBuf::from("book.yml"),
            output: PathBuf::from("professional_ebook.pdf"),
            words_per_page: crate::DEFAULT_WORDS_PER_PAGE,
            font_dir: PathBuf::from("/usr/share/fonts/truetype/liberation"),
            font_family: "LiberationSans".to_string(),
        }
    }
}

/// Conversation session configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// History file (JSON Lines, one turn per line)
    #[serde(rename = "history-file")]
    pub history_file: PathBuf,

    /// Number of most recent turns used as context
    pub window: usize,

    /// Maximum tokens per reply
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Label for user turns in the prompt context and terminal
    #[serde(rename = "user-label")]
    pub user_label: String,

    /// Label for assistant turns in the prompt context and terminal
    #[serde(rename = "bot-label")]
    pub bot_label: String,

    /// Name used in the greeting
    #[serde(rename = "user-name")]
    pub user_name: String,

    /// Per-character delay when printing the greeting
    #[serde(rename = "greeting-delay-ms")]
    pub greeting_delay_ms: u64,

    /// Spoken replies
    pub speech: SpeechConfig,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_file: PathBuf::from("conversation_history.txt"),
            window: crate::DEFAULT_HISTORY_WINDOW,
            max_tokens: 1_024,
            temperature: 0.6,
            user_label: crate::DEFAULT_USER_LABEL.to_string(),
            bot_label: crate::DEFAULT_BOT_LABEL.to_string(),
            user_name: "friend".to_string(),
            greeting_delay_ms: 100,
            speech: SpeechConfig::default(),
        }
    }
}

impl ChatConfig {
    pub fn greeting_delay(&self) -> Duration {
        Duration::from_millis(self.greeting_delay_ms)
    }
}

/// Text-to-speech configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Speak replies after printing them
    pub enabled: bool,

    /// Speech endpoint base URL (OpenAI-compatible)
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Speech model
    pub model: String,

    /// Voice identifier
    pub voice: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Directory for synthesized audio files
    #[serde(rename = "audio-dir")]
    pub audio_dir: PathBuf,

    /// Player command; the audio file path is appended as the last argument
    pub player: Vec<String>,

    /// Keep audio files after playback
    #[serde(rename = "keep-audio")]
    pub keep_audio: bool,
}

impl SpeechConfig {
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env).ok().filter(|k| !k.trim().is_empty())
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: "https://api.openai.com".to_string(),
            model: "tts-1".to_string(),
            voice: "nova".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            audio_dir: PathBuf::from("."),
            player: ["ffplay", "-nodisp", "-autoexit", "-loglevel", "quiet"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            keep_audio: false,
        }
    }
}
