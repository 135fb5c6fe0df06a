//! Server configuration loading from file and environment variables.

use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;
use visage_voice::{LipSyncConfig, SttConfig, TtsConfig};

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Language-model (Ollama) settings.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Media working directory settings.
    #[serde(default)]
    pub media: MediaConfig,

    /// Text-to-speech chain settings.
    #[serde(default)]
    pub tts: TtsConfig,

    /// Lip-sync extraction settings.
    #[serde(default)]
    pub lipsync: LipSyncConfig,

    /// Speech recognition settings.
    #[serde(default)]
    pub stt: SttConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Language-model service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Base URL of the local inference service.
    #[serde(default = "default_llm_url")]
    pub url: String,

    /// Whether to try starting the service when it is unreachable.
    #[serde(default = "default_true")]
    pub autostart: bool,
}

/// Media working directory configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory for per-request audio/transcript files and the
    /// pre-rendered greeting assets.
    #[serde(default = "default_media_dir")]
    pub dir: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "visage_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    3000
}

fn default_llm_url() -> String {
    "http://127.0.0.1:11434".to_string()
}

fn default_true() -> bool {
    true
}

fn default_media_dir() -> String {
    "audios".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            autostart: true,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            dir: default_media_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `VISAGE_HOST` overrides `server.host`
/// - `VISAGE_PORT` overrides `server.port`
/// - `VISAGE_OLLAMA_URL` overrides `llm.url`
/// - `VISAGE_MEDIA_DIR` overrides `media.dir`
/// - `VISAGE_TTS_ENGINE` overrides `tts.preferred` ("piper"|"azure"|"system")
/// - `VISAGE_AZURE_TTS_KEY` / `VISAGE_AZURE_TTS_REGION` override the Azure
///   credentials
/// - `VISAGE_LOG_LEVEL` overrides `logging.level`
/// - `VISAGE_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Config::default()
            }
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => Config::default(),
    };

    // Environment variable overrides
    if let Ok(host) = std::env::var("VISAGE_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Ok(port) = std::env::var("VISAGE_PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Ok(url) = std::env::var("VISAGE_OLLAMA_URL") {
        config.llm.url = url;
    }
    if let Ok(dir) = std::env::var("VISAGE_MEDIA_DIR") {
        config.media.dir = dir;
    }
    if let Ok(engine) = std::env::var("VISAGE_TTS_ENGINE") {
        match engine.to_lowercase().as_str() {
            "piper" => config.tts.preferred = visage_voice::TtsEngine::Piper,
            "azure" => config.tts.preferred = visage_voice::TtsEngine::Azure,
            "system" | "sapi" => config.tts.preferred = visage_voice::TtsEngine::System,
            other => tracing::warn!(engine = other, "unknown VISAGE_TTS_ENGINE, ignoring"),
        }
    }
    if let Ok(key) = std::env::var("VISAGE_AZURE_TTS_KEY") {
        config.tts.azure.key = key;
    }
    if let Ok(region) = std::env::var("VISAGE_AZURE_TTS_REGION") {
        config.tts.azure.region = region;
    }
    if let Ok(level) = std::env::var("VISAGE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("VISAGE_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
