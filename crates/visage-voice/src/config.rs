//! Voice engine configuration.
//!
//! Everything here deserializes from the server's TOML config with usable
//! defaults: a fresh checkout synthesizes through the system engine without
//! any configuration at all, and Piper/Azure activate once their fields are
//! filled in.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The TTS engines the chain can route through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsEngine {
    /// Piper (ONNX-based, fast, local).
    Piper,
    /// Azure neural voices (cloud HTTP, requires credentials).
    Azure,
    /// The OS-builtin synthesizer. Ships with the host; last resort.
    #[default]
    System,
}

impl TtsEngine {
    /// Engine name for log fields.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Piper => "piper",
            Self::Azure => "azure",
            Self::System => "system",
        }
    }
}

/// Piper TTS settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PiperConfig {
    /// Piper executable; bare name resolves via PATH.
    #[serde(default = "default_piper_binary")]
    pub binary: String,
    /// Path to the ONNX voice model.
    #[serde(default = "default_piper_model")]
    pub model_path: String,
    /// Speaker index within a multi-speaker model.
    #[serde(default)]
    pub speaker: Option<u32>,
    /// Length scale; inverse of speed, usually 0.9..1.2.
    #[serde(default)]
    pub length_scale: Option<f32>,
}

impl Default for PiperConfig {
    fn default() -> Self {
        Self {
            binary: default_piper_binary(),
            model_path: default_piper_model(),
            speaker: None,
            length_scale: None,
        }
    }
}

/// Azure neural TTS settings. Inactive until both `key` and `region` are set.
#[derive(Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    #[serde(default, skip_serializing)]
    pub key: String,
    /// Azure region, e.g. "eastus", "westeurope".
    #[serde(default)]
    pub region: String,
    /// Neural voice name.
    #[serde(default = "default_azure_voice")]
    pub voice: String,
}

impl AzureConfig {
    /// Whether credentials are present; the chain skips Azure otherwise.
    pub fn is_configured(&self) -> bool {
        !self.key.is_empty() && !self.region.is_empty()
    }
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            key: String::new(),
            region: String::new(),
            voice: default_azure_voice(),
        }
    }
}

impl fmt::Debug for AzureConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AzureConfig")
            .field("key", &"[REDACTED]")
            .field("region", &self.region)
            .field("voice", &self.voice)
            .finish()
    }
}

/// Text-to-speech chain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TtsConfig {
    /// Engine tried first; the rest follow in fixed fallback order.
    #[serde(default)]
    pub preferred: TtsEngine,

    #[serde(default)]
    pub piper: PiperConfig,

    #[serde(default)]
    pub azure: AzureConfig,

    /// Exact system voice name (e.g. a SAPI voice). Empty selects by a
    /// female-voice hint on Windows and the engine default elsewhere.
    #[serde(default)]
    pub system_voice: String,
}

/// Lip-sync extraction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LipSyncConfig {
    /// Rhubarb Lip Sync executable.
    #[serde(default = "default_rhubarb_binary")]
    pub rhubarb_binary: String,
    /// ffmpeg executable used for best-effort resampling.
    #[serde(default = "default_ffmpeg_binary")]
    pub ffmpeg_binary: String,
}

impl Default for LipSyncConfig {
    fn default() -> Self {
        Self {
            rhubarb_binary: default_rhubarb_binary(),
            ffmpeg_binary: default_ffmpeg_binary(),
        }
    }
}

/// Speech recognition settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SttConfig {
    /// Recognition culture passed to the dictation engine.
    #[serde(default = "default_stt_culture")]
    pub culture: String,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            culture: default_stt_culture(),
        }
    }
}

fn default_piper_binary() -> String {
    "piper".to_string()
}

fn default_piper_model() -> String {
    "voices/en_US-amy-medium.onnx".to_string()
}

fn default_azure_voice() -> String {
    "en-US-AriaNeural".to_string()
}

fn default_rhubarb_binary() -> String {
    "bin/rhubarb".to_string()
}

fn default_ffmpeg_binary() -> String {
    "ffmpeg".to_string()
}

fn default_stt_culture() -> String {
    "en-US".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_need_no_configuration() {
        let config = TtsConfig::default();
        assert_eq!(config.preferred, TtsEngine::System);
        assert!(!config.azure.is_configured());
        assert_eq!(config.piper.binary, "piper");
    }

    #[test]
    fn azure_key_is_redacted_in_debug() {
        let config = AzureConfig {
            key: "secret-key".to_string(),
            region: "eastus".to_string(),
            voice: default_azure_voice(),
        };
        let debug = format!("{:?}", config);
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("[REDACTED]"));
        assert!(debug.contains("eastus"));
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let config: TtsConfig = toml::from_str(
            r#"
            preferred = "piper"

            [piper]
            model_path = "voices/custom.onnx"
            "#,
        )
        .unwrap();
        assert_eq!(config.preferred, TtsEngine::Piper);
        assert_eq!(config.piper.model_path, "voices/custom.onnx");
        assert_eq!(config.piper.binary, "piper");
        assert_eq!(config.azure.voice, "en-US-AriaNeural");
    }
}
