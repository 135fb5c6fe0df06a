//! Voice infrastructure for the Visage pipeline.
//!
//! Provides TTS (text-to-speech) rendering through a chain of
//! interchangeable engines with automatic fallback, STT (speech-to-text)
//! dictation for recorded user audio, and lip-sync extraction via the
//! Rhubarb forced-alignment tool.
//!
//! Every external engine is invoked as a scoped process or HTTP call with a
//! timeout; failures are converted into [`VoiceError`] values so the caller
//! decides what degrades and what aborts. The lip-sync extractor never falls
//! back by itself — the heuristic timeline lives in `visage-audio` and is
//! composed in at the pipeline level.

pub mod config;
pub mod error;
pub mod lipsync;
pub mod stt;
pub mod transcode;
pub mod tts;

pub use config::{AzureConfig, LipSyncConfig, PiperConfig, SttConfig, TtsConfig, TtsEngine};
pub use error::VoiceError;
pub use lipsync::LipSyncService;
pub use stt::SttService;
pub use transcode::resample_to_16k_mono;
pub use tts::TtsService;
