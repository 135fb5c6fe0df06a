//! Forced-alignment lip-sync extraction via Rhubarb Lip Sync.
//!
//! Rhubarb reads a WAV file and emits a phoneme-to-viseme JSON transcript.
//! Input is resampled to 16 kHz mono first when ffmpeg is available; if the
//! resample fails the original file is used, degraded but attempted.
//!
//! This service reports every failure to the caller instead of synthesizing
//! a replacement timeline — the heuristic fallback is composed in at the
//! pipeline level, not here.

use crate::config::LipSyncConfig;
use crate::error::VoiceError;
use crate::transcode::resample_to_16k_mono;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use visage_types::Lipsync;

/// Timeout for Rhubarb execution.
const RHUBARB_TIMEOUT: Duration = Duration::from_secs(60);

/// Service for extracting viseme timelines from synthesized audio.
#[derive(Debug, Clone)]
pub struct LipSyncService {
    config: LipSyncConfig,
}

impl LipSyncService {
    pub fn new(config: LipSyncConfig) -> Self {
        Self { config }
    }

    /// Runs forced alignment on `wav_path`, writing the JSON transcript to
    /// `transcript_path` and returning the parsed timeline.
    ///
    /// # Errors
    ///
    /// `VoiceError::LipSync` on a missing binary, non-zero exit, or a
    /// transcript that cannot be read or parsed.
    pub async fn extract(
        &self,
        wav_path: &Path,
        transcript_path: &Path,
    ) -> Result<Lipsync, VoiceError> {
        let input = self.prepare_input(wav_path).await;

        let child = Command::new(&self.config.rhubarb_binary)
            .arg("-f")
            .arg("json")
            .arg("-o")
            .arg(transcript_path)
            .arg(&input)
            .arg("-r")
            .arg("phonetic")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| VoiceError::LipSync(format!("failed to spawn rhubarb: {}", e)))?;

        let output = tokio::time::timeout(RHUBARB_TIMEOUT, child.wait_with_output())
            .await
            .map_err(|_| {
                VoiceError::LipSync(format!(
                    "rhubarb timed out after {} seconds",
                    RHUBARB_TIMEOUT.as_secs()
                ))
            })?
            .map_err(|e| VoiceError::LipSync(format!("failed to wait for rhubarb: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(VoiceError::LipSync(format!("rhubarb failed: {}", stderr)));
        }

        let raw = tokio::fs::read_to_string(transcript_path)
            .await
            .map_err(|e| VoiceError::LipSync(format!("failed to read transcript: {}", e)))?;
        serde_json::from_str(&raw)
            .map_err(|e| VoiceError::LipSync(format!("malformed transcript: {}", e)))
    }

    /// Best-effort 16 kHz mono resample; falls back to the original path.
    async fn prepare_input(&self, wav_path: &Path) -> PathBuf {
        let resampled = resampled_path(wav_path);
        match resample_to_16k_mono(&self.config.ffmpeg_binary, wav_path, &resampled).await {
            Ok(()) => resampled,
            Err(e) => {
                tracing::warn!(path = %wav_path.display(), "resample failed, using original: {}", e);
                wav_path.to_path_buf()
            }
        }
    }
}

/// `message_0.wav` -> `message_0_16k.wav`, alongside the original.
fn resampled_path(wav_path: &Path) -> PathBuf {
    let stem = wav_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    wav_path.with_file_name(format!("{}_16k.wav", stem))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resampled_path_keeps_directory() {
        let path = resampled_path(Path::new("/tmp/req/message_2.wav"));
        assert_eq!(path, Path::new("/tmp/req/message_2_16k.wav"));
    }

    #[tokio::test]
    async fn missing_binary_reports_lipsync_error() {
        let config = LipSyncConfig {
            rhubarb_binary: "/nonexistent/rhubarb".to_string(),
            ffmpeg_binary: "/nonexistent/ffmpeg".to_string(),
        };
        let service = LipSyncService::new(config);
        let dir = tempfile::tempdir().unwrap();
        let err = service
            .extract(&dir.path().join("in.wav"), &dir.path().join("out.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, VoiceError::LipSync(_)));
    }
}
