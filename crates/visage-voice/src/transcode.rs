//! Best-effort audio transcoding via ffmpeg.
//!
//! Both the lip-sync extractor and the speech recognizer want 16 kHz mono
//! WAV input; recorded browser audio usually arrives as webm/opus and TTS
//! engines emit whatever sample rate their voice ships with.

use crate::error::VoiceError;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for ffmpeg execution.
const TRANSCODE_TIMEOUT: Duration = Duration::from_secs(30);

/// Converts `src` to 16 kHz mono WAV at `dst`, overwriting if present.
pub async fn resample_to_16k_mono(
    ffmpeg_binary: &str,
    src: &Path,
    dst: &Path,
) -> Result<(), VoiceError> {
    let child = Command::new(ffmpeg_binary)
        .arg("-y")
        .arg("-i")
        .arg(src)
        .arg("-ar")
        .arg("16000")
        .arg("-ac")
        .arg("1")
        .arg(dst)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| VoiceError::Transcode(format!("failed to spawn ffmpeg: {}", e)))?;

    let output = tokio::time::timeout(TRANSCODE_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            VoiceError::Transcode(format!(
                "ffmpeg timed out after {} seconds",
                TRANSCODE_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| VoiceError::Transcode(format!("failed to wait for ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(VoiceError::Transcode(format!("ffmpeg failed: {}", stderr)));
    }

    Ok(())
}
