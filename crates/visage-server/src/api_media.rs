//! Media utility handlers: standalone transcription and the TTS self-check.

use crate::api::{decode_media_payload, ApiError};
use crate::AppState;
use axum::{extract::Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;
use visage_voice::resample_to_16k_mono;

/// Request body for `POST /transcribe`.
#[derive(Debug, Deserialize)]
pub struct TranscribeRequest {
    /// Recorded audio as a data URI or bare base64.
    #[serde(default)]
    pub audio: String,
}

/// Handler for `POST /transcribe`.
pub async fn transcribe_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<TranscribeRequest>,
) -> Result<Json<Value>, ApiError> {
    if payload.audio.is_empty() {
        return Err(ApiError::BadRequest("audio missing".to_string()));
    }
    let text = recognize_audio(&state, &payload.audio).await?;
    Ok(Json(json!({ "text": text })))
}

/// Handler for `GET /ttscheck`. Synthesizes a short check phrase through
/// the engine chain.
pub async fn ttscheck_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    if let Err(e) = tokio::fs::create_dir_all(&state.media_dir).await {
        return Err(ApiError::InternalServerError(format!(
            "cannot create media dir: {}",
            e
        )));
    }
    let wav_path = state.media_dir.join("tts_check.wav");
    state
        .tts
        .synthesize_to_wav("Hello from Visage. This is a check.", &wav_path)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("ttscheck failed: {}", e)))?;
    Ok(Json(
        json!({ "ok": true, "file": wav_path.display().to_string() }),
    ))
}

/// Decodes recorded audio, normalizes it to 16 kHz mono WAV, and runs
/// dictation over it. Input files are request-scoped and removed afterward.
pub(crate) async fn recognize_audio(state: &AppState, payload: &str) -> Result<String, ApiError> {
    let bytes = decode_media_payload(payload)?;

    if let Err(e) = tokio::fs::create_dir_all(&state.media_dir).await {
        return Err(ApiError::InternalServerError(format!(
            "cannot create media dir: {}",
            e
        )));
    }
    let stem = format!("input-{}", Uuid::new_v4());
    let raw_path = state.media_dir.join(format!("{}.webm", stem));
    let wav_path = state.media_dir.join(format!("{}.wav", stem));

    tokio::fs::write(&raw_path, &bytes)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("cannot write input audio: {}", e)))?;

    // Best effort: when ffmpeg is unavailable dictation is attempted on
    // whatever was uploaded.
    let dictation_input = match resample_to_16k_mono(&state.ffmpeg_binary, &raw_path, &wav_path)
        .await
    {
        Ok(()) => wav_path.clone(),
        Err(e) => {
            tracing::warn!("input resample failed, using raw upload: {}", e);
            raw_path.clone()
        }
    };

    let result = state
        .stt
        .transcribe_wav(&dictation_input)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("transcription failed: {}", e)));

    for path in [&raw_path, &wav_path] {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::debug!(path = %path.display(), "input cleanup failed: {}", e);
        }
    }

    result
}
