//! The conversational turn handler.
//!
//! One POST carries everything a turn may need: text, recorded audio,
//! attached images, a model hint, and session controls. Audio-only turns
//! are transcribed first; turns with no usable input at all get the fixed
//! greeting instead of an error.

use crate::api::ApiError;
use crate::api_media::recognize_audio;
use crate::{pipeline, AppState};
use axum::{extract::Extension, http::HeaderMap, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use visage_types::ResponseBeat;

/// Request body for `POST /chat`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChatRequest {
    /// The user's text message.
    pub message: Option<String>,
    /// Single attached image (data URI or bare base64); kept for backward
    /// compatibility and folded into `images`.
    pub image: Option<String>,
    /// Attached images (data URIs or bare base64).
    pub images: Option<Vec<String>>,
    /// Recorded audio (data URI or bare base64), transcribed when no text
    /// message is present.
    pub audio: Option<String>,
    /// Model hint ("llava" requests a vision model).
    pub model: Option<String>,
    /// Opaque session identifier; falls back to the `x-session-id` header,
    /// then "default".
    pub session_id: Option<String>,
    /// Clears the session's history before processing this turn.
    pub reset: bool,
}

/// Response body for `POST /chat`.
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub messages: Vec<ResponseBeat>,
}

/// Handler for `POST /chat`.
pub async fn chat_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    let session_id = payload
        .session_id
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-session-id")
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .unwrap_or_else(|| "default".to_string());

    if payload.reset {
        state.sessions.reset(&session_id);
    }

    let images: Vec<String> = payload
        .images
        .unwrap_or_default()
        .into_iter()
        .chain(payload.image)
        .filter(|s| !s.is_empty())
        .collect();

    // Audio-only turns go through dictation first. Recognition failure is
    // not a hard failure: it degrades to "no text recovered".
    let mut message = payload.message.filter(|m| !m.is_empty());
    if message.is_none() {
        if let Some(audio) = payload.audio.filter(|a| !a.is_empty()) {
            match recognize_audio(&state, &audio).await {
                Ok(text) if !text.is_empty() => message = Some(text),
                Ok(_) => tracing::info!("dictation recognized nothing"),
                Err(e) => tracing::warn!("audio transcription failed: {}", e),
            }
        }
    }

    // Nothing usable at all: fixed greeting, not an error.
    if message.is_none() && images.is_empty() {
        return Ok(Json(ChatResponse {
            messages: pipeline::greeting_beats(&state).await,
        }));
    }

    let user_message = message.unwrap_or_default();
    let model_hint = payload.model.unwrap_or_default().to_lowercase();

    let history = state.sessions.history(&session_id);
    let drafts = state
        .llm
        .draft_beats(&user_message, &history, &images, &model_hint)
        .await;
    let beats = pipeline::assemble_beats(&state, drafts).await;

    let assistant_text = beats
        .iter()
        .map(|b| b.text.as_str())
        .collect::<Vec<_>>()
        .join(" \n");
    state
        .sessions
        .append_exchange(&session_id, &user_message, &assistant_text);

    Ok(Json(ChatResponse { messages: beats }))
}
