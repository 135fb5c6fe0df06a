//! Visage server library logic.
//!
//! Wires the conversational multimedia pipeline behind an axum HTTP API:
//! inbound chat requests flow through speech recognition (for audio-only
//! turns), the language-model orchestrator, and per-beat media generation,
//! then return as an ordered beat list for the avatar renderer.

pub mod api;
pub mod api_chat;
pub mod api_media;
pub mod api_search;
pub mod config;
pub mod pipeline;
pub mod session;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use session::SessionStore;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use visage_llm::LlmService;
use visage_voice::{LipSyncService, SttService, TtsService};

/// Maximum request body size (25 MiB). Large enough for data-URI audio and
/// image payloads, bounded against OOM.
const MAX_REQUEST_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Per-session conversation history.
    pub sessions: SessionStore,
    /// Language-model orchestrator.
    pub llm: LlmService,
    /// Speech synthesis chain.
    pub tts: TtsService,
    /// Forced-alignment lip-sync extractor.
    pub lipsync: LipSyncService,
    /// Dictation adapter for recorded audio.
    pub stt: SttService,
    /// ffmpeg binary used to normalize recorded input.
    pub ffmpeg_binary: String,
    /// Working directory for media files and greeting assets.
    pub media_dir: PathBuf,
    /// Client for outbound instant-answer lookups.
    pub http: reqwest::Client,
}

impl AppState {
    /// Builds the full service stack from loaded configuration.
    pub fn from_config(config: &config::Config) -> Self {
        Self {
            sessions: SessionStore::new(),
            llm: LlmService::new(config.llm.url.clone()).with_autostart(config.llm.autostart),
            tts: TtsService::new(config.tts.clone()),
            lipsync: LipSyncService::new(config.lipsync.clone()),
            stt: SttService::new(config.stt.clone()),
            ffmpeg_binary: config.lipsync.ffmpeg_binary.clone(),
            media_dir: PathBuf::from(&config.media.dir),
            http: reqwest::Client::new(),
        }
    }
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/chat", post(api_chat::chat_handler))
        .route("/transcribe", post(api_media::transcribe_handler))
        .route("/ttscheck", get(api_media::ttscheck_handler))
        .route("/websearch", post(api_search::websearch_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
