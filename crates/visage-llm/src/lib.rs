//! Language-model orchestration for the Visage pipeline.
//!
//! Talks to a local Ollama instance: decides which installed model to
//! address (vision-capable when images are attached), issues the chat
//! request under a strict-JSON response contract, repairs the almost-JSON
//! that models actually produce, and falls back to the legacy completion
//! endpoint when the chat endpoint is unavailable.
//!
//! The public entry point is [`LlmService::draft_beats`], which never fails:
//! when both request paths are exhausted it synthesizes a single neutral
//! beat so the pipeline always has something to render.

pub mod enrich;
pub mod error;
pub mod model;
pub mod repair;
pub mod service;

pub use enrich::enrich;
pub use error::LlmError;
pub use model::resolve_model;
pub use repair::{extract_beats, RawBeat};
pub use service::{BeatDraft, LlmService};
