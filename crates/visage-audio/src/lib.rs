//! Audio inspection and heuristic lip-sync for the Visage pipeline.
//!
//! Two independent pieces live here: a minimal WAV container parser that
//! reads playback duration straight from the chunk headers (no sample
//! decoding), and a grapheme-to-viseme synthesizer that fabricates a
//! plausible mouth-cue timeline when the real forced-alignment tool is
//! unavailable.

pub mod visemes;
pub mod wav;

pub use visemes::fallback_mouth_cues;
pub use wav::{wav_duration_seconds, wav_file_duration_seconds};
