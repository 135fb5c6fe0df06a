//! The response assembler: attaches audio and lip-sync media to beat drafts.
//!
//! Beats are processed sequentially in array order. Media for one request
//! lives under a request-scoped directory keyed by UUID, so concurrent
//! requests cannot clobber each other's files; the directory is removed
//! best-effort once the beats are assembled.

use crate::AppState;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use std::path::Path;
use uuid::Uuid;
use visage_audio::{fallback_mouth_cues, wav_file_duration_seconds};
use visage_llm::BeatDraft;
use visage_types::{Animation, FacialExpression, Lipsync, ResponseBeat};

/// Timeline length assumed when the audio duration cannot be measured.
const DEFAULT_FALLBACK_DURATION_SECS: f64 = 2.0;

/// The fixed two-beat greeting served when a request carries no message,
/// audio, or images.
const GREETING: [(&str, FacialExpression, Animation); 2] = [
    (
        "Hey there... How was your day?",
        FacialExpression::Smile,
        Animation::Talking1,
    ),
    (
        "I missed you... Don't stay away so long!",
        FacialExpression::Sad,
        Animation::Crying,
    ),
];

/// Attaches synthesized audio and a viseme timeline to each draft.
///
/// Per-beat media failure never aborts the request: a beat whose synthesis
/// or alignment fails is returned with empty audio and a heuristic
/// timeline, so the caller always receives a same-length, renderable list.
pub async fn assemble_beats(state: &AppState, drafts: Vec<BeatDraft>) -> Vec<ResponseBeat> {
    let request_dir = state.media_dir.join(format!("req-{}", Uuid::new_v4()));
    if let Err(e) = tokio::fs::create_dir_all(&request_dir).await {
        tracing::error!(dir = %request_dir.display(), "cannot create media dir: {}", e);
    }

    let mut beats = Vec::with_capacity(drafts.len());
    for (index, draft) in drafts.into_iter().enumerate() {
        beats.push(assemble_one(state, &request_dir, index, draft).await);
    }

    if let Err(e) = tokio::fs::remove_dir_all(&request_dir).await {
        tracing::debug!(dir = %request_dir.display(), "media dir cleanup failed: {}", e);
    }

    beats
}

async fn assemble_one(
    state: &AppState,
    request_dir: &Path,
    index: usize,
    draft: BeatDraft,
) -> ResponseBeat {
    let wav_path = request_dir.join(format!("message_{}.wav", index));
    let transcript_path = request_dir.join(format!("message_{}.json", index));

    let mut audio = String::new();
    let lipsync;

    match state.tts.synthesize_to_wav(&draft.text, &wav_path).await {
        Ok(()) => {
            lipsync = match state.lipsync.extract(&wav_path, &transcript_path).await {
                Ok(timeline) => timeline,
                Err(e) => {
                    tracing::warn!(beat = index, "alignment failed, synthesizing mouth cues: {}", e);
                    fallback_timeline(&draft.text, &wav_path).await
                }
            };
            match tokio::fs::read(&wav_path).await {
                Ok(bytes) => audio = BASE64.encode(bytes),
                Err(e) => {
                    tracing::warn!(beat = index, "audio read failed: {}", e);
                }
            }
        }
        Err(e) => {
            tracing::warn!(beat = index, "speech synthesis failed: {}", e);
            lipsync = fallback_timeline(&draft.text, &wav_path).await;
        }
    }

    ResponseBeat {
        text: draft.text,
        facial_expression: draft.facial_expression,
        animation: draft.animation,
        audio,
        audio_mime: "audio/wav".to_string(),
        lipsync,
    }
}

/// Heuristic timeline sized to the audio when it is measurable, otherwise
/// to a fixed window.
async fn fallback_timeline(text: &str, wav_path: &Path) -> Lipsync {
    let mut duration = wav_file_duration_seconds(wav_path).await;
    if duration <= 0.0 {
        duration = DEFAULT_FALLBACK_DURATION_SECS;
    }
    fallback_mouth_cues(text, duration)
}

/// The fixed greeting beat list.
///
/// Prefers the pre-rendered `intro_{i}.wav`/`intro_{i}.json` assets from
/// the media directory; when they are absent the beats degrade to empty
/// audio with synthesized mouth cues, so a fresh checkout still greets.
pub async fn greeting_beats(state: &AppState) -> Vec<ResponseBeat> {
    let mut beats = Vec::with_capacity(GREETING.len());
    for (index, (text, facial_expression, animation)) in GREETING.into_iter().enumerate() {
        let wav_path = state.media_dir.join(format!("intro_{}.wav", index));
        let transcript_path = state.media_dir.join(format!("intro_{}.json", index));

        let audio = match tokio::fs::read(&wav_path).await {
            Ok(bytes) => BASE64.encode(bytes),
            Err(_) => String::new(),
        };
        let lipsync = match tokio::fs::read_to_string(&transcript_path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(timeline) => timeline,
                Err(e) => {
                    tracing::debug!(beat = index, "greeting transcript malformed: {}", e);
                    fallback_timeline(text, &wav_path).await
                }
            },
            Err(_) => fallback_timeline(text, &wav_path).await,
        };

        beats.push(ResponseBeat {
            text: text.to_string(),
            facial_expression,
            animation,
            audio,
            audio_mime: "audio/wav".to_string(),
            lipsync,
        });
    }
    beats
}
