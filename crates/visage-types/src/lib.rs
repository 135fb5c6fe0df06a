//! Shared types for the Visage pipeline.
//!
//! This crate defines the data model that flows between the language-model
//! orchestrator, the media pipeline, and the HTTP layer: conversation turns,
//! response beats, and the viseme timelines that drive lip-sync animation.
//!
//! No crate in the workspace depends on anything *except* `visage-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.
//!
//! Wire names are fixed by the renderer: animation values must match the
//! clip names baked into the avatar's GLB file, and beat fields serialize in
//! camelCase.

use serde::{Deserialize, Serialize};

/// Who produced a conversation turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The human side of the conversation.
    User,
    /// The avatar side of the conversation.
    Assistant,
}

impl Role {
    /// Uppercase label used when linearizing a transcript into a single
    /// completion prompt (`USER: ...` / `ASSISTANT: ...` lines).
    pub fn label(self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Assistant => "ASSISTANT",
        }
    }
}

/// One entry of a session's conversation history.
///
/// Immutable once created; owned by the session store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: String,
}

impl ConversationTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Facial expressions the renderer knows how to blend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FacialExpression {
    Smile,
    Sad,
    Angry,
    Surprised,
    FunnyFace,
    #[default]
    Default,
}

impl FacialExpression {
    /// All expressions, in a stable order. Used for random selection when
    /// the model gives no usable hint.
    pub const ALL: [Self; 6] = [
        Self::Smile,
        Self::Surprised,
        Self::Angry,
        Self::Sad,
        Self::Default,
        Self::FunnyFace,
    ];

    /// Parses a wire label (`"funnyFace"`, `"smile"`, ...).
    ///
    /// Returns `None` for empty or unrecognized labels so callers can fall
    /// back to a heuristic instead of rejecting the whole response.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "smile" => Some(Self::Smile),
            "sad" => Some(Self::Sad),
            "angry" => Some(Self::Angry),
            "surprised" => Some(Self::Surprised),
            "funnyFace" => Some(Self::FunnyFace),
            "default" => Some(Self::Default),
            _ => None,
        }
    }
}

/// Animation clips available in the avatar's GLB file.
///
/// Serialized names must match the clip names exactly, underscores included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Animation {
    #[serde(rename = "Talking_0")]
    Talking0,
    #[serde(rename = "Talking_1")]
    Talking1,
    #[serde(rename = "Talking_2")]
    Talking2,
    Crying,
    Laughing,
    Rumba,
    Idle,
    Terrified,
    Angry,
}

impl Animation {
    /// The neutral talking clips; one is chosen at random when no stronger
    /// cue is found in the beat text.
    pub const TALKING: [Self; 3] = [Self::Talking0, Self::Talking1, Self::Talking2];

    /// Parses a wire label (`"Talking_1"`, `"Rumba"`, ...).
    ///
    /// Returns `None` for empty or unrecognized labels so callers can fall
    /// back to a heuristic instead of rejecting the whole response.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Talking_0" => Some(Self::Talking0),
            "Talking_1" => Some(Self::Talking1),
            "Talking_2" => Some(Self::Talking2),
            "Crying" => Some(Self::Crying),
            "Laughing" => Some(Self::Laughing),
            "Rumba" => Some(Self::Rumba),
            "Idle" => Some(Self::Idle),
            "Terrified" => Some(Self::Terrified),
            "Angry" => Some(Self::Angry),
            _ => None,
        }
    }
}

/// The mouth-shape alphabet used by Rhubarb Lip Sync.
///
/// `A`-`H` are articulated shapes; `X` is the closed/rest shape emitted for
/// silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Viseme {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
    X,
}

/// One timed viseme segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MouthCue {
    /// Segment start, seconds from the beginning of the audio.
    pub start: f64,
    /// Segment end, seconds.
    pub end: f64,
    /// Mouth shape to display over `[start, end)`.
    pub value: Viseme,
}

/// A time-ordered, duration-covering viseme timeline.
///
/// Invariant: cues are contiguous (`start[i] == end[i-1]`), begin at 0, and
/// the last cue ends at the audio duration, all within floating tolerance.
/// Rhubarb's JSON transcript (which carries an extra `metadata` object)
/// deserializes into this shape directly; unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lipsync {
    pub mouth_cues: Vec<MouthCue>,
}

impl Lipsync {
    pub fn new(mouth_cues: Vec<MouthCue>) -> Self {
        Self { mouth_cues }
    }

    /// End of the last cue, i.e. the total covered duration in seconds.
    pub fn duration(&self) -> f64 {
        self.mouth_cues.last().map(|c| c.end).unwrap_or(0.0)
    }
}

/// One unit of avatar response: text plus everything the renderer needs to
/// speak and animate it.
///
/// Produced fresh per request and never mutated after assembly. A response
/// carries at most [`MAX_BEATS`] of these.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBeat {
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
    /// Base64-encoded audio payload. Empty when media generation failed;
    /// the renderer guards for missing audio.
    pub audio: String,
    pub audio_mime: String,
    pub lipsync: Lipsync,
}

/// Hard cap on beats per response, enforced against whatever the model
/// returns.
pub const MAX_BEATS: usize = 3;
