//! The Ollama-backed orchestration service.
//!
//! Primary path is the structured `/api/chat` call; on transport failure or
//! a non-success status the legacy `/api/generate` completion endpoint is
//! tried with a linearized transcript. Both paths request JSON-format
//! output and go through the same tolerant extraction.

use crate::enrich::{enrich, random_talking};
use crate::error::LlmError;
use crate::model::resolve_model;
use crate::repair::{extract_beats, RawBeat};
use rand::seq::SliceRandom;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use visage_types::{Animation, ConversationTurn, FacialExpression};

/// How long to wait for a freshly spawned inference service to come up.
const STARTUP_WAIT: Duration = Duration::from_secs(8);

/// Poll interval while waiting for the service.
const STARTUP_POLL: Duration = Duration::from_millis(500);

/// Probe timeout for the installed-models endpoint.
const TAGS_TIMEOUT: Duration = Duration::from_secs(2);

/// Context window requested for every generation.
const NUM_CTX: u32 = 4096;

/// System directive enforcing the structured-JSON response contract.
const SYSTEM_PROMPT: &str = r#"You are a warm, expressive on-screen avatar companion.
You must reply ONLY with strict JSON like this shape (no extra text):
{
  "messages": [
    { "text": "...", "facialExpression": "smile|sad|angry|surprised|funnyFace|default", "animation": "Talking_0|Talking_1|Talking_2|Crying|Laughing|Rumba|Idle|Terrified|Angry" }
  ]
}
Return between 1 and 3 messages.
Keep consistency with the ongoing conversation context that will be provided.
"#;

/// A beat ready for media generation: text plus resolved expression and
/// animation, no audio yet.
#[derive(Debug, Clone, PartialEq)]
pub struct BeatDraft {
    pub text: String,
    pub facial_expression: FacialExpression,
    pub animation: Animation,
}

/// Client for the local Ollama inference service.
#[derive(Debug, Clone)]
pub struct LlmService {
    base_url: String,
    http: reqwest::Client,
    autostart: bool,
}

impl LlmService {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: reqwest::Client::new(),
            autostart: true,
        }
    }

    /// Disables spawning `ollama serve` when the service is unreachable.
    pub fn with_autostart(mut self, autostart: bool) -> Self {
        self.autostart = autostart;
        self
    }

    /// Produces 1-3 enriched beat drafts for a user message.
    ///
    /// Never fails: when both request paths are exhausted (or the model
    /// returns a valid-but-empty list) a single neutral acknowledgment beat
    /// is synthesized instead.
    pub async fn draft_beats(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        images: &[String],
        model_override: &str,
    ) -> Vec<BeatDraft> {
        let raw = match self.chat(user_message, history, images, model_override).await {
            Ok(beats) => beats,
            Err(e) => {
                tracing::warn!("model request failed, using canned beat: {}", e);
                return vec![canned_beat()];
            }
        };
        if raw.is_empty() {
            tracing::warn!("model returned no beats, using canned beat");
            return vec![canned_beat()];
        }

        raw.into_iter()
            .map(|beat| {
                let (facial_expression, animation) = enrich(
                    &beat.text,
                    beat.facial_expression.as_deref(),
                    beat.animation.as_deref(),
                );
                BeatDraft {
                    text: beat.text,
                    facial_expression,
                    animation,
                }
            })
            .collect()
    }

    /// Issues the chat request and extracts the raw beat list.
    ///
    /// # Errors
    ///
    /// `LlmError::Transport`/`Status` when both the chat and completion
    /// paths fail, `LlmError::Contract` when output cannot be parsed.
    pub async fn chat(
        &self,
        user_message: &str,
        history: &[ConversationTurn],
        images: &[String],
        model_override: &str,
    ) -> Result<Vec<RawBeat>, LlmError> {
        self.ensure_up().await;

        let images: Vec<&str> = images.iter().map(|s| strip_data_uri(s)).collect();
        let user_content = if user_message.is_empty() {
            if images.is_empty() {
                "Hello"
            } else {
                "Describe this image"
            }
        } else {
            user_message
        };

        let installed = self.installed_models().await;
        let model = resolve_model(model_override, !images.is_empty(), &installed);
        tracing::debug!(model = %model, installed = installed.len(), "resolved model");

        let mut user_turn = json!({ "role": "user", "content": user_content });
        if !images.is_empty() {
            user_turn["images"] = json!(images);
        }
        let mut messages = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];
        messages.extend(
            history
                .iter()
                .map(|turn| json!({ "role": turn.role, "content": turn.content })),
        );
        messages.push(user_turn);

        let body = json!({
            "model": model,
            "messages": messages,
            "stream": false,
            "format": "json",
            "options": { "num_gpu": 999, "num_ctx": NUM_CTX },
        });

        match self.post_chat(&body).await {
            Ok(raw) => extract_beats(&raw),
            Err(e) => {
                tracing::warn!("chat endpoint failed, trying completion: {}", e);
                let raw = self
                    .post_generate(&model, user_content, history, &images)
                    .await?;
                extract_beats(&raw)
            }
        }
    }

    async fn post_chat(&self, body: &Value) -> Result<String, LlmError> {
        let response = self
            .http
            .post(format!("{}/api/chat", self.base_url))
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        #[derive(Deserialize)]
        struct ChatResponse {
            message: Option<ChatMessage>,
        }
        #[derive(Deserialize)]
        struct ChatMessage {
            content: String,
        }

        let parsed: ChatResponse = response.json().await?;
        Ok(parsed
            .message
            .map(|m| m.content.trim().to_string())
            .unwrap_or_default())
    }

    /// Legacy single-shot completion with a linearized transcript.
    async fn post_generate(
        &self,
        model: &str,
        user_content: &str,
        history: &[ConversationTurn],
        images: &[&str],
    ) -> Result<String, LlmError> {
        let mut body = json!({
            "model": model,
            "prompt": linearize_transcript(history, user_content),
            "stream": false,
            "format": "json",
            "options": { "num_gpu": 999, "num_ctx": NUM_CTX },
        });
        if !images.is_empty() {
            body["images"] = json!(images);
        }

        let response = self
            .http
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(LlmError::Status {
                status: response.status().as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            response: Option<String>,
        }

        let parsed: GenerateResponse = response.json().await?;
        Ok(parsed
            .response
            .map(|r| r.trim().to_string())
            .unwrap_or_default())
    }

    /// Names of the locally installed models; empty on any failure.
    pub async fn installed_models(&self) -> Vec<String> {
        #[derive(Deserialize)]
        struct TagsResponse {
            #[serde(default)]
            models: Vec<TagModel>,
        }
        #[derive(Deserialize)]
        struct TagModel {
            name: String,
        }

        let response = self
            .http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await;

        match response {
            Ok(r) if r.status().is_success() => r
                .json::<TagsResponse>()
                .await
                .map(|tags| tags.models.into_iter().map(|m| m.name).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    /// Makes sure the inference service is reachable, spawning `ollama
    /// serve` detached and polling for up to 8 seconds if it is not.
    ///
    /// Returns whether the service answered; the caller proceeds either
    /// way and lets the actual request surface any failure.
    pub async fn ensure_up(&self) -> bool {
        if self.probe().await {
            return true;
        }
        if !self.autostart {
            return false;
        }

        for binary in ollama_candidates() {
            let spawned = tokio::process::Command::new(&binary)
                .arg("serve")
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::null())
                .stderr(std::process::Stdio::null())
                .spawn();
            match spawned {
                Ok(_) => {
                    tracing::info!(binary = %binary, "spawned inference service");
                    break;
                }
                Err(e) => {
                    tracing::debug!(binary = %binary, "spawn failed: {}", e);
                }
            }
        }

        let deadline = tokio::time::Instant::now() + STARTUP_WAIT;
        while tokio::time::Instant::now() < deadline {
            if self.probe().await {
                return true;
            }
            tokio::time::sleep(STARTUP_POLL).await;
        }
        false
    }

    async fn probe(&self) -> bool {
        self.http
            .get(format!("{}/api/tags", self.base_url))
            .timeout(TAGS_TIMEOUT)
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }
}

/// Candidate binaries for starting the inference service, in try order.
fn ollama_candidates() -> Vec<String> {
    let mut candidates = Vec::new();
    if let Ok(path) = std::env::var("OLLAMA_PATH") {
        if !path.is_empty() {
            candidates.push(path);
        }
    }
    candidates.push("ollama".to_string());
    #[cfg(windows)]
    {
        if let Ok(local) = std::env::var("LOCALAPPDATA") {
            candidates.push(format!("{}\\Programs\\Ollama\\ollama.exe", local));
        }
        if let Ok(programs) = std::env::var("ProgramFiles") {
            candidates.push(format!("{}\\Ollama\\ollama.exe", programs));
        }
    }
    candidates
}

/// Flattens prior turns and the new user message into `ROLE: content`
/// lines under the system directive, for the completion endpoint.
fn linearize_transcript(history: &[ConversationTurn], user_content: &str) -> String {
    let mut prompt = String::from(SYSTEM_PROMPT);
    prompt.push('\n');
    for turn in history {
        prompt.push_str(turn.role.label());
        prompt.push_str(": ");
        prompt.push_str(&turn.content);
        prompt.push('\n');
    }
    prompt.push_str("USER: ");
    prompt.push_str(user_content);
    prompt
}

/// Strips a data-URI prefix, leaving bare base64.
fn strip_data_uri(s: &str) -> &str {
    if s.starts_with("data:") {
        match s.find(',') {
            Some(idx) => &s[idx + 1..],
            None => s,
        }
    } else {
        s
    }
}

/// The neutral acknowledgment beat used when the model cannot be reached
/// at all.
fn canned_beat() -> BeatDraft {
    let expressions = FacialExpression::ALL;
    let animations = [
        Animation::Talking0,
        Animation::Talking1,
        Animation::Talking2,
        Animation::Laughing,
        Animation::Idle,
    ];
    let mut rng = rand::thread_rng();
    BeatDraft {
        text: "I'm here and listening.".to_string(),
        facial_expression: expressions
            .choose(&mut rng)
            .copied()
            .unwrap_or_default(),
        animation: animations
            .choose(&mut rng)
            .copied()
            .unwrap_or_else(random_talking),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visage_types::Role;

    #[test]
    fn transcript_linearizes_roles_uppercase() {
        let history = vec![
            ConversationTurn::new(Role::User, "hi"),
            ConversationTurn::new(Role::Assistant, "hello!"),
        ];
        let prompt = linearize_transcript(&history, "how are you?");
        assert!(prompt.contains("USER: hi\n"));
        assert!(prompt.contains("ASSISTANT: hello!\n"));
        assert!(prompt.ends_with("USER: how are you?"));
        assert!(prompt.starts_with(SYSTEM_PROMPT));
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        assert_eq!(strip_data_uri("data:image/png;base64,QUJD"), "QUJD");
        assert_eq!(strip_data_uri("QUJD"), "QUJD");
    }

    #[test]
    fn canned_beat_is_renderable() {
        let beat = canned_beat();
        assert_eq!(beat.text, "I'm here and listening.");
    }

    #[tokio::test]
    async fn unreachable_service_yields_exactly_one_canned_beat() {
        // Nothing listens on this port; both request paths fail fast.
        let service = LlmService::new("http://127.0.0.1:1").with_autostart(false);
        let beats = service.draft_beats("hello", &[], &[], "").await;
        assert_eq!(beats.len(), 1);
        assert_eq!(beats[0].text, "I'm here and listening.");
    }
}
