//! Model resolution against the set of locally installed models.
//!
//! Requests prefer a vision-capable model when images are attached (or the
//! caller explicitly asks for one) and a general chat model otherwise. The
//! preference list is matched against what Ollama actually has installed:
//! exact name first, then family-prefix fuzzy match, then the first
//! preference as a last resort, with a same-family substitution when even
//! that is absent locally.

/// Vision-capable models, most preferred first.
pub const VISION_PREFERENCES: [&str; 3] = ["llava:7b", "llava:latest", "llava"];

/// General chat models, most preferred first.
pub const CHAT_PREFERENCES: [&str; 4] = [
    "llama3.1:8b",
    "llama3.1:8b-instruct",
    "llama3.1",
    "llama:8b",
];

/// Whether the request should be routed to a vision-capable model.
pub fn wants_vision(model_override: &str, has_images: bool) -> bool {
    has_images || model_override.eq_ignore_ascii_case("llava")
}

/// Picks the model to address for this request.
///
/// `installed` is the name list reported by the inference service; it may
/// be empty when the service is unreachable, in which case the first
/// preference is returned and the request is allowed to fail downstream.
pub fn resolve_model(model_override: &str, has_images: bool, installed: &[String]) -> String {
    let vision = wants_vision(model_override, has_images);
    let preferences: &[&str] = if vision {
        &VISION_PREFERENCES
    } else {
        &CHAT_PREFERENCES
    };

    let chosen = preferences
        .iter()
        .copied()
        .find(|&p| installed.iter().any(|n| n == p))
        .or_else(|| {
            preferences
                .iter()
                .copied()
                .find(|&p| installed.iter().any(|n| n.starts_with(family(p))))
        })
        .unwrap_or(preferences[0]);

    // Last resort: any installed model from the same capability family.
    let present = installed.iter().any(|n| n == chosen)
        || installed.iter().any(|n| n.starts_with(family(chosen)));
    if !present {
        let alternate = if vision { "llava" } else { "llama3.1:8b" };
        if let Some(name) = installed.iter().find(|n| n.starts_with(alternate)) {
            return name.clone();
        }
    }

    chosen.to_string()
}

/// The model family: everything before the `:` tag.
fn family(name: &str) -> &str {
    name.split(':').next().unwrap_or(name)
}
