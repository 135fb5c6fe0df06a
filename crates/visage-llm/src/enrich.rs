//! Expression/animation enrichment from beat text.
//!
//! The model is asked for an expression and an animation per beat but often
//! omits them or sends empty strings. Fill-only-if-absent: a present,
//! recognizable label is kept verbatim; anything else is derived from the
//! text by keyword and punctuation heuristics. Unknown labels fall through
//! to the heuristic rather than failing the beat.

use rand::seq::SliceRandom;
use visage_types::{Animation, FacialExpression};

/// Resolves the final expression/animation pair for one beat.
pub fn enrich(
    text: &str,
    expression: Option<&str>,
    animation: Option<&str>,
) -> (FacialExpression, Animation) {
    let expression = expression
        .and_then(FacialExpression::from_label)
        .unwrap_or_else(|| expression_from_text(text));
    let animation = animation
        .and_then(Animation::from_label)
        .unwrap_or_else(|| animation_from_text(text));
    (expression, animation)
}

fn expression_from_text(text: &str) -> FacialExpression {
    let text = text.to_lowercase();
    if contains_word(&text, &["haha", "lol", "thanks", "great", "awesome", "nice"]) {
        FacialExpression::Smile
    } else if contains_word(&text, &["sad", "sorry", "miss", "cry", "unhappy"]) {
        FacialExpression::Sad
    } else if contains_word(&text, &["angry", "mad", "furious"]) {
        FacialExpression::Angry
    } else {
        FacialExpression::Default
    }
}

fn animation_from_text(text: &str) -> Animation {
    let text = text.to_lowercase();
    let interrogative = [
        "how", "what", "why", "who", "where", "when", "can", "could", "would", "should", "is",
        "are", "do", "does", "did",
    ];
    if text.contains('?') || contains_word(&text, &interrogative) {
        random_talking()
    } else if contains_word(&text, &["haha", "lol", "joke", "funny", "lmao"]) {
        Animation::Laughing
    } else if contains_word(&text, &["sad", "sorry", "cry", "miss"]) {
        Animation::Crying
    } else if contains_word(&text, &["angry", "mad", "furious"]) {
        Animation::Angry
    } else if contains_word(&text, &["scared", "afraid", "shock", "terrified"]) {
        Animation::Terrified
    } else if contains_word(&text, &["dance", "party", "music"]) {
        Animation::Rumba
    } else {
        random_talking()
    }
}

/// One of the neutral talking clips, chosen at random.
pub fn random_talking() -> Animation {
    *Animation::TALKING
        .choose(&mut rand::thread_rng())
        .unwrap_or(&Animation::Talking0)
}

/// Word-boundary containment: true when any of `words` appears as a whole
/// token of `text`.
fn contains_word(text: &str, words: &[&str]) -> bool {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .any(|token| words.contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_labels_are_kept_verbatim() {
        let (expr, anim) = enrich("I am so sad today", Some("smile"), Some("Rumba"));
        assert_eq!(expr, FacialExpression::Smile);
        assert_eq!(anim, Animation::Rumba);
    }

    #[test]
    fn empty_labels_fall_through_to_heuristics() {
        let (expr, anim) = enrich("I'm so sorry, I miss you", Some(""), Some(""));
        assert_eq!(expr, FacialExpression::Sad);
        assert_eq!(anim, Animation::Crying);
    }

    #[test]
    fn unknown_labels_fall_through_to_heuristics() {
        let (expr, anim) = enrich("haha that joke!", Some("ecstatic"), Some("Backflip"));
        assert_eq!(expr, FacialExpression::Smile);
        assert_eq!(anim, Animation::Laughing);
    }

    #[test]
    fn questions_get_a_talking_clip() {
        let (_, anim) = enrich("What should we do next?", None, None);
        assert!(Animation::TALKING.contains(&anim));
        let (_, anim) = enrich("where were you", None, None);
        assert!(Animation::TALKING.contains(&anim));
    }

    #[test]
    fn keyword_classes_map_to_clips() {
        assert_eq!(enrich("let's dance all night", None, None).1, Animation::Rumba);
        assert_eq!(
            enrich("I'm terrified of spiders", None, None).1,
            Animation::Terrified
        );
        assert_eq!(enrich("so mad right now", None, None).1, Animation::Angry);
    }

    #[test]
    fn neutral_text_defaults_to_talking() {
        let (expr, anim) = enrich("the weather seems fine", None, None);
        assert_eq!(expr, FacialExpression::Default);
        assert!(Animation::TALKING.contains(&anim));
    }

    #[test]
    fn word_boundaries_are_respected() {
        // "missing" must not trigger the "miss" sadness class.
        let (expr, _) = enrich("the missing file turned up", None, None);
        assert_eq!(expr, FacialExpression::Default);
    }
}
