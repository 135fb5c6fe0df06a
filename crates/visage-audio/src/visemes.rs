//! Heuristic grapheme-to-viseme synthesis.
//!
//! When forced alignment is unavailable the pipeline still needs a timeline
//! that covers the audio exactly, so the renderer has something to animate.
//! This maps letters to mouth shapes by rough phonetic class, collapses
//! runs, and spreads the target duration evenly across the segments. Not
//! phonetically accurate, and not meant to be.

use visage_types::{Lipsync, MouthCue, Viseme};

/// Produces a mouth-cue timeline covering exactly `duration_secs`.
///
/// The timeline is never empty: text that strips down to nothing yields a
/// single cue spanning the whole duration with the classifier's default
/// shape. Cues are contiguous, start at 0, and end at `duration_secs`.
pub fn fallback_mouth_cues(text: &str, duration_secs: f64) -> Lipsync {
    let letters: Vec<char> = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_whitespace())
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .collect();

    // Classify with one-character lookahead, then collapse repeats.
    let mut sequence: Vec<Viseme> = Vec::new();
    for (i, &c) in letters.iter().enumerate() {
        let viseme = classify(c, letters.get(i + 1).copied());
        if sequence.last() != Some(&viseme) {
            sequence.push(viseme);
        }
    }
    if sequence.is_empty() {
        sequence.push(Viseme::C);
    }

    let step = duration_secs / sequence.len() as f64;
    let mouth_cues = sequence
        .into_iter()
        .enumerate()
        .map(|(i, value)| MouthCue {
            start: i as f64 * step,
            end: (i + 1) as f64 * step,
            value,
        })
        .collect();
    Lipsync::new(mouth_cues)
}

/// Maps one letter (with lookahead for the `th` digraph) to a mouth shape.
fn classify(c: char, next: Option<char>) -> Viseme {
    if c == 't' && next == Some('h') {
        return Viseme::H;
    }
    match c {
        'p' | 'b' | 'm' => Viseme::A,     // bilabial closure
        'f' | 'v' => Viseme::G,           // labiodental
        'o' => Viseme::E,                 // rounded back vowel
        'u' | 'w' => Viseme::F,           // rounded front
        'a' => Viseme::D,                 // open vowel
        'e' | 'i' | 'y' => Viseme::C,     // front vowel
        'k' | 'g' | 'x' | 'q' => Viseme::B, // velar
        ' ' => Viseme::X,                 // rest
        _ => Viseme::C,                   // default mid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-3;

    fn assert_covers(lipsync: &Lipsync, duration: f64) {
        let cues = &lipsync.mouth_cues;
        assert!(!cues.is_empty());
        assert!(cues[0].start.abs() < TOLERANCE);
        assert!((cues.last().unwrap().end - duration).abs() < TOLERANCE);
        for pair in cues.windows(2) {
            assert!(
                (pair[1].start - pair[0].end).abs() < TOLERANCE,
                "gap between {:?} and {:?}",
                pair[0],
                pair[1]
            );
        }
    }

    #[test]
    fn timeline_is_contiguous_and_duration_exact() {
        for (text, duration) in [
            ("Hello there, how are you today?", 2.4),
            ("mmm", 0.5),
            ("a", 1.0),
            ("the quick brown fox", 3.25),
        ] {
            let lipsync = fallback_mouth_cues(text, duration);
            assert_covers(&lipsync, duration);
        }
    }

    #[test]
    fn empty_text_yields_single_default_cue() {
        for text in ["", "1234!?", "   "] {
            let lipsync = fallback_mouth_cues(text, 2.0);
            // "   " collapses to one X cue; the others to one default cue.
            assert_eq!(
                lipsync.mouth_cues.len(),
                1,
                "text {:?} should collapse to one cue",
                text
            );
            assert_covers(&lipsync, 2.0);
        }
        let lipsync = fallback_mouth_cues("", 2.0);
        assert_eq!(lipsync.mouth_cues[0].value, Viseme::C);
    }

    #[test]
    fn classifies_by_phonetic_class() {
        // h, e, l, l, o -> C C C C E -> collapsed C E
        let lipsync = fallback_mouth_cues("hello", 1.0);
        let values: Vec<Viseme> = lipsync.mouth_cues.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![Viseme::C, Viseme::E]);
    }

    #[test]
    fn th_digraph_uses_lookahead() {
        // t(h) -> H, h -> C, e -> C (collapsed with the h)
        let lipsync = fallback_mouth_cues("the", 1.0);
        let values: Vec<Viseme> = lipsync.mouth_cues.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![Viseme::H, Viseme::C]);
    }

    #[test]
    fn spaces_become_rest_segments() {
        let lipsync = fallback_mouth_cues("a a", 1.5);
        let values: Vec<Viseme> = lipsync.mouth_cues.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![Viseme::D, Viseme::X, Viseme::D]);
    }

    #[test]
    fn repeats_collapse_into_single_segments() {
        let lipsync = fallback_mouth_cues("bbbppp", 1.0);
        assert_eq!(lipsync.mouth_cues.len(), 1);
        assert_eq!(lipsync.mouth_cues[0].value, Viseme::A);
    }
}
