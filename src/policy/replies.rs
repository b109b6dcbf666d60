use super::PolicyContext;
use crate::error::PolicyError;

/// Black-box reply generation: user turn in, therapist text out
pub trait ReplyGenerator: Send + Sync {
    fn reply(&self, turn: &str, context: &PolicyContext<'_>) -> Result<String, PolicyError>;
}

/// Keyword-driven canned replies
#[derive(Debug, Default, Clone, Copy)]
pub struct HeuristicReplies;

const REFLECTIONS: &[&str] = &[
    "Thank you for sharing that. Let's take a slow breath in, and a long breath out.",
    "I hear you. Notice where you feel that in your body, and let your shoulders soften.",
    "That makes sense. Stay with your breath for a moment, in through the nose and out through the mouth.",
    "Let's pause here together. Feel the ground beneath you and breathe gently.",
];

impl ReplyGenerator for HeuristicReplies {
    fn reply(&self, turn: &str, context: &PolicyContext<'_>) -> Result<String, PolicyError> {
        let lowered = turn.to_lowercase();
        let has = |words: &[&str]| words.iter().any(|w| lowered.contains(w));

        let text = if has(&["stress", "anxious", "anxiety", "panic", "overwhelm", "worr", "nervous", "tense"]) {
            "It sounds like a lot is weighing on you. Let's ground ourselves: breathe in for four counts, hold for four, and breathe out for six."
        } else if has(&["sleep", "tired", "exhausted", "insomnia"]) {
            "Rest matters. Let your eyes soften, release the tension in your jaw, and let each exhale be a little longer than the last."
        } else if has(&["sad", "lonely", "down", "grief", "cry"]) {
            "I'm here with you. Whatever you're feeling is welcome. Place a hand on your heart and breathe into that space."
        } else if has(&["angry", "frustrat", "upset", "annoyed"]) {
            "That frustration is valid. Let's breathe it out together: a deep breath in, and a slow, steady breath out."
        } else if has(&["good", "great", "calm", "relaxed", "better", "happy"]) {
            "That's wonderful to hear. Let's savor this feeling with a few easy, natural breaths."
        } else {
            REFLECTIONS[context.turn_count.saturating_sub(1) % REFLECTIONS.len()]
        };

        Ok(text.to_string())
    }
}
