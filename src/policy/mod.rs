//! Response policy: what the therapist says next and whether to suggest a meditation
//!
//! The recommendation gate is deterministic for turns containing a stress
//! keyword. Other turns are recommended with a fixed residual probability,
//! decided by an injectable [`SuggestionDice`] so tests can pin the outcome.

mod dice;
mod replies;

pub use dice::{SeededDice, SuggestionDice};
pub use replies::{HeuristicReplies, ReplyGenerator};

use tracing::debug;

use crate::catalog::{MeditationSound, Persona};
use crate::error::PolicyError;

/// Residual chance of suggesting a meditation when no stress keyword matched
pub const DEFAULT_SUGGESTION_PROBABILITY: f64 = 0.3;

/// Stress indicators that always trigger a meditation suggestion
pub const DEFAULT_STRESS_KEYWORDS: &[&str] = &[
    "stress",
    "anxious",
    "anxiety",
    "overwhelm",
    "worried",
    "worry",
    "panic",
    "tense",
    "nervous",
    "restless",
    "can't sleep",
    "cannot sleep",
    "exhausted",
    "burned out",
    "burnt out",
];

/// Conversation context passed to the policy with every turn
#[derive(Debug, Clone, Copy)]
pub struct PolicyContext<'a> {
    pub persona: &'a Persona,
    /// Number of user turns so far in this session, including the current one
    pub turn_count: usize,
    pub remaining_seconds: Option<u32>,
}

/// Why a meditation was (or was not) recommended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestionReason {
    Keyword(String),
    Chance,
    NotSuggested,
}

/// Outcome of one policy decision
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyReply {
    pub text: String,
    pub suggest_meditation: bool,
    pub reason: SuggestionReason,
}

pub struct ResponsePolicy {
    generator: Box<dyn ReplyGenerator>,
    dice: Box<dyn SuggestionDice>,
    keywords: Vec<String>,
    probability: f64,
}

impl ResponsePolicy {
    pub fn new(generator: Box<dyn ReplyGenerator>, dice: Box<dyn SuggestionDice>) -> Self {
        Self {
            generator,
            dice,
            keywords: DEFAULT_STRESS_KEYWORDS.iter().map(|k| k.to_string()).collect(),
            probability: DEFAULT_SUGGESTION_PROBABILITY,
        }
    }

    /// Heuristic replies with the given dice
    pub fn heuristic(dice: Box<dyn SuggestionDice>) -> Self {
        Self::new(Box::new(HeuristicReplies), dice)
    }

    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability.clamp(0.0, 1.0);
        self
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// First stress keyword contained in `turn` (case-insensitive)
    pub fn matched_keyword(&self, turn: &str) -> Option<&str> {
        let lowered = turn.to_lowercase();
        self.keywords
            .iter()
            .find(|k| lowered.contains(k.as_str()))
            .map(|k| k.as_str())
    }

    /// Decide the reply to a user turn
    pub fn respond(
        &mut self,
        turn: &str,
        context: &PolicyContext<'_>,
    ) -> Result<PolicyReply, PolicyError> {
        let text = self.generator.reply(turn, context)?;

        let matched = self.matched_keyword(turn).map(str::to_string);
        let reason = match matched {
            Some(keyword) => SuggestionReason::Keyword(keyword),
            None if self.dice.roll(self.probability) => SuggestionReason::Chance,
            None => SuggestionReason::NotSuggested,
        };
        let suggest_meditation = reason != SuggestionReason::NotSuggested;

        debug!("Policy decision for turn {}: {:?}", context.turn_count, reason);

        let text = if suggest_meditation {
            format!(
                "{} Would you like to try a short guided meditation together?",
                text
            )
        } else {
            text
        };

        Ok(PolicyReply {
            text,
            suggest_meditation,
            reason,
        })
    }

    pub fn introduction(&self, persona: &Persona) -> String {
        format!(
            "Hello, I'm {}. {}. I'd be glad to guide you today.",
            persona.name, persona.description
        )
    }

    pub fn greeting(&self, persona: &Persona, minutes: u32) -> String {
        format!(
            "Welcome to your {}-minute session. I'm {}, and I'm here to guide you. How are you feeling today?",
            minutes, persona.name
        )
    }

    pub fn check_in_prompt(&self) -> String {
        "How are you feeling right now? Are you comfortable and ready to continue?".to_string()
    }

    pub fn meditation_intro(&self, sound: &MeditationSound) -> String {
        format!(
            "Let's begin your meditation with {}. Settle into a comfortable position and let your breath slow down.",
            sound.name.to_lowercase()
        )
    }

    pub fn meditation_return(&self) -> String {
        "Welcome back. Take a moment to notice how you feel now.".to_string()
    }

    pub fn closing(&self) -> String {
        "Thank you for this meditation session. You've taken an important step in your wellness journey.".to_string()
    }
}
