use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of the residual random suggestion decision
pub trait SuggestionDice: Send {
    /// Return true with the given probability
    fn roll(&mut self, probability: f64) -> bool;
}

/// `StdRng`-backed dice, seedable for reproducible sessions
pub struct SeededDice {
    rng: StdRng,
}

impl SeededDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl SuggestionDice for SeededDice {
    fn roll(&mut self, probability: f64) -> bool {
        if probability <= 0.0 {
            return false;
        }
        if probability >= 1.0 {
            return true;
        }
        self.rng.gen_bool(probability)
    }
}
