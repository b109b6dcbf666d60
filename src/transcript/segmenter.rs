// Transcript segmentation
//
// The recognizer emits a continuous stream of interim hypotheses and
// finalized results. The segmenter collapses that stream into discrete
// user turns: interim text is held until a final result arrives, and
// each final result yields at most one turn.

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::debug;

use super::source::SpeechFragment;

/// One complete user utterance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    pub text: String,
    pub finalized_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct TranscriptSegmenter {
    /// Latest interim hypothesis
    interim: String,
    turns_emitted: usize,
}

impl TranscriptSegmenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one fragment. Returns a turn when the fragment finalizes a non-empty utterance.
    pub fn push(&mut self, fragment: SpeechFragment) -> Option<Turn> {
        if !fragment.is_final {
            // Interim results are cumulative hypotheses, the latest one wins
            self.interim = fragment.text;
            return None;
        }

        self.interim.clear();
        self.emit(fragment.text)
    }

    /// Finalize whatever interim text is held (e.g. when capture stops)
    pub fn flush(&mut self) -> Option<Turn> {
        let pending = std::mem::take(&mut self.interim);
        self.emit(pending)
    }

    /// Drop any held interim text
    pub fn reset(&mut self) {
        self.interim.clear();
    }

    pub fn interim(&self) -> &str {
        &self.interim
    }

    pub fn turns_emitted(&self) -> usize {
        self.turns_emitted
    }

    /// Drain a fragment receiver, yielding turns lazily.
    ///
    /// Returns `None` once the receiver closes; any held interim text is
    /// finalized first.
    pub async fn next_turn(&mut self, rx: &mut mpsc::Receiver<SpeechFragment>) -> Option<Turn> {
        while let Some(fragment) = rx.recv().await {
            if let Some(turn) = self.push(fragment) {
                return Some(turn);
            }
        }
        self.flush()
    }

    fn emit(&mut self, text: String) -> Option<Turn> {
        let text = normalize(&text);
        if text.is_empty() {
            debug!("Dropping empty final fragment");
            return None;
        }

        self.turns_emitted += 1;
        Some(Turn {
            text,
            finalized_at: Utc::now(),
        })
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
