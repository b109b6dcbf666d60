pub mod segmenter;
pub mod source;

pub use segmenter::{TranscriptSegmenter, Turn};
pub use source::{LineSpeechSource, PushSpeechSource, SpeechFeed, SpeechFragment, SpeechSource};
