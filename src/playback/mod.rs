pub mod clip;
pub mod queue;
pub mod sink;

pub use clip::{ClipId, DecodedClip};
pub use queue::{Enqueued, PlaybackQueue};
pub use sink::{PlaybackSink, SilentSink, WavFileSink};
