// Playback queue for synthesized speech
//
// At most one clip sounds at a time. A clip that arrives while another is
// playing takes the single pending slot, replacing whatever was waiting
// there. The sounding clip is never interrupted.

use std::sync::Arc;
use tracing::{debug, info};

use super::clip::{ClipId, DecodedClip};

/// What happened to an enqueued clip
#[derive(Debug)]
pub enum Enqueued {
    /// Nothing was playing; the clip must be started now
    Start(Arc<DecodedClip>),
    /// The clip waits in the pending slot; `superseded` is the clip it replaced
    Pending { superseded: Option<Arc<DecodedClip>> },
}

#[derive(Debug, Default)]
pub struct PlaybackQueue {
    playing: Option<Arc<DecodedClip>>,
    pending: Option<Arc<DecodedClip>>,
}

impl PlaybackQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, clip: DecodedClip) -> Enqueued {
        let clip = Arc::new(clip);

        if self.playing.is_none() {
            info!("Starting clip {} ({:.1}s)", clip.id, clip.duration().as_secs_f64());
            self.playing = Some(Arc::clone(&clip));
            return Enqueued::Start(clip);
        }

        let superseded = self.pending.replace(clip);
        if let Some(old) = &superseded {
            debug!("Clip {} superseded before playback", old.id);
        }
        Enqueued::Pending { superseded }
    }

    /// Mark the sounding clip as finished and release it.
    ///
    /// Returns the pending clip, which becomes the sounding one. A stale id
    /// (not the sounding clip) is ignored.
    pub fn finish(&mut self, clip_id: ClipId) -> Option<Arc<DecodedClip>> {
        match &self.playing {
            Some(current) if current.id == clip_id => {}
            _ => {
                debug!("Ignoring completion of clip {} (not playing)", clip_id);
                return None;
            }
        }

        self.playing = self.pending.take();
        self.playing.clone()
    }

    /// Drop the waiting clip without touching the sounding one
    pub fn clear_pending(&mut self) -> Option<Arc<DecodedClip>> {
        self.pending.take()
    }

    pub fn is_playing(&self) -> bool {
        self.playing.is_some()
    }

    pub fn playing_id(&self) -> Option<ClipId> {
        self.playing.as_ref().map(|c| c.id)
    }

    pub fn pending_id(&self) -> Option<ClipId> {
        self.pending.as_ref().map(|c| c.id)
    }
}
