use std::io::Cursor;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;
use uuid::Uuid;

use crate::error::SpeechError;

static NEXT_CLIP_ID: AtomicU64 = AtomicU64::new(1);

/// Identifier of a decoded clip, unique within the process
pub type ClipId = u64;

/// A synthesized-speech clip decoded to interleaved 16-bit PCM
#[derive(Debug, Clone)]
pub struct DecodedClip {
    pub id: ClipId,
    /// Message this clip speaks, if any
    pub message_id: Option<Uuid>,
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    pub channels: u16,
}

impl DecodedClip {
    /// Build a clip from raw PCM
    pub fn from_pcm(
        message_id: Option<Uuid>,
        samples: Vec<i16>,
        sample_rate: u32,
        channels: u16,
    ) -> Self {
        Self {
            id: NEXT_CLIP_ID.fetch_add(1, Ordering::Relaxed),
            message_id,
            samples,
            sample_rate,
            channels,
        }
    }

    /// Decode an encoded clip (MP3, WAV, OGG, ...) as returned by the synthesizer
    pub fn decode(bytes: &[u8], message_id: Option<Uuid>) -> Result<Self, SpeechError> {
        if bytes.is_empty() {
            return Err(SpeechError::EmptyClip);
        }

        let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
        let probed = symphonia::default::get_probe()
            .format(
                &Hint::new(),
                source,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| SpeechError::Decode(e.to_string()))?;

        let mut format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| SpeechError::Decode("no audio track".to_string()))?;

        let track_id = track.id;
        let mut sample_rate = track.codec_params.sample_rate.unwrap_or(0);
        let mut channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u16)
            .unwrap_or(0);

        let mut decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .map_err(|e| SpeechError::Decode(e.to_string()))?;

        let mut samples: Vec<i16> = Vec::new();

        loop {
            let packet = match format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
                    break
                }
                Err(SymphoniaError::ResetRequired) => break,
                Err(e) => return Err(SpeechError::Decode(e.to_string())),
            };

            if packet.track_id() != track_id {
                continue;
            }

            match decoder.decode(&packet) {
                Ok(decoded) => {
                    let spec = *decoded.spec();
                    sample_rate = spec.rate;
                    channels = spec.channels.count() as u16;

                    let mut buffer = SampleBuffer::<i16>::new(decoded.capacity() as u64, spec);
                    buffer.copy_interleaved_ref(decoded);
                    samples.extend_from_slice(buffer.samples());
                }
                // Corrupt packets are skipped
                Err(SymphoniaError::DecodeError(e)) => debug!("Skipping undecodable packet: {}", e),
                Err(e) => return Err(SpeechError::Decode(e.to_string())),
            }
        }

        if samples.is_empty() || sample_rate == 0 || channels == 0 {
            return Err(SpeechError::EmptyClip);
        }

        Ok(Self::from_pcm(message_id, samples, sample_rate, channels))
    }

    /// Playback duration of the clip
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 || self.channels == 0 {
            return Duration::ZERO;
        }
        let frames = self.samples.len() as f64 / self.channels as f64;
        Duration::from_secs_f64(frames / self.sample_rate as f64)
    }
}
