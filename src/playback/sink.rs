use anyhow::Context;
use std::fs;
use std::io::BufWriter;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::clip::DecodedClip;
use crate::error::SpeechError;

/// Audio output for decoded clips
///
/// `play` resolves once the clip has finished sounding. Implementations:
/// - `WavFileSink`: writes each clip to disk (optionally paced in real time)
/// - `SilentSink`: discards clips, optionally waiting for their duration
#[async_trait::async_trait]
pub trait PlaybackSink: Send + Sync {
    /// Play a clip to completion
    async fn play(&self, clip: Arc<DecodedClip>) -> Result<(), SpeechError>;

    /// Sink name for logging
    fn name(&self) -> &str;
}

/// Writes every clip to `<output_dir>/<clip-id>.wav`
pub struct WavFileSink {
    output_dir: PathBuf,
    /// Wait for the clip duration after writing, like a real device would
    realtime: bool,
}

impl WavFileSink {
    pub fn new(output_dir: impl Into<PathBuf>, realtime: bool) -> anyhow::Result<Self> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir).context("Failed to create clip output directory")?;

        info!("WAV sink writing clips to {}", output_dir.display());

        Ok(Self {
            output_dir,
            realtime,
        })
    }

    pub fn clip_path(&self, clip: &DecodedClip) -> PathBuf {
        match clip.message_id {
            Some(message_id) => self
                .output_dir
                .join(format!("clip-{:05}-{}.wav", clip.id, message_id)),
            None => self.output_dir.join(format!("clip-{:05}.wav", clip.id)),
        }
    }

    fn write(&self, clip: &DecodedClip) -> Result<PathBuf, SpeechError> {
        let path = self.clip_path(clip);
        let spec = hound::WavSpec {
            channels: clip.channels,
            sample_rate: clip.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let file = fs::File::create(&path)
            .map_err(|e| SpeechError::Playback(format!("{}: {}", path.display(), e)))?;
        let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)
            .map_err(|e| SpeechError::Playback(e.to_string()))?;

        for &sample in &clip.samples {
            writer
                .write_sample(sample)
                .map_err(|e| SpeechError::Playback(e.to_string()))?;
        }

        writer
            .finalize()
            .map_err(|e| SpeechError::Playback(e.to_string()))?;

        Ok(path)
    }
}

#[async_trait::async_trait]
impl PlaybackSink for WavFileSink {
    async fn play(&self, clip: Arc<DecodedClip>) -> Result<(), SpeechError> {
        let path = self.write(&clip)?;
        info!(
            "Clip {} written to {} ({:.1}s)",
            clip.id,
            path.display(),
            clip.duration().as_secs_f64()
        );

        if self.realtime {
            tokio::time::sleep(clip.duration()).await;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "wav-file"
    }
}

/// Discards clips
#[derive(Debug, Default)]
pub struct SilentSink {
    realtime: bool,
}

impl SilentSink {
    pub fn new(realtime: bool) -> Self {
        Self { realtime }
    }
}

#[async_trait::async_trait]
impl PlaybackSink for SilentSink {
    async fn play(&self, clip: Arc<DecodedClip>) -> Result<(), SpeechError> {
        if self.realtime {
            tokio::time::sleep(clip.duration()).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "silent"
    }
}
