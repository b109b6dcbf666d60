// Integration tests for clip decoding, the playback queue and the sinks
//
// Clips are generated in memory with hound and decoded back through symphonia.

mod common;

use anyhow::Result;
use common::wav_bytes;
use serene_voice::error::SpeechError;
use serene_voice::playback::{DecodedClip, Enqueued, PlaybackQueue, PlaybackSink, SilentSink, WavFileSink};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use uuid::Uuid;

fn clip(samples: usize) -> DecodedClip {
    DecodedClip::from_pcm(None, vec![0i16; samples], 16000, 1)
}

#[test]
fn test_decode_wav_clip() -> Result<()> {
    let message_id = Uuid::new_v4();
    let clip = DecodedClip::decode(&wav_bytes(16000), Some(message_id))?;

    assert_eq!(clip.sample_rate, 16000);
    assert_eq!(clip.channels, 1);
    assert_eq!(clip.samples.len(), 16000);
    assert_eq!(clip.message_id, Some(message_id));
    assert_eq!(clip.duration(), Duration::from_secs(1));

    Ok(())
}

#[test]
fn test_decode_empty_clip_fails() {
    let result = DecodedClip::decode(&[], None);
    assert!(matches!(result, Err(SpeechError::EmptyClip)));
}

#[test]
fn test_decode_garbage_fails() {
    let result = DecodedClip::decode(b"definitely not audio", None);
    assert!(result.is_err(), "Decoding garbage should fail");
}

#[test]
fn test_clip_ids_are_unique() {
    let a = clip(10);
    let b = clip(10);
    assert_ne!(a.id, b.id);
}

#[test]
fn test_queue_starts_first_clip() {
    let mut queue = PlaybackQueue::new();
    assert!(!queue.is_playing());

    let first = clip(100);
    let first_id = first.id;
    match queue.enqueue(first) {
        Enqueued::Start(started) => assert_eq!(started.id, first_id),
        other => panic!("expected Start, got {:?}", other),
    }
    assert_eq!(queue.playing_id(), Some(first_id));
    assert_eq!(queue.pending_id(), None);
}

#[test]
fn test_queue_latest_pending_clip_wins() {
    let mut queue = PlaybackQueue::new();
    let first = clip(100);
    let first_id = first.id;
    queue.enqueue(first);

    let second = clip(100);
    let second_id = second.id;
    match queue.enqueue(second) {
        Enqueued::Pending { superseded } => assert!(superseded.is_none()),
        other => panic!("expected Pending, got {:?}", other),
    }

    let third = clip(100);
    let third_id = third.id;
    match queue.enqueue(third) {
        Enqueued::Pending { superseded } => {
            assert_eq!(superseded.map(|c| c.id), Some(second_id));
        }
        other => panic!("expected Pending, got {:?}", other),
    }

    // The sounding clip is never interrupted
    assert_eq!(queue.playing_id(), Some(first_id));
    assert_eq!(queue.pending_id(), Some(third_id));

    let next = queue.finish(first_id).expect("pending clip should start");
    assert_eq!(next.id, third_id);
    assert_eq!(queue.playing_id(), Some(third_id));

    assert!(queue.finish(third_id).is_none());
    assert!(!queue.is_playing());
}

#[test]
fn test_queue_ignores_stale_completion() {
    let mut queue = PlaybackQueue::new();
    let first = clip(100);
    let first_id = first.id;
    queue.enqueue(first);
    queue.enqueue(clip(100));

    assert!(queue.finish(first_id + 1000).is_none());
    assert_eq!(queue.playing_id(), Some(first_id));
    assert!(queue.pending_id().is_some());
}

#[test]
fn test_queue_clear_pending_keeps_sounding_clip() {
    let mut queue = PlaybackQueue::new();
    let first = clip(100);
    let first_id = first.id;
    queue.enqueue(first);
    let second = clip(100);
    let second_id = second.id;
    queue.enqueue(second);

    let dropped = queue.clear_pending().unwrap();
    assert_eq!(dropped.id, second_id);
    assert_eq!(queue.playing_id(), Some(first_id));

    assert!(queue.finish(first_id).is_none());
    assert!(!queue.is_playing());
}

#[tokio::test]
async fn test_wav_sink_writes_one_file_per_clip() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let output_dir = temp_dir.path().join("clips");
    let sink = WavFileSink::new(&output_dir, false)?;

    let first = Arc::new(DecodedClip::from_pcm(
        Some(Uuid::new_v4()),
        vec![100i16; 8000],
        16000,
        1,
    ));
    let second = Arc::new(clip(4000));

    sink.play(Arc::clone(&first)).await?;
    sink.play(Arc::clone(&second)).await?;

    let files: Vec<_> = std::fs::read_dir(&output_dir)?.collect::<Result<_, _>>()?;
    assert_eq!(files.len(), 2, "Should create one WAV file per clip");

    let reader = hound::WavReader::open(sink.clip_path(&first))?;
    assert_eq!(reader.spec().sample_rate, 16000);
    assert_eq!(reader.spec().channels, 1);
    assert_eq!(reader.len(), 8000);

    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_realtime_sink_waits_for_clip_duration() -> Result<()> {
    let sink = SilentSink::new(true);
    let start = tokio::time::Instant::now();

    sink.play(Arc::new(clip(32000))).await?;

    assert!(start.elapsed() >= Duration::from_secs(2));
    Ok(())
}
