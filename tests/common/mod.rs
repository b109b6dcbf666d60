// Shared fakes for the integration tests
//
// Every collaborator of the orchestrator has an in-memory stand-in here that
// records what it was asked to do and can be told to fail.

#![allow(dead_code)]

use serene_voice::channel::{RealtimeConnection, RealtimeTransport, TransportFrame};
use serene_voice::error::{ChannelError, ServiceError, SpeechError};
use serene_voice::playback::{DecodedClip, PlaybackSink};
use serene_voice::policy::{ResponsePolicy, SuggestionDice};
use serene_voice::service::{CreatedSession, SessionService, Track};
use serene_voice::session::SessionConfig;
use serene_voice::transcript::{SpeechFragment, SpeechSource};
use serene_voice::session::SessionSnapshot;
use serene_voice::{Command, Orchestrator, OrchestratorDeps, OrchestratorHandle, Persona};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// A short mono WAV clip, encoded the way the synthesizer would return it
pub fn wav_bytes(samples: usize) -> Vec<u8> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut cursor, spec).unwrap();
        for i in 0..samples {
            writer.write_sample(((i % 64) as i16 - 32) * 100).unwrap();
        }
        writer.finalize().unwrap();
    }
    cursor.into_inner()
}

// ============================================================================
// Session service
// ============================================================================

#[derive(Default)]
pub struct FakeService {
    pub fail_create: AtomicBool,
    pub fail_speech: AtomicBool,
    pub fail_tracks: AtomicBool,
    sessions_created: AtomicUsize,
    /// (persona id, minutes) per create call
    pub created: Mutex<Vec<(String, u32)>>,
    /// Every text sent for synthesis
    pub spoken: Mutex<Vec<String>>,
    pub tracks: Mutex<Vec<Track>>,
}

impl FakeService {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn spoken(&self) -> Vec<String> {
        self.spoken.lock().unwrap().clone()
    }

    pub fn created_count(&self) -> usize {
        self.sessions_created.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl SessionService for FakeService {
    async fn create_session(
        &self,
        persona: &Persona,
        duration_minutes: u32,
    ) -> Result<CreatedSession, ServiceError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(ServiceError::Status {
                endpoint: "/api/session".to_string(),
                status: 500,
            });
        }
        let n = self.sessions_created.fetch_add(1, Ordering::SeqCst) + 1;
        self.created
            .lock()
            .unwrap()
            .push((persona.id.clone(), duration_minutes));
        Ok(CreatedSession {
            id: format!("session-{}", n),
            voice_persona: Some(persona.id.clone()),
            duration_minutes: Some(duration_minutes),
            status: Some("active".to_string()),
        })
    }

    async fn synthesize_speech(&self, text: &str, _persona: &Persona) -> Result<Vec<u8>, ServiceError> {
        self.spoken.lock().unwrap().push(text.to_string());
        if self.fail_speech.load(Ordering::SeqCst) {
            return Err(ServiceError::Status {
                endpoint: "/api/generate-speech".to_string(),
                status: 503,
            });
        }
        Ok(wav_bytes(1600))
    }

    async fn list_tracks(&self, category: &str) -> Result<Vec<Track>, ServiceError> {
        if self.fail_tracks.load(Ordering::SeqCst) {
            return Err(ServiceError::InvalidResponse {
                endpoint: format!("/api/music/{}", category),
                reason: "unavailable".to_string(),
            });
        }
        Ok(self.tracks.lock().unwrap().clone())
    }
}

// ============================================================================
// Realtime transport
// ============================================================================

/// Test-side end of one fake connection
#[derive(Clone)]
pub struct FakeRemote {
    pub url: String,
    inbound: Arc<Mutex<Option<mpsc::UnboundedSender<TransportFrame>>>>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

impl FakeRemote {
    /// Deliver a text frame as if the server pushed it
    pub fn push_text(&self, payload: &str) {
        if let Some(tx) = self.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(TransportFrame::Text(payload.to_string()));
        }
    }

    pub fn push_binary(&self, bytes: Vec<u8>) {
        if let Some(tx) = self.inbound.lock().unwrap().as_ref() {
            let _ = tx.send(TransportFrame::Binary(bytes));
        }
    }

    /// Close from the server side
    pub fn close_from_peer(&self) {
        self.inbound.lock().unwrap().take();
    }

    /// Raw JSON payloads the client sent
    pub fn sent(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }

    /// Names of the commands the client sent
    pub fn commands(&self) -> Vec<String> {
        self.sent()
            .iter()
            .filter_map(|payload| {
                let value: serde_json::Value = serde_json::from_str(payload).ok()?;
                value["command"].as_str().map(str::to_string)
            })
            .collect()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

struct FakeConnection {
    inbound: mpsc::UnboundedReceiver<TransportFrame>,
    sent: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicBool>,
}

#[async_trait::async_trait]
impl RealtimeConnection for FakeConnection {
    async fn send(&mut self, payload: String) -> Result<(), ChannelError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(ChannelError::Closed);
        }
        self.sent.lock().unwrap().push(payload);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<TransportFrame, ChannelError>> {
        self.inbound.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Default)]
pub struct FakeTransport {
    pub fail_connect: AtomicBool,
    remotes: Mutex<Vec<FakeRemote>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn remotes(&self) -> Vec<FakeRemote> {
        self.remotes.lock().unwrap().clone()
    }

    pub fn last_remote(&self) -> FakeRemote {
        self.remotes
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no connection was opened")
    }
}

#[async_trait::async_trait]
impl RealtimeTransport for FakeTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeConnection>, ChannelError> {
        if self.fail_connect.load(Ordering::SeqCst) {
            return Err(ChannelError::Connect(format!("refused: {}", url)));
        }
        let (tx, rx) = mpsc::unbounded_channel();
        let sent = Arc::new(Mutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));

        self.remotes.lock().unwrap().push(FakeRemote {
            url: url.to_string(),
            inbound: Arc::new(Mutex::new(Some(tx))),
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        });

        Ok(Box::new(FakeConnection {
            inbound: rx,
            sent,
            closed,
        }))
    }
}

// ============================================================================
// Speech capture
// ============================================================================

/// Shared control over the scripted speech source
#[derive(Clone, Default)]
pub struct SpeechScript {
    tx: Arc<Mutex<Option<mpsc::Sender<SpeechFragment>>>>,
    pub fail_start: Arc<AtomicBool>,
    pub starts: Arc<AtomicUsize>,
    pub stops: Arc<AtomicUsize>,
}

impl SpeechScript {
    /// Queue a fragment for the orchestrator; false when capture is not running
    pub fn say(&self, fragment: SpeechFragment) -> bool {
        match self.tx.lock().unwrap().as_ref() {
            Some(tx) => tx.try_send(fragment).is_ok(),
            None => false,
        }
    }

    /// Speak one complete utterance
    pub fn utter(&self, text: &str) -> bool {
        self.say(SpeechFragment::finalized(text))
    }

    pub fn is_capturing(&self) -> bool {
        self.tx.lock().unwrap().is_some()
    }

    /// End the recognizer stream as if the input device went away
    pub fn hang_up(&self) {
        self.tx.lock().unwrap().take();
    }
}

pub struct ScriptedSpeech {
    script: SpeechScript,
}

impl ScriptedSpeech {
    pub fn new() -> (Self, SpeechScript) {
        let script = SpeechScript::default();
        (
            Self {
                script: script.clone(),
            },
            script,
        )
    }
}

#[async_trait::async_trait]
impl SpeechSource for ScriptedSpeech {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechFragment>, SpeechError> {
        if self.script.fail_start.load(Ordering::SeqCst) {
            return Err(SpeechError::Capture("microphone permission denied".to_string()));
        }
        let (tx, rx) = mpsc::channel(64);
        *self.script.tx.lock().unwrap() = Some(tx);
        self.script.starts.fetch_add(1, Ordering::SeqCst);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), SpeechError> {
        self.script.tx.lock().unwrap().take();
        self.script.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.script.is_capturing()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Playback and policy
// ============================================================================

/// Sink that records what it played; clips finish instantly unless `delay` is set
#[derive(Default)]
pub struct RecordingSink {
    pub played: Mutex<Vec<u64>>,
    pub delay: Mutex<Duration>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn played_count(&self) -> usize {
        self.played.lock().unwrap().len()
    }
}

#[async_trait::async_trait]
impl PlaybackSink for RecordingSink {
    async fn play(&self, clip: Arc<DecodedClip>) -> Result<(), SpeechError> {
        self.played.lock().unwrap().push(clip.id);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Dice with a fixed answer
pub struct FixedDice(pub bool);

impl SuggestionDice for FixedDice {
    fn roll(&mut self, _probability: f64) -> bool {
        self.0
    }
}

// ============================================================================
// Harness
// ============================================================================

pub struct Harness {
    pub orchestrator: Orchestrator,
    pub service: Arc<FakeService>,
    pub transport: Arc<FakeTransport>,
    pub speech: SpeechScript,
    pub sink: Arc<RecordingSink>,
}

/// Orchestrator wired to fakes; `suggest` fixes the residual dice
pub fn harness(suggest: bool) -> Harness {
    harness_with(suggest, SessionConfig::default())
}

pub fn harness_with(suggest: bool, config: SessionConfig) -> Harness {
    build(
        ResponsePolicy::heuristic(Box::new(FixedDice(suggest))),
        config,
    )
}

pub fn harness_with_policy(policy: ResponsePolicy) -> Harness {
    build(policy, SessionConfig::default())
}

fn build(policy: ResponsePolicy, config: SessionConfig) -> Harness {
    let service = FakeService::new();
    let transport = FakeTransport::new();
    let (speech_source, speech) = ScriptedSpeech::new();
    let sink = RecordingSink::new();

    let deps = OrchestratorDeps {
        service: service.clone(),
        transport: transport.clone(),
        speech: Box::new(speech_source),
        sink: sink.clone(),
        policy,
    };

    Harness {
        orchestrator: Orchestrator::new(deps, config),
        service,
        transport,
        speech,
        sink,
    }
}

impl Harness {
    /// Walk the setup screens and start a session of `minutes`
    pub async fn start(&mut self, minutes: u32) {
        self.orchestrator.confirm_persona().unwrap();
        let delta = minutes as i32 - self.orchestrator.duration_minutes() as i32;
        self.orchestrator.adjust_duration(delta).unwrap();
        self.orchestrator.start_session().await.unwrap();
        self.orchestrator.process_ready().await;
    }

    /// Advance paused time one second at a time, ticking after each step
    pub async fn run_seconds(&mut self, seconds: u64) {
        for _ in 0..seconds {
            tokio::time::advance(std::time::Duration::from_secs(1)).await;
            self.orchestrator.tick().await;
        }
        self.orchestrator.process_ready().await;
    }
}

// ============================================================================
// Spawned orchestrator
// ============================================================================

/// An orchestrator running its own loop, driven through the handle
pub struct Running {
    pub handle: OrchestratorHandle,
    pub task: JoinHandle<()>,
    pub service: Arc<FakeService>,
    pub transport: Arc<FakeTransport>,
    pub speech: SpeechScript,
    pub sink: Arc<RecordingSink>,
}

impl Harness {
    pub fn spawn(self) -> Running {
        let (handle, task) = self.orchestrator.spawn();
        Running {
            handle,
            task,
            service: self.service,
            transport: self.transport,
            speech: self.speech,
            sink: self.sink,
        }
    }
}

impl Running {
    /// Walk the setup screens through the handle and start a session of `minutes`
    pub async fn start(&self, minutes: u32) -> SessionSnapshot {
        let snapshot = self.handle.execute(Command::ConfirmPersona).await.unwrap();
        let delta_minutes = minutes as i32 - snapshot.duration_minutes as i32;
        self.handle
            .execute(Command::AdjustDuration { delta_minutes })
            .await
            .unwrap();
        self.handle.execute(Command::StartSession).await.unwrap()
    }
}
