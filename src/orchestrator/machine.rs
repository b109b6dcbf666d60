use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::events::{Deferred, DeferredAction, Event, JobOutcome};
use super::handle::Request;
use super::state::Screen;
use crate::catalog::{Direction, MeditationSound, Persona, PersonaCatalog, SoundCatalog};
use crate::channel::{ChannelAdapter, ChannelNotice, InboundEvent, OutboundCommand, RealtimeTransport};
use crate::error::{ChannelError, OrchestratorError, SpeechError};
use crate::playback::{DecodedClip, Enqueued, PlaybackQueue, PlaybackSink};
use crate::policy::{PolicyContext, ResponsePolicy};
use crate::service::{SessionService, Track};
use crate::session::{
    clamp_minutes, MessageKind, MessageLog, Role, Session, SessionConfig, SessionSnapshot,
    SessionStatus, SpeechState,
};
use crate::timer::{SessionTimer, TimerFire};
use crate::transcript::{SpeechFragment, SpeechSource, TranscriptSegmenter, Turn};

/// Shown in place of a reply when reply generation fails
const REPLY_FALLBACK: &str =
    "Let's take a moment to breathe together. Inhale deeply... and exhale slowly.";

/// Shown when the realtime channel drops during a session
const CHANNEL_LOST_NOTICE: &str =
    "The connection to the session service was lost. Live guidance is paused; start a new session to reconnect.";

/// Collaborators the orchestrator drives
pub struct OrchestratorDeps {
    pub service: Arc<dyn SessionService>,
    pub transport: Arc<dyn RealtimeTransport>,
    pub speech: Box<dyn SpeechSource>,
    pub sink: Arc<dyn PlaybackSink>,
    pub policy: ResponsePolicy,
}

/// Running speech capture: the recognizer stream and its segmenter
struct Capture {
    rx: mpsc::Receiver<SpeechFragment>,
    segmenter: TranscriptSegmenter,
}

pub struct Orchestrator {
    config: SessionConfig,
    personas: PersonaCatalog,
    sounds: SoundCatalog,

    service: Arc<dyn SessionService>,
    transport: Arc<dyn RealtimeTransport>,
    speech: Box<dyn SpeechSource>,
    sink: Arc<dyn PlaybackSink>,
    policy: ResponsePolicy,

    screen: Screen,
    persona_index: usize,
    duration_minutes: u32,
    selected_sound: Option<MeditationSound>,
    tracks: Vec<Track>,

    session: Option<Session>,
    messages: MessageLog,
    user_turns: usize,

    timer: SessionTimer,
    /// Set when the countdown is armed; the run loop restarts its ticker from that instant
    realign_tick: bool,
    playback: PlaybackQueue,
    channel: Option<ChannelAdapter>,
    capture: Option<Capture>,

    /// Session epoch; bumped on start and on reset
    generation: u64,
    deferred: Vec<Deferred>,
    jobs: FuturesUnordered<BoxFuture<'static, JobOutcome>>,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
}

impl Orchestrator {
    pub fn new(deps: OrchestratorDeps, config: SessionConfig) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let duration_minutes = clamp_minutes(config.default_minutes as i64);

        Self {
            config,
            personas: PersonaCatalog::default(),
            sounds: SoundCatalog::default(),
            service: deps.service,
            transport: deps.transport,
            speech: deps.speech,
            sink: deps.sink,
            policy: deps.policy,
            screen: Screen::VoiceSelection,
            persona_index: 0,
            duration_minutes,
            selected_sound: None,
            tracks: Vec::new(),
            session: None,
            messages: MessageLog::new(),
            user_turns: 0,
            timer: SessionTimer::new(),
            realign_tick: false,
            playback: PlaybackQueue::new(),
            channel: None,
            capture: None,
            generation: 0,
            deferred: Vec::new(),
            jobs: FuturesUnordered::new(),
            events_tx,
            events_rx,
        }
    }

    /// Replace the built-in catalogs
    pub fn with_catalogs(mut self, personas: PersonaCatalog, sounds: SoundCatalog) -> Self {
        self.personas = personas;
        self.sounds = sounds;
        self
    }

    // ------------------------------------------------------------------------
    // Read access
    // ------------------------------------------------------------------------

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn persona_index(&self) -> usize {
        self.persona_index
    }

    pub fn persona(&self) -> &Persona {
        self.personas.get(self.persona_index)
    }

    pub fn personas(&self) -> &PersonaCatalog {
        &self.personas
    }

    pub fn sounds(&self) -> &SoundCatalog {
        &self.sounds
    }

    pub fn duration_minutes(&self) -> u32 {
        self.duration_minutes
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        self.session
            .as_ref()
            .map(|s| s.status)
            .unwrap_or(SessionStatus::Inactive)
    }

    pub fn messages(&self) -> &MessageLog {
        &self.messages
    }

    pub fn timer(&self) -> &SessionTimer {
        &self.timer
    }

    pub fn playback(&self) -> &PlaybackQueue {
        &self.playback
    }

    pub fn selected_sound(&self) -> Option<&MeditationSound> {
        self.selected_sound.as_ref()
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn channel_open(&self) -> bool {
        self.channel.as_ref().map(|c| c.is_open()).unwrap_or(false)
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            screen: self.screen,
            status: self.status(),
            persona_index: self.persona_index,
            persona: self.persona().clone(),
            duration_minutes: self.duration_minutes,
            session: self.session.clone(),
            messages: self.messages.to_vec(),
            selected_sound: self.selected_sound.clone(),
            tracks: self.tracks.clone(),
            playing: self.playback.is_playing(),
        }
    }

    fn session_active(&self) -> bool {
        self.session.as_ref().map(|s| s.is_active()).unwrap_or(false)
    }

    fn require(&self, allowed: &[Screen], operation: &'static str) -> Result<(), OrchestratorError> {
        if allowed.contains(&self.screen) {
            Ok(())
        } else {
            Err(OrchestratorError::InvalidTransition {
                operation,
                screen: self.screen,
            })
        }
    }

    fn require_active(&self) -> Result<(), OrchestratorError> {
        if self.session_active() {
            Ok(())
        } else {
            Err(OrchestratorError::SessionNotActive)
        }
    }

    // ------------------------------------------------------------------------
    // Presentation-layer operations
    // ------------------------------------------------------------------------

    /// Move the persona carousel one step and speak the persona's introduction
    pub fn select_persona(&mut self, direction: Direction) -> Result<Persona, OrchestratorError> {
        self.require(&[Screen::VoiceSelection], "select_persona")?;

        self.persona_index = self.personas.step(self.persona_index, direction);
        let persona = self.persona().clone();
        info!("Persona {} selected: {}", self.persona_index, persona.name);

        let introduction = self.policy.introduction(&persona);
        self.request_speech(None, introduction);

        Ok(persona)
    }

    pub fn confirm_persona(&mut self) -> Result<(), OrchestratorError> {
        self.require(&[Screen::VoiceSelection], "confirm_persona")?;
        self.screen = Screen::TimerSetup;
        info!("Persona confirmed: {}", self.persona().id);
        Ok(())
    }

    /// Change the configured duration, clamped to the allowed range
    pub fn adjust_duration(&mut self, delta_minutes: i32) -> Result<u32, OrchestratorError> {
        self.require(&[Screen::TimerSetup], "adjust_duration")?;
        self.duration_minutes = clamp_minutes(self.duration_minutes as i64 + delta_minutes as i64);
        debug!("Duration set to {} minutes", self.duration_minutes);
        Ok(self.duration_minutes)
    }

    /// Create the session, open the channel, arm the countdown, start capture and greet
    pub async fn start_session(&mut self) -> Result<(), OrchestratorError> {
        self.require(&[Screen::TimerSetup], "start_session")?;

        let persona = self.persona().clone();
        let minutes = self.duration_minutes;
        self.messages.clear();

        info!("Starting {}-minute session with {}", minutes, persona.name);

        let created = match self.service.create_session(&persona, minutes).await {
            Ok(created) => created,
            Err(e) => {
                error!("Failed to create session: {}", e);
                self.messages.append(
                    Role::System,
                    MessageKind::Error,
                    format!("Could not start the session: {}", e),
                );
                return Err(e.into());
            }
        };

        self.generation += 1;
        let generation = self.generation;
        let events = self.events_tx.clone();

        let channel = match ChannelAdapter::open(
            self.transport.as_ref(),
            &self.config.base_url,
            &created.id,
            move |notice| {
                let _ = events.send(Event::Channel { generation, notice });
            },
        )
        .await
        {
            Ok(channel) => channel,
            Err(e) => {
                error!("Failed to open realtime channel: {}", e);
                self.messages.append(
                    Role::System,
                    MessageKind::Error,
                    format!("Could not connect to the session: {}", e),
                );
                return Err(e.into());
            }
        };

        let rx = match self.speech.start().await {
            Ok(rx) => rx,
            Err(e) => {
                error!("Failed to start speech capture ({}): {}", self.speech.name(), e);
                // Dropping the adapter closes the channel
                drop(channel);
                self.messages.append(
                    Role::System,
                    MessageKind::Error,
                    format!("Could not start listening: {}", e),
                );
                return Err(e.into());
            }
        };

        let session = Session::new(created.id, persona.id.clone(), minutes);
        self.timer.arm_countdown(session.remaining_seconds);
        self.realign_tick = true;
        self.channel = Some(channel);
        self.capture = Some(Capture {
            rx,
            segmenter: TranscriptSegmenter::new(),
        });
        info!("Session {} active (generation {})", session.id, generation);
        self.session = Some(session);
        self.user_turns = 0;
        self.screen = Screen::ActiveSession;

        let greeting = self.policy.greeting(&persona, minutes);
        self.say(MessageKind::Greeting, greeting);

        Ok(())
    }

    pub fn open_meditation_menu(&mut self) -> Result<(), OrchestratorError> {
        self.require(&[Screen::ActiveSession], "open_meditation_menu")?;
        self.require_active()?;
        self.cancel_deferred(DeferredAction::OpenMeditationMenu);
        self.screen = Screen::MeditationSelection;
        Ok(())
    }

    pub fn skip_meditation(&mut self) -> Result<(), OrchestratorError> {
        self.require(&[Screen::MeditationSelection], "skip_meditation")?;
        self.require_active()?;
        self.cancel_deferred(DeferredAction::OpenMeditationMenu);
        self.screen = Screen::ActiveSession;
        Ok(())
    }

    /// Enter the meditation with the given sound
    pub fn select_sound(&mut self, sound_id: &str) -> Result<MeditationSound, OrchestratorError> {
        self.require(&[Screen::MeditationSelection], "select_sound")?;
        self.require_active()?;

        let sound = self
            .sounds
            .find(sound_id)
            .cloned()
            .ok_or_else(|| OrchestratorError::UnknownSound(sound_id.to_string()))?;

        self.screen = Screen::MeditationActive;
        self.selected_sound = Some(sound.clone());
        self.tracks.clear();
        self.request_tracks(&sound);

        let intro = self.policy.meditation_intro(&sound);
        self.say(MessageKind::Transition, intro);

        self.timer
            .arm_check_in(self.config.check_in_interval, Instant::now());

        info!("Meditation started with {}", sound.name);
        Ok(sound)
    }

    pub fn return_to_session(&mut self) -> Result<(), OrchestratorError> {
        self.require(&[Screen::MeditationActive], "return_to_session")?;
        self.require_active()?;

        self.timer.disarm_check_in();
        self.selected_sound = None;
        self.tracks.clear();
        self.screen = Screen::ActiveSession;

        let text = self.policy.meditation_return();
        self.say(MessageKind::Transition, text);
        Ok(())
    }

    /// Ask the server to lead a breathing exercise
    pub fn begin_breathing(&mut self) -> Result<(), OrchestratorError> {
        self.send_command(OutboundCommand::BeginBreathing, "begin_breathing")
    }

    /// Ask the server for a check-in
    pub fn request_check_in(&mut self) -> Result<(), OrchestratorError> {
        self.send_command(OutboundCommand::CheckIn, "request_check_in")
    }

    fn send_command(
        &mut self,
        command: OutboundCommand,
        operation: &'static str,
    ) -> Result<(), OrchestratorError> {
        self.require(&[Screen::ActiveSession, Screen::MeditationActive], operation)?;
        self.require_active()?;

        let channel = self.channel.as_ref().ok_or(ChannelError::Closed)?;
        channel.send(command)?;
        Ok(())
    }

    /// End the running session. The reset to persona selection follows after the settle delay.
    pub async fn end_session(&mut self) -> Result<(), OrchestratorError> {
        self.require(
            &[
                Screen::ActiveSession,
                Screen::MeditationSelection,
                Screen::MeditationActive,
            ],
            "end_session",
        )?;
        self.require_active()?;
        self.finish_session().await;
        Ok(())
    }

    async fn finish_session(&mut self) {
        // Synchronous teardown first: nothing owned by this session may fire after this block
        self.timer.disarm_all();
        self.deferred.clear();
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.send(OutboundCommand::EndSession) {
                debug!("Could not send end_session: {}", e);
            }
            channel.close();
        }
        let capturing = self.capture.take().is_some();

        if let Some(session) = &mut self.session {
            session.status = SessionStatus::Ended;
            info!("Session {} ended", session.id);
        }

        let closing = self.policy.closing();
        self.say(MessageKind::Closing, closing);
        self.defer(self.config.settle_delay, DeferredAction::Reset);

        if capturing {
            if let Err(e) = self.speech.stop().await {
                warn!("Failed to stop speech capture: {}", e);
            }
        }
    }

    /// Drop all session-scoped state and return to persona selection
    fn reset(&mut self) {
        self.timer.disarm_all();
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        self.capture = None;
        if let Some(clip) = self.playback.clear_pending() {
            debug!("Dropping pending clip {} from the ended session", clip.id);
        }
        self.session = None;
        self.messages.clear();
        self.user_turns = 0;
        self.persona_index = 0;
        self.duration_minutes = clamp_minutes(self.config.default_minutes as i64);
        self.selected_sound = None;
        self.tracks.clear();
        self.deferred.clear();
        self.generation += 1;
        self.screen = Screen::VoiceSelection;
        info!("Session state reset (generation {})", self.generation);
    }

    // ------------------------------------------------------------------------
    // Timers and deferred actions
    // ------------------------------------------------------------------------

    /// One background tick at the current time
    pub async fn tick(&mut self) {
        self.on_tick(Instant::now()).await;
    }

    async fn on_tick(&mut self, now: Instant) {
        match self.timer.tick(now) {
            Some(TimerFire::CountdownExpired) => {
                if let Some(session) = &mut self.session {
                    session.remaining_seconds = 0;
                }
                if self.session_active() {
                    info!("Session time is up");
                    self.finish_session().await;
                }
            }
            Some(TimerFire::CheckInDue) => self.on_check_in(),
            None => {}
        }

        if let (Some(session), Some(remaining)) = (&mut self.session, self.timer.remaining_seconds()) {
            session.remaining_seconds = remaining;
        }

        self.run_deferred(now);
    }

    fn on_check_in(&mut self) {
        if self.screen != Screen::MeditationActive || !self.session_active() {
            debug!("Check-in outside meditation ignored");
            return;
        }
        let prompt = self.policy.check_in_prompt();
        self.say(MessageKind::CheckIn, prompt);
    }

    fn defer(&mut self, delay: Duration, action: DeferredAction) {
        self.deferred.push(Deferred {
            due: Instant::now() + delay,
            generation: self.generation,
            action,
        });
    }

    fn cancel_deferred(&mut self, action: DeferredAction) {
        self.deferred.retain(|d| d.action != action);
    }

    /// Schedule the meditation menu, replacing any suggestion still waiting
    fn suggest_meditation(&mut self) {
        self.cancel_deferred(DeferredAction::OpenMeditationMenu);
        self.defer(self.config.suggestion_delay, DeferredAction::OpenMeditationMenu);
    }

    /// Earliest deadline among deferred actions
    pub fn next_deferred_due(&self) -> Option<Instant> {
        self.deferred.iter().map(|d| d.due).min()
    }

    /// Run deferred actions that are due at `now`
    pub fn run_deferred(&mut self, now: Instant) {
        if self.deferred.is_empty() {
            return;
        }

        let (mut due, pending): (Vec<Deferred>, Vec<Deferred>) =
            self.deferred.drain(..).partition(|d| d.due <= now);
        self.deferred = pending;
        due.sort_by_key(|d| d.due);

        for deferred in due {
            if deferred.generation != self.generation {
                debug!("Dropping stale deferred {:?}", deferred.action);
                continue;
            }
            match deferred.action {
                DeferredAction::OpenMeditationMenu => {
                    if self.screen == Screen::ActiveSession && self.session_active() {
                        info!("Opening meditation menu after suggestion");
                        self.screen = Screen::MeditationSelection;
                    }
                }
                DeferredAction::Reset => self.reset(),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Speech, turns and channel events
    // ------------------------------------------------------------------------

    /// Append a therapist message and request its speech
    fn say(&mut self, kind: MessageKind, text: String) -> Uuid {
        let id = self.messages.append(Role::Therapist, kind, text.clone());
        self.request_speech(Some(id), text);
        id
    }

    /// Start one synthesis job for `text` in the current persona's voice
    fn request_speech(&mut self, message_id: Option<Uuid>, text: String) {
        if let Some(id) = message_id {
            self.messages.set_speech(id, SpeechState::Pending);
        }

        let service = Arc::clone(&self.service);
        let persona = self.persona().clone();
        let generation = self.generation;

        self.jobs.push(
            async move {
                let result = match service.synthesize_speech(&text, &persona).await {
                    Ok(bytes) => DecodedClip::decode(&bytes, message_id),
                    Err(e) => Err(SpeechError::Synthesis(e)),
                };
                JobOutcome::Speech {
                    generation,
                    message_id,
                    result,
                }
            }
            .boxed(),
        );
    }

    fn request_tracks(&mut self, sound: &MeditationSound) {
        let service = Arc::clone(&self.service);
        let generation = self.generation;
        let sound_id = sound.id.clone();
        let category = sound.category.clone();

        self.jobs.push(
            async move {
                let result = service.list_tracks(&category).await;
                JobOutcome::Tracks {
                    generation,
                    sound_id,
                    result,
                }
            }
            .boxed(),
        );
    }

    fn enqueue_clip(&mut self, clip: DecodedClip) {
        match self.playback.enqueue(clip) {
            Enqueued::Start(clip) => self.start_playback(clip),
            Enqueued::Pending { superseded } => {
                if let Some(message_id) = superseded.and_then(|c| c.message_id) {
                    self.messages.set_speech(message_id, SpeechState::TextOnly);
                }
            }
        }
    }

    fn start_playback(&mut self, clip: Arc<DecodedClip>) {
        let sink = Arc::clone(&self.sink);
        let generation = self.generation;
        self.jobs.push(
            async move {
                let result = sink.play(Arc::clone(&clip)).await;
                JobOutcome::Playback {
                    generation,
                    clip,
                    result,
                }
            }
            .boxed(),
        );
    }

    fn on_job(&mut self, outcome: JobOutcome) {
        match outcome {
            JobOutcome::Speech {
                generation,
                message_id,
                result,
            } => {
                if generation != self.generation {
                    debug!("Dropping speech from generation {}", generation);
                    return;
                }
                match result {
                    Ok(clip) => {
                        if let Some(id) = message_id {
                            self.messages.set_speech(id, SpeechState::Queued);
                        }
                        self.enqueue_clip(clip);
                    }
                    Err(e) => {
                        warn!("Speech unavailable, keeping text only: {}", e);
                        if let Some(id) = message_id {
                            self.messages.set_speech(id, SpeechState::TextOnly);
                        }
                    }
                }
            }
            JobOutcome::Tracks {
                generation,
                sound_id,
                result,
            } => {
                let current = self.selected_sound.as_ref().map(|s| s.id.as_str());
                if generation != self.generation || current != Some(sound_id.as_str()) {
                    debug!("Dropping stale track list for {}", sound_id);
                    return;
                }
                match result {
                    Ok(tracks) => self.tracks = tracks,
                    Err(e) => {
                        warn!("Track lookup for {} failed, meditating in silence: {}", sound_id, e);
                        self.tracks.clear();
                    }
                }
            }
            JobOutcome::Playback {
                generation,
                clip,
                result,
            } => {
                if let Err(e) = &result {
                    warn!("Playback of clip {} failed: {}", clip.id, e);
                }
                if generation == self.generation {
                    let state = match result {
                        Ok(()) => SpeechState::Played,
                        Err(_) => SpeechState::TextOnly,
                    };
                    if let Some(id) = clip.message_id {
                        self.messages.set_speech(id, state);
                    }
                } else {
                    debug!("Clip {} finished after generation {} ended", clip.id, generation);
                }
                // The sink is free again either way
                if let Some(next) = self.playback.finish(clip.id) {
                    self.start_playback(next);
                }
            }
        }
    }

    async fn on_fragment(&mut self, fragment: Option<SpeechFragment>) {
        let Some(capture) = self.capture.as_mut() else {
            return;
        };

        let turn = match fragment {
            Some(fragment) => capture.segmenter.push(fragment),
            None => {
                warn!("Speech capture ended ({})", self.speech.name());
                let turn = capture.segmenter.flush();
                self.capture = None;
                if let Err(e) = self.speech.stop().await {
                    warn!("Failed to stop speech capture: {}", e);
                }
                turn
            }
        };

        if let Some(turn) = turn {
            self.on_turn(turn);
        }
    }

    fn on_turn(&mut self, turn: Turn) {
        if self.screen != Screen::ActiveSession || !self.session_active() {
            debug!("Dropping turn outside active session ({})", self.screen);
            return;
        }

        self.user_turns += 1;
        self.messages.append(Role::User, MessageKind::Turn, turn.text.clone());

        let context = PolicyContext {
            persona: self.personas.get(self.persona_index),
            turn_count: self.user_turns,
            remaining_seconds: self.session.as_ref().map(|s| s.remaining_seconds),
        };

        match self.policy.respond(&turn.text, &context) {
            Ok(reply) => {
                self.say(MessageKind::Reply, reply.text);
                if reply.suggest_meditation {
                    self.suggest_meditation();
                }
            }
            Err(e) => {
                warn!("Reply generation failed: {}", e);
                self.messages
                    .append(Role::System, MessageKind::Error, REPLY_FALLBACK);
            }
        }
    }

    fn on_event(&mut self, event: Event) {
        match event {
            Event::Channel { generation, notice } => self.on_channel(generation, notice),
        }
    }

    fn on_channel(&mut self, generation: u64, notice: ChannelNotice) {
        if generation != self.generation || self.channel.is_none() || !self.session_active() {
            debug!("Discarding channel notice from generation {}", generation);
            return;
        }

        match notice {
            ChannelNotice::Event(InboundEvent::AudioClip(bytes)) => {
                match DecodedClip::decode(&bytes, None) {
                    Ok(clip) => self.enqueue_clip(clip),
                    Err(e) => warn!("Discarding pushed audio: {}", e),
                }
            }
            ChannelNotice::Event(InboundEvent::Text { text }) => {
                self.messages.append(Role::Therapist, MessageKind::Remote, text);
            }
            ChannelNotice::Event(InboundEvent::CheckInRequest { message }) => {
                let text = message.unwrap_or_else(|| self.policy.check_in_prompt());
                self.messages.append(Role::Therapist, MessageKind::CheckIn, text);
                if self.screen == Screen::MeditationActive {
                    self.timer.reset_check_in(Instant::now());
                }
            }
            ChannelNotice::Event(InboundEvent::MeditationSuggested { message }) => {
                if self.screen != Screen::ActiveSession {
                    debug!("Ignoring meditation suggestion in {}", self.screen);
                    return;
                }
                if let Some(text) = message {
                    self.messages.append(Role::Therapist, MessageKind::Remote, text);
                }
                self.suggest_meditation();
            }
            ChannelNotice::Closed { reason } => {
                warn!(
                    "Realtime channel closed unexpectedly: {}",
                    reason.as_deref().unwrap_or("peer closed")
                );
                self.channel = None;
                self.messages
                    .append(Role::System, MessageKind::Notice, CHANNEL_LOST_NOTICE);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Draining
    // ------------------------------------------------------------------------

    /// Process everything that is ready right now without waiting: recognizer
    /// fragments, channel events and finished jobs. Returns when nothing is left.
    pub async fn process_ready(&mut self) {
        loop {
            // Let background tasks (channel readers) forward what they have
            for _ in 0..4 {
                tokio::task::yield_now().await;
            }

            let mut progressed = false;

            loop {
                let fragment = match self.capture.as_mut().map(|c| c.rx.try_recv()) {
                    Some(Ok(fragment)) => Some(Some(fragment)),
                    Some(Err(TryRecvError::Disconnected)) => Some(None),
                    Some(Err(TryRecvError::Empty)) | None => None,
                };
                match fragment {
                    Some(fragment) => {
                        progressed = true;
                        self.on_fragment(fragment).await;
                    }
                    None => break,
                }
            }

            while let Ok(event) = self.events_rx.try_recv() {
                progressed = true;
                self.on_event(event);
            }

            while let Some(Some(outcome)) = self.jobs.next().now_or_never() {
                progressed = true;
                self.on_job(outcome);
            }

            if !progressed {
                break;
            }
        }
    }

    /// Drive the machine until every handle is dropped
    pub(super) async fn run(
        mut self,
        mut requests: mpsc::Receiver<Request>,
        snapshots: watch::Sender<SessionSnapshot>,
    ) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick completes immediately
        ticker.tick().await;

        info!("Orchestrator running");

        loop {
            let deferred_due = self.next_deferred_due();

            tokio::select! {
                request = requests.recv() => match request {
                    Some(Request { command, reply }) => {
                        let result = self.apply(command).await.map(|()| self.snapshot());
                        if std::mem::take(&mut self.realign_tick) {
                            // Countdown decrements land on whole seconds after the start
                            ticker.reset();
                        }
                        // Readers must observe the new state once the caller has its reply
                        snapshots.send_replace(self.snapshot());
                        let _ = reply.send(result);
                    }
                    None => break,
                },
                Some(event) = self.events_rx.recv() => self.on_event(event),
                fragment = next_fragment(&mut self.capture) => self.on_fragment(fragment).await,
                Some(outcome) = self.jobs.next(), if !self.jobs.is_empty() => self.on_job(outcome),
                _ = ticker.tick() => self.tick().await,
                _ = sleep_until_due(deferred_due) => self.run_deferred(Instant::now()),
            }

            snapshots.send_replace(self.snapshot());
        }

        self.shutdown().await;
    }

    /// Tear everything down when the loop exits
    async fn shutdown(&mut self) {
        self.timer.disarm_all();
        if let Some(mut channel) = self.channel.take() {
            channel.close();
        }
        if self.capture.take().is_some() {
            if let Err(e) = self.speech.stop().await {
                warn!("Failed to stop speech capture: {}", e);
            }
        }
        info!("Orchestrator stopped");
    }
}

/// Next recognizer fragment; pending forever while not capturing
async fn next_fragment(capture: &mut Option<Capture>) -> Option<SpeechFragment> {
    match capture {
        Some(capture) => capture.rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => tokio::time::sleep_until(due).await,
        None => std::future::pending().await,
    }
}
