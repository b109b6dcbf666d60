use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::SpeechError;

/// One raw result from the speech recognizer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeechFragment {
    /// Recognized text (interim results carry the hypothesis so far)
    pub text: String,
    /// Whether the recognizer finalized this utterance
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

impl SpeechFragment {
    pub fn interim(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: false,
        }
    }

    pub fn finalized(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_final: true,
        }
    }
}

/// Continuous speech capture
///
/// Implementations:
/// - `PushSpeechSource`: an external recognizer pushes fragments through a `SpeechFeed`
/// - `LineSpeechSource`: every input line (stdin by default) is a finalized utterance
#[async_trait::async_trait]
pub trait SpeechSource: Send + Sync {
    /// Start capturing
    ///
    /// Returns a channel receiver that will receive recognizer fragments
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechFragment>, SpeechError>;

    /// Stop capturing
    async fn stop(&mut self) -> Result<(), SpeechError>;

    /// Check if the source is currently capturing
    fn is_capturing(&self) -> bool;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Cloneable handle used by an external recognizer to push fragments
#[derive(Clone, Default)]
pub struct SpeechFeed {
    tx: Arc<Mutex<Option<mpsc::Sender<SpeechFragment>>>>,
}

impl SpeechFeed {
    /// Push a fragment. Returns false when no capture is running.
    pub async fn push(&self, fragment: SpeechFragment) -> bool {
        let tx = self.tx.lock().await.clone();
        match tx {
            Some(tx) => tx.send(fragment).await.is_ok(),
            None => false,
        }
    }
}

/// Speech source fed from outside the process
pub struct PushSpeechSource {
    feed: SpeechFeed,
    capturing: bool,
}

impl PushSpeechSource {
    pub fn new() -> Self {
        Self {
            feed: SpeechFeed::default(),
            capturing: false,
        }
    }

    pub fn feed(&self) -> SpeechFeed {
        self.feed.clone()
    }
}

impl Default for PushSpeechSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechSource for PushSpeechSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechFragment>, SpeechError> {
        let (tx, rx) = mpsc::channel(64);
        *self.feed.tx.lock().await = Some(tx);
        self.capturing = true;
        info!("Push speech source started");
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), SpeechError> {
        self.feed.tx.lock().await.take();
        self.capturing = false;
        info!("Push speech source stopped");
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.capturing
    }

    fn name(&self) -> &str {
        "push"
    }
}

type LineReader = Box<dyn AsyncRead + Send + Unpin>;

/// Reads finalized utterances line by line, from stdin unless told otherwise
pub struct LineSpeechSource {
    open: Box<dyn Fn() -> LineReader + Send + Sync>,
    name: &'static str,
    /// Flag of the current reader task; cleared by the task when its input ends
    running: Arc<AtomicBool>,
    reader_task: Option<JoinHandle<()>>,
}

impl LineSpeechSource {
    pub fn new() -> Self {
        Self::with_reader("stdin", tokio::io::stdin)
    }

    /// Read lines from whatever `open` returns, called once per capture
    pub fn with_reader<F, R>(name: &'static str, open: F) -> Self
    where
        F: Fn() -> R + Send + Sync + 'static,
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            open: Box::new(move || Box::new(open()) as LineReader),
            name,
            running: Arc::new(AtomicBool::new(false)),
            reader_task: None,
        }
    }
}

impl Default for LineSpeechSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SpeechSource for LineSpeechSource {
    async fn start(&mut self) -> Result<mpsc::Receiver<SpeechFragment>, SpeechError> {
        if self.running.load(Ordering::SeqCst) {
            return Err(SpeechError::Capture(format!(
                "{} capture already running",
                self.name
            )));
        }

        let (tx, rx) = mpsc::channel(64);
        let running = Arc::new(AtomicBool::new(true));
        self.running = Arc::clone(&running);
        let reader = (self.open)();
        let name = self.name;

        let task = tokio::spawn(async move {
            let mut lines = BufReader::new(reader).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if !running.load(Ordering::SeqCst) {
                            break;
                        }
                        if tx.send(SpeechFragment::finalized(line)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        info!("End of {} input", name);
                        break;
                    }
                    Err(e) => {
                        warn!("Failed to read {}: {}", name, e);
                        break;
                    }
                }
            }
            running.store(false, Ordering::SeqCst);
        });

        if let Some(old) = self.reader_task.replace(task) {
            old.abort();
        }
        info!("Reading utterances from {}", self.name);
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), SpeechError> {
        self.running.store(false, Ordering::SeqCst);
        if let Some(task) = self.reader_task.take() {
            task.abort();
        }
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn name(&self) -> &str {
        self.name
    }
}
