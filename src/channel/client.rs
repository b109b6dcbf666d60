use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::messages::{parse_inbound, CommandEnvelope, InboundEvent, OutboundCommand};
use super::transport::{RealtimeConnection, RealtimeTransport, TransportFrame};
use crate::error::ChannelError;

/// Notification forwarded from the channel task to its owner
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelNotice {
    Event(InboundEvent),
    /// The peer closed the channel (never sent after a proactive close)
    Closed { reason: Option<String> },
}

enum AdapterCommand {
    Send(OutboundCommand),
    Close,
}

/// Derive the realtime channel URL from the service base address and session id
pub fn realtime_url(base_url: &str, session_id: &str) -> Result<String, ChannelError> {
    if session_id.trim().is_empty() {
        return Err(ChannelError::InvalidUrl("empty session id".to_string()));
    }

    let base = base_url.trim_end_matches('/');
    let ws_base = if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        return Err(ChannelError::InvalidUrl(base_url.to_string()));
    };

    Ok(format!("{}/api/meditation-session/{}", ws_base, session_id))
}

/// Keyed realtime channel for one session
///
/// A background task owns the connection. Inbound frames are decoded and
/// handed to the `notify` callback; outbound commands are queued to the task.
pub struct ChannelAdapter {
    session_id: String,
    commands: mpsc::UnboundedSender<AdapterCommand>,
    open: Arc<AtomicBool>,
    task: Option<JoinHandle<()>>,
}

impl ChannelAdapter {
    /// Connect and start forwarding inbound events
    pub async fn open<F>(
        transport: &dyn RealtimeTransport,
        base_url: &str,
        session_id: &str,
        notify: F,
    ) -> Result<Self, ChannelError>
    where
        F: Fn(ChannelNotice) + Send + Sync + 'static,
    {
        let url = realtime_url(base_url, session_id)?;
        let connection = transport.connect(&url).await?;

        let (commands, commands_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        let task = tokio::spawn(run_channel(
            connection,
            commands_rx,
            Arc::clone(&open),
            notify,
        ));

        info!("Realtime channel open for session {}", session_id);

        Ok(Self {
            session_id: session_id.to_string(),
            commands,
            open,
            task: Some(task),
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Queue an outbound command
    pub fn send(&self, command: OutboundCommand) -> Result<(), ChannelError> {
        if !self.is_open() {
            return Err(ChannelError::Closed);
        }
        self.commands
            .send(AdapterCommand::Send(command))
            .map_err(|_| ChannelError::Closed)
    }

    /// Close proactively. Takes effect immediately: nothing is forwarded after this returns.
    pub fn close(&mut self) {
        if self.open.swap(false, Ordering::SeqCst) {
            info!("Closing realtime channel for session {}", self.session_id);
        }
        // The task may already be gone after a remote close
        let _ = self.commands.send(AdapterCommand::Close);
        self.task.take();
    }
}

impl Drop for ChannelAdapter {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_channel<F>(
    mut connection: Box<dyn RealtimeConnection>,
    mut commands: mpsc::UnboundedReceiver<AdapterCommand>,
    open: Arc<AtomicBool>,
    notify: F,
) where
    F: Fn(ChannelNotice) + Send + Sync + 'static,
{
    loop {
        tokio::select! {
            command = commands.recv() => match command {
                Some(AdapterCommand::Send(command)) => {
                    let payload = match serde_json::to_string(&CommandEnvelope { command }) {
                        Ok(payload) => payload,
                        Err(e) => {
                            warn!("Failed to encode command {:?}: {}", command, e);
                            continue;
                        }
                    };
                    if let Err(e) = connection.send(payload).await {
                        warn!("Failed to send command {:?}: {}", command, e);
                    } else {
                        debug!("Sent command {:?}", command);
                    }
                }
                Some(AdapterCommand::Close) | None => {
                    if let Err(e) = connection.close().await {
                        debug!("Error while closing realtime channel: {}", e);
                    }
                    break;
                }
            },
            frame = connection.recv() => match frame {
                Some(Ok(frame)) => {
                    if !open.load(Ordering::SeqCst) {
                        debug!("Discarding inbound frame after close");
                        continue;
                    }
                    let events = match frame {
                        TransportFrame::Text(text) => parse_inbound(&text),
                        TransportFrame::Binary(bytes) => Ok(vec![InboundEvent::AudioClip(bytes)]),
                    };
                    match events {
                        Ok(events) => {
                            for event in events {
                                notify(ChannelNotice::Event(event));
                            }
                        }
                        Err(e) => warn!("Discarding inbound frame: {}", e),
                    }
                }
                Some(Err(e)) => {
                    warn!("Realtime channel failed: {}", e);
                    if open.swap(false, Ordering::SeqCst) {
                        notify(ChannelNotice::Closed { reason: Some(e.to_string()) });
                    }
                    break;
                }
                None => {
                    if open.swap(false, Ordering::SeqCst) {
                        notify(ChannelNotice::Closed { reason: None });
                    }
                    break;
                }
            },
        }
    }

    debug!("Realtime channel task stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_realtime_url_from_http_base() {
        let url = realtime_url("http://localhost:8001/", "abc").unwrap();
        assert_eq!(url, "ws://localhost:8001/api/meditation-session/abc");
    }

    #[test]
    fn test_realtime_url_from_https_base() {
        let url = realtime_url("https://calm.example.com", "s-1").unwrap();
        assert_eq!(url, "wss://calm.example.com/api/meditation-session/s-1");
    }

    #[test]
    fn test_realtime_url_rejects_bad_input() {
        assert!(realtime_url("ftp://host", "abc").is_err());
        assert!(realtime_url("http://host", " ").is_err());
    }
}
