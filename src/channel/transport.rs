use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::info;

use crate::error::ChannelError;

/// A frame received from the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportFrame {
    Text(String),
    /// Raw audio bytes
    Binary(Vec<u8>),
}

/// Factory for realtime connections
#[async_trait::async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeConnection>, ChannelError>;
}

/// An open bidirectional connection
#[async_trait::async_trait]
pub trait RealtimeConnection: Send {
    async fn send(&mut self, payload: String) -> Result<(), ChannelError>;

    /// Next frame; `None` once the peer has closed the connection
    async fn recv(&mut self) -> Option<Result<TransportFrame, ChannelError>>;

    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// WebSocket transport
#[derive(Debug, Default, Clone)]
pub struct WebSocketTransport;

struct WebSocketConnection {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait::async_trait]
impl RealtimeTransport for WebSocketTransport {
    async fn connect(&self, url: &str) -> Result<Box<dyn RealtimeConnection>, ChannelError> {
        info!("Connecting realtime channel at {}", url);

        let (stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        info!("Realtime channel connected");

        Ok(Box::new(WebSocketConnection { stream }))
    }
}

#[async_trait::async_trait]
impl RealtimeConnection for WebSocketConnection {
    async fn send(&mut self, payload: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(payload))
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }

    async fn recv(&mut self) -> Option<Result<TransportFrame, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(TransportFrame::Text(text))),
                Ok(Message::Binary(data)) => return Some(Ok(TransportFrame::Binary(data))),
                Ok(Message::Close(_)) => return None,
                // Ping/pong are answered by tungstenite
                Ok(_) => continue,
                Err(e) => return Some(Err(ChannelError::Receive(e.to_string()))),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ChannelError::Send(e.to_string()))
    }
}
