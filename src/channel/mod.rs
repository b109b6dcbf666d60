//! Realtime channel to the session service
//!
//! One bidirectional channel is opened per session id. Inbound envelopes are
//! decoded into typed events; outbound commands are JSON `{command}` envelopes.

pub mod client;
pub mod messages;
pub mod transport;

pub use client::{realtime_url, ChannelAdapter, ChannelNotice};
pub use messages::{parse_inbound, CommandEnvelope, InboundEnvelope, InboundEvent, OutboundCommand};
pub use transport::{RealtimeConnection, RealtimeTransport, TransportFrame, WebSocketTransport};
