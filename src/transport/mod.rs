//! Transport sinks for heading messages
//!
//! A sink accepts `(message, destination)` pairs and delivers them on a
//! best-effort basis. Sending never returns an error and never blocks the
//! caller: the input path must not stall on the network.

pub mod console;
pub mod udp;

use std::net::SocketAddr;
use std::sync::Arc;

use thiserror::Error;

use crate::config::{TransportConfig, TransportKind};

pub use console::ConsoleSink;
pub use udp::UdpSink;

/// Destination for formatted heading messages
///
/// `send` is fire-and-forget; implementations log their own failures.
pub trait HeadingSink: Send + Sync {
    /// Sink name for logging (e.g., "udp", "console")
    fn name(&self) -> &str;

    /// Hand off one message for `destination`
    fn send(&self, message: &str, destination: &str);

    /// Release resources; later sends are dropped
    fn shutdown(&self) {}
}

/// Internal transport failures
///
/// These are logged by the sink and never reach the caller of
/// [`HeadingSink::send`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid destination address: {0}")]
    InvalidDestination(String),

    #[error("failed to bind UDP socket: {0}")]
    Bind(#[source] std::io::Error),

    #[error("failed to send datagram to {destination}: {source}")]
    Send {
        destination: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

/// Build the sink selected by configuration
///
/// The UDP sink spawns its worker task, so this must run inside a Tokio
/// runtime.
pub fn from_config(config: &TransportConfig) -> Arc<dyn HeadingSink> {
    match config.kind {
        TransportKind::Udp => Arc::new(UdpSink::spawn(config.default_port)),
        TransportKind::Console => Arc::new(ConsoleSink::new("console")),
    }
}
