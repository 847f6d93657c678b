//! UDP sink - connectionless, best-effort delivery of heading messages
//!
//! `send` only pushes onto an unbounded channel. A single worker task owns
//! the sockets, resolves destinations and performs the actual `send_to`, so a
//! slow or unreachable network never reaches the input path.
//!
//! The worker remembers the last resolved destination. Host names are looked
//! up once, not per datagram, and a failed lookup is retried at most once per
//! [`RETRY_INTERVAL`].

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use super::{HeadingSink, TransportError};

/// Minimum delay before a destination that failed to resolve is looked up again
pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Delivery counters shared with the worker task
#[derive(Debug, Default)]
struct Counters {
    sent: AtomicU64,
    failed: AtomicU64,
    lookups: AtomicU64,
}

/// Snapshot of delivery counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UdpStats {
    pub sent: u64,
    pub failed: u64,
    /// Destination resolutions performed
    pub lookups: u64,
}

struct Datagram {
    message: String,
    destination: String,
}

/// Fire-and-forget UDP sink
pub struct UdpSink {
    tx: Mutex<Option<mpsc::UnboundedSender<Datagram>>>,
    counters: Arc<Counters>,
}

impl UdpSink {
    /// Start the worker task
    ///
    /// # Arguments
    /// * `default_port` - Port used when a destination names only an address
    pub fn spawn(default_port: u16) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let counters = Arc::new(Counters::default());

        tokio::spawn(Self::run(rx, default_port, counters.clone()));
        debug!("UDP sink started (default port {})", default_port);

        Self {
            tx: Mutex::new(Some(tx)),
            counters,
        }
    }

    /// Current delivery counters
    pub fn stats(&self) -> UdpStats {
        UdpStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            failed: self.counters.failed.load(Ordering::Relaxed),
            lookups: self.counters.lookups.load(Ordering::Relaxed),
        }
    }

    /// Whether the worker task is still receiving
    pub fn is_alive(&self) -> bool {
        self.tx.lock().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    async fn run(
        mut rx: mpsc::UnboundedReceiver<Datagram>,
        default_port: u16,
        counters: Arc<Counters>,
    ) {
        let mut sockets = Sockets::default();
        let mut resolver = Resolver::new(default_port, counters.clone());

        while let Some(datagram) = rx.recv().await {
            match Self::deliver(&mut sockets, &mut resolver, &datagram).await {
                Ok(addr) => {
                    counters.sent.fetch_add(1, Ordering::Relaxed);
                    trace!("Sent {:?} to {}", datagram.message, addr);
                }
                Err(e) => {
                    counters.failed.fetch_add(1, Ordering::Relaxed);
                    warn!("Dropping heading message: {}", e);
                }
            }
        }

        info!("UDP sink stopped");
    }

    async fn deliver(
        sockets: &mut Sockets,
        resolver: &mut Resolver,
        datagram: &Datagram,
    ) -> Result<SocketAddr, TransportError> {
        let addr = resolver.resolve(&datagram.destination).await?;
        let socket = sockets.for_addr(addr).await?;
        socket
            .send_to(datagram.message.as_bytes(), addr)
            .await
            .map_err(|source| TransportError::Send {
                destination: addr,
                source,
            })?;
        Ok(addr)
    }
}

impl HeadingSink for UdpSink {
    fn name(&self) -> &str {
        "udp"
    }

    fn send(&self, message: &str, destination: &str) {
        let datagram = Datagram {
            message: message.to_string(),
            destination: destination.to_string(),
        };
        let delivered = match self.tx.lock().as_ref() {
            Some(tx) => tx.send(datagram).is_ok(),
            None => false,
        };
        if !delivered {
            warn!("UDP sink is closed, message dropped");
        }
    }

    /// Stop accepting messages; the worker drains what is queued and exits
    fn shutdown(&self) {
        if self.tx.lock().take().is_some() {
            debug!("UDP sink shutdown requested");
        }
    }
}

/// Outcome of the most recent lookup
struct Resolved {
    destination: String,
    addr: Option<SocketAddr>,
    at: Instant,
}

/// Single-entry destination cache
///
/// The session sends to one receiver at a time, so a changed destination
/// simply replaces the entry.
struct Resolver {
    default_port: u16,
    counters: Arc<Counters>,
    last: Option<Resolved>,
}

impl Resolver {
    fn new(default_port: u16, counters: Arc<Counters>) -> Self {
        Self {
            default_port,
            counters,
            last: None,
        }
    }

    async fn resolve(&mut self, destination: &str) -> Result<SocketAddr, TransportError> {
        if let Some(last) = self.last.as_ref().filter(|l| l.destination == destination) {
            match last.addr {
                Some(addr) => return Ok(addr),
                None if last.at.elapsed() < RETRY_INTERVAL => {
                    return Err(TransportError::InvalidDestination(destination.to_string()));
                }
                None => {}
            }
        }

        self.counters.lookups.fetch_add(1, Ordering::Relaxed);
        let result = resolve_destination(destination, self.default_port).await;
        match &result {
            Ok(addr) => debug!("Destination {} resolved to {}", destination, addr),
            Err(e) => debug!("Destination {} did not resolve: {}", destination, e),
        }

        self.last = Some(Resolved {
            destination: destination.to_string(),
            addr: result.as_ref().ok().copied(),
            at: Instant::now(),
        });
        result
    }
}

/// Lazily bound sockets, one per address family
#[derive(Default)]
struct Sockets {
    v4: Option<UdpSocket>,
    v6: Option<UdpSocket>,
}

impl Sockets {
    async fn for_addr(&mut self, addr: SocketAddr) -> Result<&UdpSocket, TransportError> {
        let (slot, bind_addr) = if addr.is_ipv4() {
            (&mut self.v4, "0.0.0.0:0")
        } else {
            (&mut self.v6, "[::]:0")
        };

        let socket = match slot.take() {
            Some(socket) => socket,
            None => {
                let socket = UdpSocket::bind(bind_addr)
                    .await
                    .map_err(TransportError::Bind)?;
                debug!("Bound UDP socket on {:?}", socket.local_addr().ok());
                socket
            }
        };

        Ok(&*slot.insert(socket))
    }
}

/// Turn a configured destination into a socket address
///
/// Accepts `ip:port`, a bare IP (paired with `default_port`), or a host name
/// with or without a port.
pub async fn resolve_destination(
    destination: &str,
    default_port: u16,
) -> Result<SocketAddr, TransportError> {
    let destination = destination.trim();

    if let Ok(addr) = destination.parse::<SocketAddr>() {
        return Ok(addr);
    }
    if let Ok(ip) = destination.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, default_port));
    }
    if destination.is_empty() {
        return Err(TransportError::InvalidDestination(destination.to_string()));
    }

    let lookup = if destination.contains(':') {
        destination.to_string()
    } else {
        format!("{}:{}", destination, default_port)
    };

    tokio::net::lookup_host(lookup)
        .await
        .ok()
        .and_then(|mut addrs| addrs.next())
        .ok_or_else(|| TransportError::InvalidDestination(destination.to_string()))
}
