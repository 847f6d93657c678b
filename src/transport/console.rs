//! Console sink - logs heading messages instead of sending them
//!
//! Used for dry runs and for checking emitted messages in tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tracing::info;

use super::HeadingSink;

/// How many recent messages are kept for inspection
const HISTORY_LIMIT: usize = 256;

/// Sink that logs every message and remembers the most recent ones
pub struct ConsoleSink {
    name: String,
    history: Mutex<VecDeque<(String, String)>>,
    sent_count: AtomicU64,
}

impl ConsoleSink {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            history: Mutex::new(VecDeque::with_capacity(HISTORY_LIMIT)),
            sent_count: AtomicU64::new(0),
        }
    }

    /// Recent `(message, destination)` pairs, oldest first
    pub fn sent(&self) -> Vec<(String, String)> {
        self.history.lock().iter().cloned().collect()
    }

    /// Recent messages only, oldest first
    pub fn messages(&self) -> Vec<String> {
        self.history.lock().iter().map(|(m, _)| m.clone()).collect()
    }

    /// Total messages accepted since creation
    pub fn sent_count(&self) -> u64 {
        self.sent_count.load(Ordering::Relaxed)
    }

    pub fn clear(&self) {
        self.history.lock().clear();
    }
}

impl HeadingSink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn send(&self, message: &str, destination: &str) {
        let count = self.sent_count.fetch_add(1, Ordering::Relaxed) + 1;

        info!(
            "📤 [{}] {} → {} [#{}]",
            chrono::Local::now().format("%H:%M:%S%.3f"),
            message,
            destination,
            count
        );

        let mut history = self.history.lock();
        if history.len() == HISTORY_LIMIT {
            history.pop_front();
        }
        history.push_back((message.to_string(), destination.to_string()));
    }
}
