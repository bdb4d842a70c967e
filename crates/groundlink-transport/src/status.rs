use std::fmt::Display;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use tracing::{info, warn};

/// Lines buffered before new status lines are discarded.
pub const STATUS_CAPACITY: usize = 64;

/// Log target of the events that mirror status lines.
pub const STATUS_TARGET: &str = "groundlink::status";

/// Operator-facing diagnostic stream.
///
/// The only buffered channel in the system. Reporting never blocks: when the
/// buffer is full or nobody listens, the line still reaches the log.
#[derive(Debug, Clone)]
pub struct StatusSink {
    tx: Sender<String>,
}

/// Create a status sink and the receiver the operator reads.
pub fn status_channel() -> (StatusSink, Receiver<String>) {
    let (tx, rx) = bounded(STATUS_CAPACITY);
    (StatusSink { tx }, rx)
}

impl StatusSink {
    /// Report a state change.
    pub fn report(&self, line: impl Into<String>) {
        let line = line.into();
        info!(target: STATUS_TARGET, status = %line, "status");
        self.offer(line);
    }

    /// Report a per-item failure.
    pub fn error(&self, context: &str, err: &dyn Display) {
        let line = format!("{context}: {err}");
        warn!(target: STATUS_TARGET, status = %line, "status");
        self.offer(line);
    }

    fn offer(&self, line: String) {
        if let Err(TrySendError::Full(line)) = self.tx.try_send(line) {
            tracing::debug!(%line, "status buffer full, line dropped");
        }
    }
}
