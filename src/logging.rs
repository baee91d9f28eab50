//! Log sink capability and the line-capturing output buffer.
//!
//! The client never decides where log lines go. It holds up to three
//! independently injectable [`LogSink`]s — debug, info, error — each a
//! single-method "emit one line" capability. Command output flows through
//! [`LogWriter`], which both accumulates every byte for later retrieval
//! and forwards completed, trimmed lines to its sink as they arrive.

use std::fmt;
use std::sync::Arc;

/// Capability to emit one log line.
///
/// The three severities a [`Client`](crate::Client) carries are three
/// independent instances of this trait, not a hierarchy. Any
/// `Fn(&str) + Send + Sync` closure qualifies.
pub trait LogSink: Send + Sync {
    fn emit(&self, line: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn emit(&self, line: &str) {
        self(line)
    }
}

/// [`LogSink`] that forwards lines to the `tracing` macros.
///
/// Convenience for host applications already running a tracing
/// subscriber; one of these per severity wires the client up completely.
pub struct TracingSink {
    level: tracing::Level,
}

impl TracingSink {
    pub fn debug() -> Self {
        Self {
            level: tracing::Level::DEBUG,
        }
    }

    pub fn info() -> Self {
        Self {
            level: tracing::Level::INFO,
        }
    }

    pub fn error() -> Self {
        Self {
            level: tracing::Level::ERROR,
        }
    }
}

impl LogSink for TracingSink {
    fn emit(&self, line: &str) {
        match self.level {
            tracing::Level::ERROR => tracing::error!("{}", line),
            tracing::Level::INFO => tracing::info!("{}", line),
            _ => tracing::debug!("{}", line),
        }
    }
}

/// Byte sink that stores everything and line-streams to a callback.
///
/// Every byte written is appended to the internal buffer whether or not a
/// sink is attached. When a sink is attached, each write is split on
/// newlines and every trimmed, non-empty segment is forwarded
/// synchronously before the write returns. Blank lines never reach the
/// sink.
pub struct LogWriter {
    buffer: Vec<u8>,
    sink: Option<Arc<dyn LogSink>>,
}

impl LogWriter {
    pub fn new(sink: Option<Arc<dyn LogSink>>) -> Self {
        Self {
            buffer: Vec::new(),
            sink,
        }
    }

    /// Append a chunk, dispatching its trimmed non-empty lines to the sink.
    pub fn write(&mut self, chunk: &[u8]) {
        if let Some(sink) = &self.sink {
            for segment in String::from_utf8_lossy(chunk).split('\n') {
                let trimmed = segment.trim();
                if !trimmed.is_empty() {
                    sink.emit(trimmed);
                }
            }
        }
        self.buffer.extend_from_slice(chunk);
    }

    /// Everything written so far, as (lossy) UTF-8 text.
    pub fn as_text(&self) -> String {
        String::from_utf8_lossy(&self.buffer).into_owned()
    }

    /// Number of bytes accumulated.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

impl fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LogWriter")
            .field("buffered_bytes", &self.buffer.len())
            .field("sink", &self.sink.as_ref().map(|_| "LogSink"))
            .finish()
    }
}
