//! Destinations for request log records.

use std::{fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::Level;

use super::record::LogRecord;

pub const REQUEST_LOG_TARGET: &str = "cinelog::request";

/// Accepts finished log records. Implementations must not block the request
/// path for long; the logger calls `emit` inline before returning the
/// response.
pub trait LogSink: Send + Sync + fmt::Debug {
    fn emit(&self, level: Level, message: &str, record: &LogRecord);
}

/// Forwards records to `tracing`, preserving the request field order.
///
/// Fields absent from the record are omitted from the event.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

macro_rules! request_event {
    ($level:expr, $message:expr, $record:expr) => {
        tracing::event!(
            target: REQUEST_LOG_TARGET,
            $level,
            status = $record.int("status"),
            duration = $record.str("duration"),
            method = $record.str("method"),
            url = $record.str("url"),
            ip = $record.str("ip"),
            forwardedFor = $record.list("forwardedFor").map(tracing::field::debug),
            userAgent = $record.str("userAgent"),
            mediaName = $record.str("mediaName"),
            "{}",
            $message
        )
    };
}

impl LogSink for TracingSink {
    fn emit(&self, level: Level, message: &str, record: &LogRecord) {
        // Callsite levels have to be constants.
        match level {
            Level::ERROR => request_event!(Level::ERROR, message, record),
            Level::WARN => request_event!(Level::WARN, message, record),
            Level::INFO => request_event!(Level::INFO, message, record),
            Level::DEBUG => request_event!(Level::DEBUG, message, record),
            _ => request_event!(Level::TRACE, message, record),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedLog {
    pub level: Level,
    pub message: String,
    pub record: LogRecord,
}

/// Keeps every record in memory. Clones share the same buffer.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    entries: Arc<Mutex<Vec<CapturedLog>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<CapturedLog> {
        self.entries.lock().clone()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.entries
            .lock()
            .iter()
            .map(|entry| entry.record.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl LogSink for MemorySink {
    fn emit(&self, level: Level, message: &str, record: &LogRecord) {
        self.entries.lock().push(CapturedLog {
            level,
            message: message.to_string(),
            record: record.clone(),
        });
    }
}
