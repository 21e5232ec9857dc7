pub mod record;
pub mod sink;

pub use record::{FieldValue, LogField, LogRecord, RecordBuilder};
pub use sink::{CapturedLog, LogSink, MemorySink, REQUEST_LOG_TARGET, TracingSink};
