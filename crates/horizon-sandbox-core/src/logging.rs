//! Logging and diagnostics for Horizon Sandbox.
//!
//! This module provides:
//! - Target names used by the crate's internal `tracing` instrumentation
//! - [`LogSink`], the injectable diagnostic collaborator that objects write
//!   their human-readable lifecycle lines to
//! - [`TracingSink`], the default sink that forwards to `tracing`
//! - [`MemorySink`], a sink that records lines so they can be inspected
//!
//! # Tracing Integration
//!
//! Horizon Sandbox uses the `tracing` crate for instrumentation. To see logs,
//! install a subscriber in your application:
//!
//! ```ignore
//! fn main() {
//!     tracing_subscriber::fmt()
//!         .with_max_level(tracing::Level::INFO)
//!         .init();
//! }
//! ```
//!
//! # Diagnostic Sinks
//!
//! ```
//! use horizon_sandbox_core::logging::{LogSink, MemorySink};
//!
//! let sink = MemorySink::new();
//! sink.info("Constructed");
//! assert_eq!(sink.messages(), vec!["Constructed".to_string()]);
//! ```

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::Level;

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Core framework target.
    pub const CORE: &str = "horizon_sandbox_core";
    /// Event loop target.
    pub const EVENT_LOOP: &str = "horizon_sandbox_core::event_loop";
    /// Timer system target.
    pub const TIMER: &str = "horizon_sandbox_core::timer";
    /// Signal/slot system target.
    pub const SIGNAL: &str = "horizon_sandbox_core::signal";
    /// Property system target.
    pub const PROPERTY: &str = "horizon_sandbox_core::property";
    /// Object model target.
    pub const OBJECT: &str = "horizon_sandbox_core::object";
    /// Diagnostic lines written through [`TracingSink`](super::TracingSink).
    pub const DIAGNOSTIC: &str = "horizon_sandbox::diagnostic";
}

/// A destination for human-readable diagnostic lines.
///
/// Every constructor, destructor and notable method call in the sandbox
/// writes one line through a sink. Objects receive the sink at construction
/// instead of reaching for a global console.
pub trait LogSink: Send + Sync {
    /// Write a line at the given severity.
    fn log(&self, level: Level, message: &str);

    /// Write a line at `INFO` severity.
    fn info(&self, message: &str) {
        self.log(Level::INFO, message);
    }

    /// Write a line at `WARN` severity.
    fn warn(&self, message: &str) {
        self.log(Level::WARN, message);
    }

    /// Write a line at `ERROR` severity.
    fn error(&self, message: &str) {
        self.log(Level::ERROR, message);
    }
}

/// A shared, type-erased sink handle.
pub type SharedSink = Arc<dyn LogSink>;

/// The default sink: forwards each line as a `tracing` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl TracingSink {
    /// Create a shared handle to a tracing sink.
    pub fn shared() -> SharedSink {
        Arc::new(Self)
    }
}

impl LogSink for TracingSink {
    fn log(&self, level: Level, message: &str) {
        if level == Level::ERROR {
            tracing::error!(target: targets::DIAGNOSTIC, "{message}");
        } else if level == Level::WARN {
            tracing::warn!(target: targets::DIAGNOSTIC, "{message}");
        } else if level == Level::INFO {
            tracing::info!(target: targets::DIAGNOSTIC, "{message}");
        } else if level == Level::DEBUG {
            tracing::debug!(target: targets::DIAGNOSTIC, "{message}");
        } else {
            tracing::trace!(target: targets::DIAGNOSTIC, "{message}");
        }
    }
}

/// A recorded diagnostic line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Severity of the line.
    pub level: Level,
    /// The text of the line.
    pub message: String,
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.level, self.message)
    }
}

/// A sink that keeps every line in memory, in write order.
///
/// Clones share the same buffer, so a clone can be handed to objects while
/// the original is kept for inspection.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
}

impl MemorySink {
    /// Create an empty memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a shared handle writing into this sink's buffer.
    pub fn shared(&self) -> SharedSink {
        Arc::new(self.clone())
    }

    /// All recorded lines.
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// The text of all recorded lines.
    pub fn messages(&self) -> Vec<String> {
        self.records
            .lock()
            .iter()
            .map(|r| r.message.clone())
            .collect()
    }

    /// Whether any recorded line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.records.lock().iter().any(|r| r.message.contains(needle))
    }

    /// Number of recorded lines equal to `message`.
    pub fn count(&self, message: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.message == message)
            .count()
    }

    /// Discard all recorded lines.
    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl LogSink for MemorySink {
    fn log(&self, level: Level, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            message: message.to_string(),
        });
    }
}

static_assertions::assert_impl_all!(MemorySink: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_records_in_order() {
        let sink = MemorySink::new();
        sink.info("first");
        sink.warn("second");
        sink.error("third");

        assert_eq!(sink.messages(), vec!["first", "second", "third"]);
        let levels: Vec<Level> = sink.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![Level::INFO, Level::WARN, Level::ERROR]);
    }

    #[test]
    fn test_memory_sink_shared_buffer() {
        let sink = MemorySink::new();
        let shared = sink.shared();
        shared.info("through the handle");

        assert!(sink.contains("the handle"));
        assert_eq!(sink.count("through the handle"), 1);

        sink.clear();
        assert!(sink.messages().is_empty());
    }

    #[test]
    fn test_tracing_sink_does_not_panic() {
        let sink = TracingSink::shared();
        sink.log(Level::TRACE, "trace line");
        sink.info("info line");
    }

    /// Records the target and level of every event it sees.
    struct TargetRecorder {
        events: Arc<Mutex<Vec<(String, Level)>>>,
    }

    impl tracing::Subscriber for TargetRecorder {
        fn enabled(&self, _: &tracing::Metadata<'_>) -> bool {
            true
        }

        fn new_span(&self, _: &tracing::span::Attributes<'_>) -> tracing::span::Id {
            tracing::span::Id::from_u64(1)
        }

        fn record(&self, _: &tracing::span::Id, _: &tracing::span::Record<'_>) {}

        fn record_follows_from(&self, _: &tracing::span::Id, _: &tracing::span::Id) {}

        fn event(&self, event: &tracing::Event<'_>) {
            let metadata = event.metadata();
            self.events
                .lock()
                .push((metadata.target().to_string(), *metadata.level()));
        }

        fn enter(&self, _: &tracing::span::Id) {}

        fn exit(&self, _: &tracing::span::Id) {}
    }

    #[test]
    fn test_tracing_sink_uses_diagnostic_target() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let recorder = TargetRecorder {
            events: Arc::clone(&events),
        };

        tracing::subscriber::with_default(recorder, || {
            let sink = TracingSink::shared();
            for level in [Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE] {
                sink.log(level, "line");
            }
        });

        let events = events.lock();
        assert_eq!(events.len(), 5);
        assert!(events.iter().all(|(target, _)| target == targets::DIAGNOSTIC));
        let levels: Vec<Level> = events.iter().map(|(_, level)| *level).collect();
        assert_eq!(
            levels,
            vec![Level::ERROR, Level::WARN, Level::INFO, Level::DEBUG, Level::TRACE]
        );
    }

    #[test]
    fn test_log_record_display() {
        let record = LogRecord {
            level: Level::INFO,
            message: "Test!".into(),
        };
        assert_eq!(record.to_string(), "[INFO] Test!");
    }
}
