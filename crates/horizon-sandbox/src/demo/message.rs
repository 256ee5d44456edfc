//! An observable message driven alongside a periodic timer.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use horizon_sandbox_core::{
    ConnectionId, LoopHandle, ObservableProperty, PeriodicTimer, SharedSink, TimerError,
};

/// Line logged on every timer tick.
pub const TIMEOUT_MESSAGE: &str = "Test!";

/// Holds an observable message and ticks a periodic timer while alive.
///
/// The timer's timeout is connected to [`MessageBoard::on_timeout`] through a
/// weak reference, so the connection never keeps the board alive.
pub struct MessageBoard {
    message: ObservableProperty<String>,
    timer: PeriodicTimer,
    ticks: AtomicUsize,
    sink: SharedSink,
}

impl MessageBoard {
    /// Create a board on `handle`'s event loop and start its timer.
    pub fn new(
        handle: &LoopHandle,
        interval: Duration,
        sink: SharedSink,
    ) -> Result<Arc<Self>, TimerError> {
        let board = Arc::new(Self {
            message: ObservableProperty::new("message", String::new()),
            timer: PeriodicTimer::new(handle),
            ticks: AtomicUsize::new(0),
            sink,
        });

        let weak: Weak<Self> = Arc::downgrade(&board);
        board.timer.on_tick(move || {
            if let Some(board) = weak.upgrade() {
                board.on_timeout();
            }
        });
        board.timer.start(interval)?;
        Ok(board)
    }

    /// The current message.
    pub fn message(&self) -> String {
        self.message.get()
    }

    /// Write the message and notify every listener.
    pub fn set_message(&self, message: impl Into<String>) {
        self.message.set(message.into());
    }

    /// Register a listener for message writes.
    pub fn message_changed<F>(&self, listener: F) -> ConnectionId
    where
        F: Fn(&String) + Send + Sync + 'static,
    {
        self.message.add_listener(listener)
    }

    /// The timer's tick handler: logs [`TIMEOUT_MESSAGE`].
    pub fn on_timeout(&self) {
        self.ticks.fetch_add(1, Ordering::SeqCst);
        self.sink.info(TIMEOUT_MESSAGE);
    }

    /// Timeouts handled since construction.
    pub fn ticks(&self) -> usize {
        self.ticks.load(Ordering::SeqCst)
    }

    /// The timer driving [`MessageBoard::on_timeout`].
    pub fn timer(&self) -> &PeriodicTimer {
        &self.timer
    }

    /// Stop the timer. The board keeps its message.
    pub fn stop(&self) {
        self.timer.stop();
    }
}

impl Drop for MessageBoard {
    fn drop(&mut self) {
        self.timer.stop();
    }
}
