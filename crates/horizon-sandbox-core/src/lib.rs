//! Core systems for Horizon Sandbox.
//!
//! This crate provides the object model the Horizon Sandbox demos are built on:
//!
//! - **Object Model**: Live-instance counting with construction/destruction logging
//! - **Signal/Slot System**: Ordered, re-entrant callback lists
//! - **Property System**: Plain and observable value cells
//! - **Timers**: One-shot and repeating timers, plus a stateful periodic timer
//! - **Event Loop**: A single-threaded loop that dispatches timer ticks
//! - **Logging**: Injectable log sinks, backed by `tracing` in production
//!
//! # Signal/Slot Example
//!
//! ```
//! use horizon_sandbox_core::Signal;
//!
//! let value_changed = Signal::<i32>::new();
//!
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! value_changed.emit(42);
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Observable Property Example
//!
//! ```
//! use horizon_sandbox_core::ObservableProperty;
//!
//! let message = ObservableProperty::new("message", String::new());
//! message.add_listener(|value: &String| println!("message is now {value:?}"));
//!
//! // Notifies even if the value did not change.
//! message.set("hello".to_string());
//! message.set("hello".to_string());
//! ```
//!
//! # Event Loop Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_sandbox_core::{EventLoop, PeriodicTimer};
//!
//! let event_loop = EventLoop::new();
//! let timer = PeriodicTimer::new(&event_loop.handle());
//! timer.on_tick(|| println!("tick"));
//! timer.start(Duration::from_millis(10)).unwrap();
//!
//! event_loop.run_for(Duration::from_millis(35)).unwrap();
//! timer.stop();
//! ```

mod error;
mod event;
pub mod event_loop;
pub mod logging;
pub mod object;
pub mod property;
pub mod signal;
pub mod timer;

pub use error::{FatalError, Result, SandboxError, TimerError};
pub use event::SandboxEvent;
pub use event_loop::{EventLoop, LoopHandle};
pub use logging::{LogRecord, LogSink, MemorySink, SharedSink, TracingSink};
pub use object::{
    global_registry, init_global_registry, reset_global_registry, Object, ObjectBase, ObjectError,
    ObjectId, ObjectRegistry, ObjectResult, SharedObjectRegistry,
};
pub use property::{ObservableProperty, Property};
pub use signal::{ConnectionGuard, ConnectionId, Signal};
pub use timer::{PeriodicTimer, TimerId, TimerKind, TimerManager, TimerState};
