//! Event types for the Horizon Sandbox event loop.

use crate::timer::TimerId;

/// Events dispatched through the Horizon Sandbox event loop.
///
/// Timer events are produced by the loop's own timer queue; `Quit` and
/// `WakeUp` arrive through the loop's wake-up channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SandboxEvent {
    /// A timer has fired.
    Timer {
        /// The timer that fired.
        id: TimerId,
    },

    /// Request to quit the event loop.
    Quit,

    /// Wake up the event loop so it re-evaluates its timers.
    WakeUp,
}
