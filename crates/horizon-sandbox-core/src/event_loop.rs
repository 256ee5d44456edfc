//! The single-threaded event loop that delivers timer ticks.
//!
//! One thread runs [`EventLoop::run`]; every timer callback is dispatched on
//! that thread, one at a time. Other code talks to the loop through a
//! cloneable [`LoopHandle`], which can start and stop timers and request a
//! quit. Quit and wake-up requests travel over a channel so that they
//! interrupt the loop while it is waiting for the next timer.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use horizon_sandbox_core::EventLoop;
//!
//! let event_loop = EventLoop::new();
//! let handle = event_loop.handle();
//!
//! handle
//!     .start_one_shot(Duration::from_millis(5), || println!("fired"))
//!     .unwrap();
//!
//! // Returns once no timers remain.
//! event_loop.run().unwrap();
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::{Result, TimerError};
use crate::event::SandboxEvent;
use crate::timer::{SharedTimerManager, TimerId, TimerKind};

type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// A registered callback and the kind of timer it belongs to.
struct TimerEntry {
    kind: TimerKind,
    callback: TimerCallback,
}

/// State shared between the loop and its handles.
struct LoopShared {
    /// Timer manager (thread-safe).
    timers: SharedTimerManager,
    /// Callbacks by timer. Stopping a timer removes its entry, which is
    /// what suppresses ticks that already expired.
    callbacks: Mutex<HashMap<TimerId, TimerEntry>>,
    /// Wake-up channel into the loop.
    sender: Sender<SandboxEvent>,
    /// Flag indicating the loop should quit.
    should_quit: AtomicBool,
    /// Total timer callbacks dispatched.
    dispatched: AtomicU64,
}

/// A cloneable, thread-safe handle to an [`EventLoop`].
///
/// Handles do not keep the loop alive. Once the loop is dropped, starting a
/// timer fails with [`TimerError::LoopExited`] and stopping one is a no-op.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Weak<LoopShared>,
}

impl LoopHandle {
    fn shared(&self) -> std::result::Result<Arc<LoopShared>, TimerError> {
        self.shared.upgrade().ok_or(TimerError::LoopExited)
    }

    fn register(
        shared: &LoopShared,
        id: TimerId,
        kind: TimerKind,
        callback: TimerCallback,
    ) -> TimerId {
        shared
            .callbacks
            .lock()
            .insert(id, TimerEntry { kind, callback });
        // The loop may be blocked waiting on a later deadline.
        let _ = shared.sender.send(SandboxEvent::WakeUp);
        id
    }

    /// Start a repeating timer that calls `callback` every `interval`.
    pub fn start_repeating<F>(
        &self,
        interval: Duration,
        callback: F,
    ) -> std::result::Result<TimerId, TimerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let shared = self.shared()?;
        let id = shared.timers.start_repeating(interval)?;
        Ok(Self::register(&shared, id, TimerKind::Repeating, Arc::new(callback)))
    }

    /// Start a one-shot timer that calls `callback` once after `delay`.
    pub fn start_one_shot<F>(
        &self,
        delay: Duration,
        callback: F,
    ) -> std::result::Result<TimerId, TimerError>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let shared = self.shared()?;
        let id = shared.timers.start_one_shot(delay);
        Ok(Self::register(&shared, id, TimerKind::OneShot, Arc::new(callback)))
    }

    /// Stop a timer. No tick for it is dispatched after this returns.
    pub fn stop_timer(&self, id: TimerId) -> std::result::Result<(), TimerError> {
        let Some(shared) = self.shared.upgrade() else {
            return Ok(());
        };
        let removed = shared.callbacks.lock().remove(&id).is_some();
        let stopped = shared.timers.stop(id);
        if removed { Ok(()) } else { stopped }
    }

    /// Check if a timer is still scheduled.
    pub fn is_timer_active(&self, id: TimerId) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.timers.is_active(id))
    }

    /// Request the loop to quit.
    ///
    /// The loop finishes the callback it is running, if any, and returns
    /// from `run` without dispatching further repeating ticks. One-shot
    /// timers that already expired in the same pass still fire, since they
    /// have left the timer queue and would otherwise never run.
    pub fn quit(&self) {
        if let Some(shared) = self.shared.upgrade() {
            tracing::debug!(target: "horizon_sandbox_core::event_loop", "quit requested");
            shared.should_quit.store(true, Ordering::SeqCst);
            let _ = shared.sender.send(SandboxEvent::Quit);
        }
    }

    /// Wake the loop so it re-evaluates its timers.
    pub fn wake_up(&self) {
        if let Some(shared) = self.shared.upgrade() {
            let _ = shared.sender.send(SandboxEvent::WakeUp);
        }
    }

    /// Whether the loop this handle points at still exists.
    pub fn is_alive(&self) -> bool {
        self.shared.strong_count() > 0
    }
}

/// The event loop: owns the timer queue and dispatches timer callbacks.
pub struct EventLoop {
    shared: Arc<LoopShared>,
    receiver: Receiver<SandboxEvent>,
}

impl EventLoop {
    /// Create a new event loop with no timers.
    pub fn new() -> Self {
        let (sender, receiver) = crossbeam_channel::unbounded();
        Self {
            shared: Arc::new(LoopShared {
                timers: SharedTimerManager::new(),
                callbacks: Mutex::new(HashMap::new()),
                sender,
                should_quit: AtomicBool::new(false),
                dispatched: AtomicU64::new(0),
            }),
            receiver,
        }
    }

    /// Get a handle for starting timers and requesting a quit.
    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: Arc::downgrade(&self.shared),
        }
    }

    /// Number of active timers.
    pub fn active_timer_count(&self) -> usize {
        self.shared.timers.active_count()
    }

    /// Total number of timer callbacks dispatched by this loop.
    pub fn dispatched_count(&self) -> u64 {
        self.shared.dispatched.load(Ordering::SeqCst)
    }

    /// Run the loop until a quit is requested or no timers remain.
    ///
    /// The quit flag is cleared on return, so the loop can be run again.
    #[tracing::instrument(skip(self), target = "horizon_sandbox_core::event_loop", level = "debug")]
    pub fn run(&self) -> Result<()> {
        tracing::debug!(target: "horizon_sandbox_core::event_loop", "starting event loop");

        loop {
            self.drain_events();
            if self.should_quit() {
                break;
            }

            self.dispatch_expired();
            if self.should_quit() {
                break;
            }

            let Some(wait) = self.shared.timers.time_until_next() else {
                tracing::debug!(
                    target: "horizon_sandbox_core::event_loop",
                    "no active timers, leaving event loop"
                );
                break;
            };

            match self.receiver.recv_timeout(wait) {
                Ok(event) => self.handle_event(event),
                Err(RecvTimeoutError::Timeout) => {}
                // The loop owns a sender, so this only happens during teardown.
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        self.shared.should_quit.store(false, Ordering::SeqCst);
        self.drain_events();
        self.shared.should_quit.store(false, Ordering::SeqCst);
        tracing::debug!(target: "horizon_sandbox_core::event_loop", "event loop stopped");
        Ok(())
    }

    /// Run the loop for `duration`, then quit.
    pub fn run_for(&self, duration: Duration) -> Result<()> {
        let handle = self.handle();
        let quit_handle = handle.clone();
        let quit_timer = handle.start_one_shot(duration, move || quit_handle.quit())?;
        let result = self.run();
        // Still pending if the loop was quit early.
        let _ = handle.stop_timer(quit_timer);
        result
    }

    /// Run a single non-blocking pass: handle pending requests and dispatch
    /// every expired timer once.
    ///
    /// Returns the number of callbacks dispatched.
    pub fn process_events(&self) -> usize {
        self.drain_events();
        let dispatched = self.dispatch_expired();
        self.shared.should_quit.store(false, Ordering::SeqCst);
        dispatched
    }

    fn should_quit(&self) -> bool {
        self.shared.should_quit.load(Ordering::SeqCst)
    }

    fn drain_events(&self) {
        while let Ok(event) = self.receiver.try_recv() {
            self.handle_event(event);
        }
    }

    fn handle_event(&self, event: SandboxEvent) {
        match event {
            SandboxEvent::Quit => self.shared.should_quit.store(true, Ordering::SeqCst),
            SandboxEvent::WakeUp => {}
            SandboxEvent::Timer { id } => {
                self.dispatch_timer(id);
            }
        }
    }

    fn dispatch_expired(&self) -> usize {
        let events = self.shared.timers.process_expired();
        let mut dispatched = 0;
        for event in events {
            let SandboxEvent::Timer { id } = event else {
                continue;
            };
            // Repeating timers stay queued and can wait for the next run.
            if self.should_quit() && self.callback_kind(id) != Some(TimerKind::OneShot) {
                continue;
            }
            if self.dispatch_timer(id) {
                dispatched += 1;
            }
        }
        dispatched
    }

    fn callback_kind(&self, id: TimerId) -> Option<TimerKind> {
        self.shared.callbacks.lock().get(&id).map(|entry| entry.kind)
    }

    /// Invoke a timer's callback if the timer has not been stopped.
    fn dispatch_timer(&self, id: TimerId) -> bool {
        let callback = {
            let mut callbacks = self.shared.callbacks.lock();
            match callbacks.get(&id).map(|entry| entry.kind) {
                Some(TimerKind::OneShot) => callbacks.remove(&id).map(|entry| entry.callback),
                Some(TimerKind::Repeating) => {
                    callbacks.get(&id).map(|entry| Arc::clone(&entry.callback))
                }
                None => None,
            }
        };

        let Some(callback) = callback else {
            tracing::trace!(
                target: "horizon_sandbox_core::event_loop",
                ?id,
                "tick suppressed for stopped timer"
            );
            return false;
        };

        // No lock is held here, so callbacks may start and stop timers.
        callback();
        self.shared.dispatched.fetch_add(1, Ordering::SeqCst);
        true
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = count.clone();
        (count, move || {
            count_clone.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[test]
    fn test_run_returns_when_no_timers() {
        let event_loop = EventLoop::new();
        let start = Instant::now();
        event_loop.run().unwrap();
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[test]
    fn test_one_shot_fires_once() {
        let event_loop = EventLoop::new();
        let (count, callback) = counter();
        let id = event_loop
            .handle()
            .start_one_shot(Duration::from_millis(10), callback)
            .unwrap();

        event_loop.run().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!event_loop.handle().is_timer_active(id));
        assert_eq!(event_loop.dispatched_count(), 1);
    }

    #[test]
    fn test_run_for_quits() {
        let event_loop = EventLoop::new();
        let (count, callback) = counter();
        event_loop
            .handle()
            .start_repeating(Duration::from_millis(20), callback)
            .unwrap();

        let start = Instant::now();
        event_loop.run_for(Duration::from_millis(110)).unwrap();
        let elapsed = start.elapsed();

        assert!(elapsed >= Duration::from_millis(110));
        assert!(elapsed < Duration::from_millis(1000));
        let ticks = count.load(Ordering::SeqCst);
        assert!((3..=6).contains(&ticks), "unexpected tick count {ticks}");
    }

    #[test]
    fn test_stop_from_callback() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let count = Arc::new(AtomicUsize::new(0));
        let slot = Arc::new(Mutex::new(None::<TimerId>));

        let count_clone = count.clone();
        let slot_clone = slot.clone();
        let handle_clone = handle.clone();
        let id = handle
            .start_repeating(Duration::from_millis(5), move || {
                if count_clone.fetch_add(1, Ordering::SeqCst) + 1 == 3 {
                    if let Some(id) = *slot_clone.lock() {
                        handle_clone.stop_timer(id).unwrap();
                    }
                }
            })
            .unwrap();
        *slot.lock() = Some(id);

        // Returns on its own once the repeating timer stops itself.
        event_loop.run().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_stopped_timer_ticks_are_suppressed() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let (count, callback) = counter();
        let id = handle
            .start_repeating(Duration::from_millis(1), callback)
            .unwrap();

        // Let the tick expire without dispatching it, then stop.
        std::thread::sleep(Duration::from_millis(5));
        handle.stop_timer(id).unwrap();

        assert_eq!(event_loop.process_events(), 0);
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_quit_keeps_expired_one_shots() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let (count, callback) = counter();

        let quitter = handle.clone();
        handle
            .start_one_shot(Duration::from_millis(5), move || quitter.quit())
            .unwrap();
        let second = handle
            .start_one_shot(Duration::from_millis(6), callback)
            .unwrap();

        // Both expire before the loop looks at them.
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(event_loop.process_events(), 2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!handle.is_timer_active(second));

        event_loop.process_events();
        event_loop.run().unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(event_loop.active_timer_count(), 0);
    }

    #[test]
    fn test_quit_defers_repeating_ticks() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let (count, callback) = counter();

        let quitter = handle.clone();
        handle
            .start_one_shot(Duration::from_millis(5), move || quitter.quit())
            .unwrap();
        let repeating = handle
            .start_repeating(Duration::from_millis(6), callback)
            .unwrap();

        std::thread::sleep(Duration::from_millis(10));
        assert_eq!(event_loop.process_events(), 1);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        // Still scheduled for a later run.
        assert!(handle.is_timer_active(repeating));
        handle.stop_timer(repeating).unwrap();
    }

    #[test]
    fn test_stop_unknown_timer() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        let id = handle
            .start_one_shot(Duration::from_secs(60), || {})
            .unwrap();
        handle.stop_timer(id).unwrap();
        assert_eq!(handle.stop_timer(id), Err(TimerError::InvalidTimerId));
    }

    #[test]
    fn test_quit_from_other_thread() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        handle
            .start_repeating(Duration::from_secs(10), || {})
            .unwrap();

        let quitter = handle.clone();
        let thread = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(20));
            quitter.quit();
        });

        let start = Instant::now();
        event_loop.run().unwrap();
        thread.join().unwrap();
        assert!(start.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_handle_after_loop_dropped() {
        let event_loop = EventLoop::new();
        let handle = event_loop.handle();
        assert!(handle.is_alive());
        drop(event_loop);

        assert!(!handle.is_alive());
        assert_eq!(
            handle.start_one_shot(Duration::from_millis(1), || {}).unwrap_err(),
            TimerError::LoopExited
        );
        handle.quit();
    }
}
