//! Timer system for Horizon Sandbox.
//!
//! Provides the one-shot and repeating timer queue driven by the
//! [`EventLoop`](crate::EventLoop), and [`PeriodicTimer`], an object-style
//! timer with a `timeout` signal.
//!
//! # Periodic Timer States
//!
//! A [`PeriodicTimer`] is either `Idle` or `Running`. `start` moves it to
//! `Running` (restarting the interval if it was already running); `stop`
//! moves it to `Idle` and is idempotent. Dropping the timer stops it, and
//! no tick is delivered for a stopped timer, including ticks that had
//! already expired but were not yet dispatched.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use slotmap::{new_key_type, SlotMap};

use crate::error::TimerError;
use crate::event::SandboxEvent;
use crate::event_loop::LoopHandle;
use crate::property::Property;
use crate::signal::{ConnectionId, Signal};

new_key_type! {
    /// A unique identifier for a timer.
    pub struct TimerId;
}

/// The type of timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Fires once after the specified duration.
    OneShot,
    /// Fires repeatedly at the specified interval.
    Repeating,
}

/// Internal timer data.
#[derive(Debug)]
struct TimerData {
    /// When this timer should next fire.
    next_fire: Instant,
    /// The interval for repeating timers.
    interval: Duration,
    /// The kind of timer.
    kind: TimerKind,
}

/// An entry in the timer queue (min-heap by fire time).
#[derive(Debug, Clone, Copy)]
struct TimerQueueEntry {
    id: TimerId,
    fire_time: Instant,
}

impl PartialEq for TimerQueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.fire_time == other.fire_time
    }
}

impl Eq for TimerQueueEntry {}

impl PartialOrd for TimerQueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TimerQueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse order for min-heap (BinaryHeap is max-heap by default).
        other.fire_time.cmp(&self.fire_time)
    }
}

/// Manages all timers owned by an event loop.
pub struct TimerManager {
    /// All registered timers.
    timers: SlotMap<TimerId, TimerData>,
    /// Priority queue of pending timer fires (min-heap by fire time).
    queue: BinaryHeap<TimerQueueEntry>,
}

impl TimerManager {
    /// Create a new timer manager.
    pub fn new() -> Self {
        Self {
            timers: SlotMap::with_key(),
            queue: BinaryHeap::new(),
        }
    }

    fn insert(&mut self, next_fire: Instant, interval: Duration, kind: TimerKind) -> TimerId {
        let id = self.timers.insert(TimerData {
            next_fire,
            interval,
            kind,
        });
        self.queue.push(TimerQueueEntry {
            id,
            fire_time: next_fire,
        });
        id
    }

    /// Start a one-shot timer that fires after the specified duration.
    pub fn start_one_shot(&mut self, delay: Duration) -> TimerId {
        self.insert(Instant::now() + delay, delay, TimerKind::OneShot)
    }

    /// Start a repeating timer that fires at the specified interval.
    ///
    /// The first fire occurs `interval` after this call.
    pub fn start_repeating(&mut self, interval: Duration) -> Result<TimerId, TimerError> {
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }
        Ok(self.insert(Instant::now() + interval, interval, TimerKind::Repeating))
    }

    /// Stop and remove a timer.
    pub fn stop(&mut self, id: TimerId) -> Result<(), TimerError> {
        // The stale queue entry is skipped when it surfaces.
        self.timers
            .remove(id)
            .map(|_| ())
            .ok_or(TimerError::InvalidTimerId)
    }

    /// Check if a timer is currently active.
    pub fn is_active(&self, id: TimerId) -> bool {
        self.timers.contains_key(id)
    }

    /// The kind of an active timer.
    pub fn kind(&self, id: TimerId) -> Option<TimerKind> {
        self.timers.get(id).map(|t| t.kind)
    }

    /// Get the duration until the next timer fires, if any.
    ///
    /// Returns `None` if there are no active timers.
    pub fn time_until_next(&mut self) -> Option<Duration> {
        self.discard_stale();
        self.queue
            .peek()
            .map(|entry| entry.fire_time.saturating_duration_since(Instant::now()))
    }

    /// Drop queue entries for timers that were stopped or rescheduled.
    fn discard_stale(&mut self) {
        while let Some(entry) = self.queue.peek() {
            let live = self
                .timers
                .get(entry.id)
                .is_some_and(|t| t.next_fire == entry.fire_time);
            if live {
                break;
            }
            self.queue.pop();
        }
    }

    /// Process all timers that should fire now.
    pub fn process_expired(&mut self) -> Vec<SandboxEvent> {
        self.process_expired_at(Instant::now())
    }

    /// Process all timers due at or before `now`.
    ///
    /// Each due timer fires at most once per call. Repeating timers are
    /// rescheduled on their original cadence; if the loop fell behind by a
    /// whole interval or more, missed fires are skipped rather than burst.
    ///
    /// Returns a list of timer events to dispatch, in fire-time order.
    #[tracing::instrument(skip(self), target = "horizon_sandbox_core::timer", level = "trace")]
    pub fn process_expired_at(&mut self, now: Instant) -> Vec<SandboxEvent> {
        let mut events = Vec::new();
        let mut rescheduled = Vec::new();

        while let Some(entry) = self.queue.peek().copied() {
            if entry.fire_time > now {
                break;
            }
            self.queue.pop();

            let id = entry.id;
            let Some(timer) = self.timers.get_mut(id) else {
                continue;
            };
            if timer.next_fire != entry.fire_time {
                continue;
            }

            tracing::trace!(target: "horizon_sandbox_core::timer", ?id, "timer fired");
            events.push(SandboxEvent::Timer { id });

            let kind = timer.kind;
            match kind {
                TimerKind::OneShot => {
                    self.timers.remove(id);
                }
                TimerKind::Repeating => {
                    let mut next = timer.next_fire + timer.interval;
                    if next <= now {
                        next = now + timer.interval;
                    }
                    timer.next_fire = next;
                    rescheduled.push(TimerQueueEntry {
                        id,
                        fire_time: next,
                    });
                }
            }
        }

        self.queue.extend(rescheduled);
        events
    }

    /// Get the number of active timers.
    pub fn active_count(&self) -> usize {
        self.timers.len()
    }
}

impl Default for TimerManager {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe wrapper around `TimerManager`.
pub(crate) struct SharedTimerManager {
    inner: Mutex<TimerManager>,
}

impl SharedTimerManager {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(TimerManager::new()),
        }
    }

    pub fn start_one_shot(&self, delay: Duration) -> TimerId {
        self.inner.lock().start_one_shot(delay)
    }

    pub fn start_repeating(&self, interval: Duration) -> Result<TimerId, TimerError> {
        self.inner.lock().start_repeating(interval)
    }

    pub fn stop(&self, id: TimerId) -> Result<(), TimerError> {
        self.inner.lock().stop(id)
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.inner.lock().is_active(id)
    }

    pub fn time_until_next(&self) -> Option<Duration> {
        self.inner.lock().time_until_next()
    }

    pub fn process_expired(&self) -> Vec<SandboxEvent> {
        self.inner.lock().process_expired()
    }

    pub fn active_count(&self) -> usize {
        self.inner.lock().active_count()
    }
}

/// The two states of a [`PeriodicTimer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Not firing.
    Idle,
    /// Firing every interval.
    Running,
}

/// A repeating timer that emits its `timeout` signal every interval.
///
/// Ticks are delivered by the event loop the timer was created on, on the
/// thread running that loop.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::time::Duration;
/// use horizon_sandbox_core::{EventLoop, PeriodicTimer};
///
/// let event_loop = EventLoop::new();
/// let timer = PeriodicTimer::new(&event_loop.handle());
/// let ticks = Arc::new(AtomicUsize::new(0));
///
/// let ticks_clone = ticks.clone();
/// timer.on_tick(move || {
///     ticks_clone.fetch_add(1, Ordering::SeqCst);
/// });
/// timer.start(Duration::from_millis(10)).unwrap();
///
/// event_loop.run_for(Duration::from_millis(55)).unwrap();
/// timer.stop();
/// assert!(ticks.load(Ordering::SeqCst) >= 3);
/// ```
pub struct PeriodicTimer {
    handle: LoopHandle,
    interval: Property<Duration>,
    active: Mutex<Option<TimerId>>,
    timeout: Arc<Signal<()>>,
}

impl PeriodicTimer {
    /// Create an idle timer on the given event loop.
    pub fn new(handle: &LoopHandle) -> Self {
        Self {
            handle: handle.clone(),
            interval: Property::new(Duration::ZERO),
            active: Mutex::new(None),
            timeout: Arc::new(Signal::new()),
        }
    }

    /// Start firing every `interval`, measured from this call.
    ///
    /// Calling `start` on a running timer restarts the interval. A zero
    /// interval is rejected and leaves the timer's state unchanged.
    pub fn start(&self, interval: Duration) -> Result<(), TimerError> {
        if interval.is_zero() {
            return Err(TimerError::ZeroInterval);
        }

        let mut active = self.active.lock();
        if let Some(previous) = active.take() {
            let _ = self.handle.stop_timer(previous);
        }

        let timeout = Arc::clone(&self.timeout);
        let id = self.handle.start_repeating(interval, move || {
            timeout.emit(());
        })?;
        self.interval.set(interval);
        *active = Some(id);
        tracing::debug!(
            target: "horizon_sandbox_core::timer",
            ?id,
            ?interval,
            "periodic timer started"
        );
        Ok(())
    }

    /// Stop firing. Stopping an idle timer does nothing.
    pub fn stop(&self) {
        if let Some(id) = self.active.lock().take() {
            let _ = self.handle.stop_timer(id);
            tracing::debug!(target: "horizon_sandbox_core::timer", ?id, "periodic timer stopped");
        }
    }

    /// The current state.
    pub fn state(&self) -> TimerState {
        if self.is_running() {
            TimerState::Running
        } else {
            TimerState::Idle
        }
    }

    /// Whether the timer is firing.
    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .is_some_and(|id| self.handle.is_timer_active(id))
    }

    /// The interval of the most recent successful `start`.
    pub fn interval(&self) -> Duration {
        self.interval.get()
    }

    /// The signal emitted on every tick.
    pub fn timeout(&self) -> &Signal<()> {
        &self.timeout
    }

    /// Connect a tick callback.
    pub fn on_tick<F>(&self, callback: F) -> ConnectionId
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.timeout.connect(move |_| callback())
    }
}

impl Drop for PeriodicTimer {
    fn drop(&mut self) {
        self.stop();
    }
}
