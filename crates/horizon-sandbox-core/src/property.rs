//! Property system for Horizon Sandbox.
//!
//! This module provides value cells with controlled read/write access:
//!
//! - **Property<T>**: a cell whose `set` reports whether the value changed,
//!   leaving notification to the owner
//! - **ObservableProperty<T>**: a named cell whose every write notifies all
//!   registered listeners, in registration order, before the write returns
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use parking_lot::Mutex;
//! use horizon_sandbox_core::ObservableProperty;
//!
//! let message = ObservableProperty::new("message", String::new());
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let seen_clone = seen.clone();
//! message.add_listener(move |value: &String| seen_clone.lock().push(value.clone()));
//!
//! message.set("hello".to_string());
//! assert_eq!(message.get(), "hello");
//! assert_eq!(*seen.lock(), vec!["hello".to_string()]);
//! ```

use std::fmt;

use parking_lot::RwLock;

use crate::signal::{ConnectionId, Signal};

/// A property that tracks changes.
///
/// `Property<T>` wraps a value and provides change detection. When `set()` is
/// called, it compares the new value with the current one and returns whether
/// the value actually changed.
///
/// # Example
///
/// ```
/// use horizon_sandbox_core::Property;
///
/// let prop = Property::new(42);
/// assert_eq!(prop.get(), 42);
///
/// // Setting same value returns false (no change)
/// assert!(!prop.set(42));
///
/// // Setting different value returns true (changed)
/// assert!(prop.set(100));
/// assert_eq!(prop.get(), 100);
/// ```
pub struct Property<T> {
    value: RwLock<T>,
}

impl<T: Clone> Property<T> {
    /// Create a new property with an initial value.
    pub fn new(value: T) -> Self {
        Self {
            value: RwLock::new(value),
        }
    }

    /// Get the current value.
    ///
    /// This clones the value. For large types, consider using `with()` instead.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Set the value without change detection.
    pub fn set_silent(&self, value: T) {
        *self.value.write() = value;
    }
}

impl<T: Clone + PartialEq> Property<T> {
    /// Set the value, returning `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        let mut current = self.value.write();
        if *current != value {
            *current = value;
            true
        } else {
            false
        }
    }

    /// Set the value, returning the old value if it changed.
    pub fn replace(&self, value: T) -> Option<T> {
        let mut current = self.value.write();
        if *current != value {
            Some(std::mem::replace(&mut *current, value))
        } else {
            None
        }
    }
}

impl<T: Clone + Default> Default for Property<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for Property<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("value", &self.get())
            .finish()
    }
}

/// A named value whose writes are broadcast to registered listeners.
///
/// Unlike [`Property::set`], [`ObservableProperty::set`] never compares: every
/// write replaces the value and notifies, even when the new value equals the
/// old one. Listeners run synchronously on the writing thread, in the order
/// they were added, and all of them have run when `set` returns. The value
/// lock is released before listeners run, so a listener may read the property.
pub struct ObservableProperty<T: 'static> {
    name: &'static str,
    value: RwLock<T>,
    changed: Signal<T>,
}

impl<T: Clone + Send + Sync + 'static> ObservableProperty<T> {
    /// Create a property with a name (for diagnostics) and an initial value.
    pub fn new(name: &'static str, initial: T) -> Self {
        Self {
            name,
            value: RwLock::new(initial),
            changed: Signal::new(),
        }
    }

    /// The property's name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Get the current value. No side effects.
    pub fn get(&self) -> T {
        self.value.read().clone()
    }

    /// Access the value through a closure without cloning.
    pub fn with<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&T) -> R,
    {
        f(&self.value.read())
    }

    /// Replace the value unconditionally, then notify every listener with the
    /// new value in registration order.
    ///
    /// Returns the number of listeners notified.
    pub fn set(&self, value: T) -> usize {
        *self.value.write() = value.clone();
        tracing::trace!(
            target: "horizon_sandbox_core::property",
            name = self.name,
            "property written"
        );
        self.changed.emit(value)
    }

    /// Append a listener. Duplicates are allowed; each registration is
    /// notified separately.
    pub fn add_listener<F>(&self, listener: F) -> ConnectionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.changed.connect(listener)
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn remove_listener(&self, id: ConnectionId) -> bool {
        self.changed.disconnect(id)
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.changed.connection_count()
    }
}

impl<T: Clone + Default + Send + Sync + 'static> Default for ObservableProperty<T> {
    fn default() -> Self {
        Self::new("", T::default())
    }
}

impl<T: Clone + fmt::Debug + Send + Sync + 'static> fmt::Debug for ObservableProperty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObservableProperty")
            .field("name", &self.name)
            .field("value", &self.get())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

static_assertions::assert_impl_all!(ObservableProperty<String>: Send, Sync);
