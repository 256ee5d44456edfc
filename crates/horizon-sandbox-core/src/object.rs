//! Object model for Horizon Sandbox.
//!
//! Provides lifetime tracking for sandbox objects:
//! - Unique object identifiers via arena-based storage
//! - A registry that counts how many objects are currently alive
//! - Object naming and type information for diagnostics
//! - Construction/destruction log lines written through a [`LogSink`]
//!
//! # Key Types
//!
//! - [`Object`] - Base trait that all tracked objects implement
//! - [`ObjectBase`] - Owning handle that registers on construction and
//!   unregisters on drop
//! - [`ObjectId`] - Unique stable identifier for each object
//! - [`ObjectRegistry`] - The live-instance counter
//! - [`SharedObjectRegistry`] - Thread-safe wrapper around [`ObjectRegistry`]
//!
//! # Counting Discipline
//!
//! The only way to decrement the live count through the public object API is
//! dropping an [`ObjectBase`], which happens exactly once. The raw
//! [`ObjectRegistry::destroy`] call rejects identifiers it does not know, so
//! an unpaired destroy can never push the count below the number of objects
//! actually alive.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use horizon_sandbox_core::logging::MemorySink;
//! use horizon_sandbox_core::object::{Object, ObjectBase, ObjectId, SharedObjectRegistry};
//!
//! struct Widget {
//!     base: ObjectBase,
//! }
//!
//! impl Object for Widget {
//!     fn object_id(&self) -> ObjectId {
//!         self.base.id()
//!     }
//! }
//!
//! let registry = Arc::new(SharedObjectRegistry::new());
//! let sink = MemorySink::new();
//! {
//!     let _widget = Widget { base: ObjectBase::new::<Widget>(&registry, sink.shared()) };
//!     assert_eq!(registry.live_count(), 1);
//! }
//! assert_eq!(registry.live_count(), 0);
//! ```

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use slotmap::{new_key_type, SlotMap};

use crate::logging::SharedSink;

new_key_type! {
    /// A unique identifier for an object in the registry.
    ///
    /// `ObjectId`s are stable handles that become invalid when the object
    /// is destroyed.
    pub struct ObjectId;
}

impl ObjectId {
    /// Convert the ObjectId to a raw u64 value.
    #[inline]
    pub fn as_raw(self) -> u64 {
        use slotmap::Key;
        self.data().as_ffi()
    }
}

/// Errors that can occur during object operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectError {
    /// The object ID is invalid or has been destroyed.
    InvalidObjectId,
    /// The object registry is not initialized.
    RegistryNotInitialized,
}

impl fmt::Display for ObjectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidObjectId => write!(f, "Invalid or destroyed object ID"),
            Self::RegistryNotInitialized => write!(f, "Object registry not initialized"),
        }
    }
}

impl std::error::Error for ObjectError {}

/// Result type for object operations.
pub type ObjectResult<T> = std::result::Result<T, ObjectError>;

/// Internal data stored in the registry for each live object.
struct ObjectData {
    /// Human-readable name for debugging and lookup.
    name: String,
    /// The type ID of the concrete Object implementation.
    type_id: TypeId,
    /// The type name for debugging.
    type_name: &'static str,
}

/// The live-instance counter.
///
/// Every registered object occupies one slot until it is destroyed, so the
/// number of occupied slots is the number of constructed-but-not-destroyed
/// objects.
pub struct ObjectRegistry {
    objects: SlotMap<ObjectId, ObjectData>,
    /// Total registrations since creation or the last reset.
    created: u64,
}

impl ObjectRegistry {
    /// Create a new empty object registry.
    pub fn new() -> Self {
        Self {
            objects: SlotMap::with_key(),
            created: 0,
        }
    }

    /// Register a new object and return its ID. Increments the live count.
    pub fn register<T: Object + 'static>(&mut self) -> ObjectId {
        let data = ObjectData {
            name: String::new(),
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        };
        let id = self.objects.insert(data);
        self.created += 1;
        tracing::trace!(
            target: "horizon_sandbox_core::object",
            ?id,
            type_name = std::any::type_name::<T>(),
            live = self.objects.len(),
            "registered object"
        );
        id
    }

    /// Remove an object from the registry. Decrements the live count.
    ///
    /// Returns an error, leaving the count untouched, if the object is not
    /// registered.
    pub fn destroy(&mut self, id: ObjectId) -> ObjectResult<()> {
        let data = self.objects.remove(id).ok_or(ObjectError::InvalidObjectId)?;
        tracing::trace!(
            target: "horizon_sandbox_core::object",
            ?id,
            type_name = data.type_name,
            live = self.objects.len(),
            "destroyed object"
        );
        Ok(())
    }

    /// Check if an object is registered.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(id)
    }

    /// Number of objects currently alive.
    pub fn live_count(&self) -> usize {
        self.objects.len()
    }

    /// Number of live objects of concrete type `T`.
    pub fn live_count_of<T: 'static>(&self) -> usize {
        let type_id = TypeId::of::<T>();
        self.objects
            .values()
            .filter(|data| data.type_id == type_id)
            .count()
    }

    /// Total number of registrations since creation or the last reset.
    pub fn created_count(&self) -> u64 {
        self.created
    }

    /// Get an object's name.
    pub fn object_name(&self, id: ObjectId) -> ObjectResult<&str> {
        self.objects
            .get(id)
            .map(|d| d.name.as_str())
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Set an object's name.
    pub fn set_object_name(&mut self, id: ObjectId, name: String) -> ObjectResult<()> {
        let data = self.objects.get_mut(id).ok_or(ObjectError::InvalidObjectId)?;
        data.name = name;
        Ok(())
    }

    /// Get an object's type name.
    pub fn type_name(&self, id: ObjectId) -> ObjectResult<&'static str> {
        self.objects
            .get(id)
            .map(|d| d.type_name)
            .ok_or(ObjectError::InvalidObjectId)
    }

    /// Forget every registered object and zero the counters.
    ///
    /// Handles still alive after a reset find their IDs gone when they drop;
    /// their destroy is rejected and the count stays at zero.
    pub fn reset(&mut self) {
        tracing::debug!(
            target: "horizon_sandbox_core::object",
            discarded = self.objects.len(),
            "resetting object registry"
        );
        self.objects.clear();
        self.created = 0;
    }
}

impl Default for ObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A thread-safe wrapper around `ObjectRegistry`.
pub struct SharedObjectRegistry {
    inner: RwLock<ObjectRegistry>,
}

impl SharedObjectRegistry {
    /// Create a new shared registry.
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(ObjectRegistry::new()),
        }
    }

    /// Register a new object.
    pub fn register<T: Object + 'static>(&self) -> ObjectId {
        self.inner.write().register::<T>()
    }

    /// Destroy an object.
    pub fn destroy(&self, id: ObjectId) -> ObjectResult<()> {
        self.inner.write().destroy(id)
    }

    /// Check if an object is registered.
    pub fn contains(&self, id: ObjectId) -> bool {
        self.inner.read().contains(id)
    }

    /// Number of objects currently alive.
    pub fn live_count(&self) -> usize {
        self.inner.read().live_count()
    }

    /// Number of live objects of concrete type `T`.
    pub fn live_count_of<T: 'static>(&self) -> usize {
        self.inner.read().live_count_of::<T>()
    }

    /// Total number of registrations since creation or the last reset.
    pub fn created_count(&self) -> u64 {
        self.inner.read().created_count()
    }

    /// Get an object's name (cloned).
    pub fn object_name(&self, id: ObjectId) -> ObjectResult<String> {
        self.inner.read().object_name(id).map(|s| s.to_string())
    }

    /// Set an object's name.
    pub fn set_object_name(&self, id: ObjectId, name: String) -> ObjectResult<()> {
        self.inner.write().set_object_name(id, name)
    }

    /// Get an object's type name.
    pub fn type_name(&self, id: ObjectId) -> ObjectResult<&'static str> {
        self.inner.read().type_name(id)
    }

    /// Forget every registered object and zero the counters.
    pub fn reset(&self) {
        self.inner.write().reset();
    }
}

impl Default for SharedObjectRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(SharedObjectRegistry: Send, Sync);

/// Global object registry (explicitly initialized).
static GLOBAL_REGISTRY: Mutex<Option<Arc<SharedObjectRegistry>>> = Mutex::new(None);

/// Initialize the global object registry and return a handle to it.
///
/// Calling this again returns the existing registry.
pub fn init_global_registry() -> Arc<SharedObjectRegistry> {
    let mut guard = GLOBAL_REGISTRY.lock();
    guard
        .get_or_insert_with(|| Arc::new(SharedObjectRegistry::new()))
        .clone()
}

/// Get a handle to the global object registry.
///
/// Returns an error if the registry hasn't been initialized.
pub fn global_registry() -> ObjectResult<Arc<SharedObjectRegistry>> {
    GLOBAL_REGISTRY
        .lock()
        .clone()
        .ok_or(ObjectError::RegistryNotInitialized)
}

/// Reset the global registry's contents.
///
/// Returns an error if the registry hasn't been initialized.
pub fn reset_global_registry() -> ObjectResult<()> {
    global_registry()?.reset();
    Ok(())
}

/// The base trait that all tracked objects implement.
pub trait Object: Any + Send + Sync {
    /// Get this object's unique identifier.
    fn object_id(&self) -> ObjectId;
}

/// Owning handle that ties an object's lifetime to the live count.
///
/// Include this as a field in your object types. Construction registers the
/// object and writes `"<Type>(<id>) Constructed"` to the sink; dropping it
/// unregisters the object and writes `"<Type>(<id>) Deconstructed"`.
pub struct ObjectBase {
    id: ObjectId,
    label: String,
    registry: Arc<SharedObjectRegistry>,
    sink: SharedSink,
}

impl ObjectBase {
    /// Create a new ObjectBase, registering the object in `registry`.
    pub fn new<T: Object + 'static>(
        registry: &Arc<SharedObjectRegistry>,
        sink: SharedSink,
    ) -> Self {
        let id = registry.register::<T>();
        let type_name = std::any::type_name::<T>();
        let short_type = type_name.rsplit("::").next().unwrap_or(type_name);
        let label = format!("{short_type}({:#x})", id.as_raw());
        sink.info(&format!("{label} Constructed"));
        Self {
            id,
            label,
            registry: Arc::clone(registry),
            sink,
        }
    }

    /// Create a new ObjectBase in the global registry.
    ///
    /// Returns an error if the global registry is not initialized.
    pub fn new_global<T: Object + 'static>(sink: SharedSink) -> ObjectResult<Self> {
        let registry = global_registry()?;
        Ok(Self::new::<T>(&registry, sink))
    }

    /// Get the object's ID.
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// The `Type(0x..)` label used in this object's log lines.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The sink this object logs to.
    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    /// The registry this object is counted in.
    pub fn registry(&self) -> &Arc<SharedObjectRegistry> {
        &self.registry
    }

    /// Write `"<label> <message>"` to the sink.
    pub fn log(&self, message: &str) {
        self.sink.info(&format!("{} {}", self.label, message));
    }

    /// Get the object's name from the registry.
    pub fn name(&self) -> String {
        self.registry.object_name(self.id).unwrap_or_default()
    }

    /// Set the object's name in the registry.
    pub fn set_name(&self, name: impl Into<String>) {
        let _ = self.registry.set_object_name(self.id, name.into());
    }
}

impl fmt::Debug for ObjectBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectBase")
            .field("id", &self.id)
            .field("label", &self.label)
            .finish()
    }
}

impl Drop for ObjectBase {
    fn drop(&mut self) {
        if let Err(err) = self.registry.destroy(self.id) {
            tracing::warn!(
                target: "horizon_sandbox_core::object",
                id = ?self.id,
                %err,
                "object already gone from registry"
            );
        }
        self.sink.info(&format!("{} Deconstructed", self.label));
    }
}
