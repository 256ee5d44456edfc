//! Counted entities: animals, dogs and the dog-years conversion.

use std::sync::Arc;

use horizon_sandbox_core::{
    FatalError, Object, ObjectBase, ObjectId, Property, SharedObjectRegistry, SharedSink,
};

/// Largest age accepted by [`convert_age`].
pub const MAX_AGE: u32 = 150;

/// Multiplier used by [`Canine::dog_years`].
pub const DOG_YEARS_FACTOR: u32 = 7;

/// Multiply an age by `factor`.
///
/// Ages outside `1..=MAX_AGE` are a fatal precondition failure, as is a
/// product that does not fit in a `u32`.
pub fn convert_age(age: u32, factor: u32) -> Result<u32, FatalError> {
    if age == 0 {
        return Err(FatalError::new("age must be greater than zero"));
    }
    if age > MAX_AGE {
        return Err(FatalError::new(format!(
            "age {age} is out of range (max {MAX_AGE})"
        )));
    }
    age.checked_mul(factor).ok_or_else(|| {
        FatalError::new(format!("age {age} times factor {factor} overflows"))
    })
}

/// A counted entity that can speak.
pub struct Animal {
    base: ObjectBase,
    name: Property<String>,
}

impl Animal {
    /// Create an animal, registering it with `registry`.
    pub fn new(
        name: impl Into<String>,
        registry: &Arc<SharedObjectRegistry>,
        sink: SharedSink,
    ) -> Self {
        Self::counted_as::<Animal>(name.into(), registry, sink)
    }

    /// Create an animal counted and labelled as `T`.
    fn counted_as<T: Object>(
        name: String,
        registry: &Arc<SharedObjectRegistry>,
        sink: SharedSink,
    ) -> Self {
        let base = ObjectBase::new::<T>(registry, sink);
        base.set_name(name.clone());
        Self {
            base,
            name: Property::new(name),
        }
    }

    /// Log `"<label> <message>"`.
    pub fn speak(&self, message: &str) {
        self.base.log(message);
    }

    /// Always `true`; an animal that exists is alive.
    pub fn is_alive(&self) -> bool {
        true
    }

    /// The animal's current name.
    pub fn name(&self) -> String {
        self.name.get()
    }

    /// Rename the animal. Returns `true` if the name changed.
    pub fn set_name(&self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.name.set(name.clone()) {
            self.base.set_name(name);
            true
        } else {
            false
        }
    }

    /// The `Type(0x..)` label used in this animal's log lines.
    pub fn label(&self) -> &str {
        self.base.label()
    }
}

impl Object for Animal {
    fn object_id(&self) -> ObjectId {
        self.base.id()
    }
}

/// A dog. Counts as a single live entity.
pub struct Canine {
    animal: Animal,
}

impl Canine {
    /// Create a dog, registering it with `registry` as a `Canine`.
    pub fn new(
        name: impl Into<String>,
        registry: &Arc<SharedObjectRegistry>,
        sink: SharedSink,
    ) -> Self {
        Self {
            animal: Animal::counted_as::<Canine>(name.into(), registry, sink),
        }
    }

    /// Log `"BARK!"`.
    pub fn bark(&self) {
        self.animal.base.sink().info("BARK!");
    }

    /// Convert a human age to dog years.
    pub fn dog_years(&self, age: u32) -> Result<u32, FatalError> {
        convert_age(age, DOG_YEARS_FACTOR)
    }

    /// The animal this dog is.
    pub fn animal(&self) -> &Animal {
        &self.animal
    }
}

impl Object for Canine {
    fn object_id(&self) -> ObjectId {
        self.animal.object_id()
    }
}
