//! Methods next to associated functions that need no instance.

use std::sync::Arc;

use horizon_sandbox_core::{Object, ObjectBase, ObjectId, SharedObjectRegistry, SharedSink};

/// A counted object whose method delegates to an associated function.
pub struct StaticFunctions {
    base: ObjectBase,
}

impl StaticFunctions {
    /// Create the object, registering it with `registry`.
    pub fn new(registry: &Arc<SharedObjectRegistry>, sink: SharedSink) -> Self {
        Self {
            base: ObjectBase::new::<StaticFunctions>(registry, sink),
        }
    }

    /// Log `"<label> doStuff"`, then run [`StaticFunctions::do_other_stuff`].
    pub fn do_stuff(&self) {
        self.base.log("doStuff");
        Self::do_other_stuff(self.base.sink());
    }

    /// Log `"doOtherStuff"`. Callable without an instance.
    pub fn do_other_stuff(sink: &SharedSink) {
        sink.info("doOtherStuff");
    }

    /// The `Type(0x..)` label used in this object's log lines.
    pub fn label(&self) -> &str {
        self.base.label()
    }
}

impl Object for StaticFunctions {
    fn object_id(&self) -> ObjectId {
        self.base.id()
    }
}
