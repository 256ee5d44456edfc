//! Independent capabilities combined on one type.

use horizon_sandbox_core::SharedSink;

/// Something that can freeze food.
pub trait Freezable {
    fn freeze(&self) -> bool;
}

/// Something that can grill food.
pub trait Toastable {
    fn grill(&self) -> bool;
}

/// Something that can cook food with microwaves.
pub trait Microwavable {
    fn cook(&self) -> bool;
}

/// A kitchen appliance with every capability.
pub struct Appliance {
    sink: SharedSink,
}

impl Appliance {
    /// Create an appliance that reports its actions to `sink`.
    pub fn new(sink: SharedSink) -> Self {
        Self { sink }
    }
}

impl Freezable for Appliance {
    fn freeze(&self) -> bool {
        self.sink.info("Freezing");
        true
    }
}

impl Toastable for Appliance {
    fn grill(&self) -> bool {
        self.sink.info("Grilling");
        true
    }
}

impl Microwavable for Appliance {
    fn cook(&self) -> bool {
        self.sink.info("Cooking");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use horizon_sandbox_core::MemorySink;

    fn freeze_all(items: &[&dyn Freezable]) -> usize {
        items.iter().filter(|item| item.freeze()).count()
    }

    #[test]
    fn test_capabilities_through_trait_objects() {
        let sink = MemorySink::new();
        let appliance = Appliance::new(sink.shared());

        let freezer: &dyn Freezable = &appliance;
        let toaster: &dyn Toastable = &appliance;
        let microwave: &dyn Microwavable = &appliance;

        assert!(freezer.freeze());
        assert!(toaster.grill());
        assert!(microwave.cook());
        assert_eq!(sink.messages(), vec!["Freezing", "Grilling", "Cooking"]);
    }

    #[test]
    fn test_capability_used_alone() {
        let sink = MemorySink::new();
        let appliance = Appliance::new(sink.shared());

        assert_eq!(freeze_all(&[&appliance, &appliance]), 2);
        assert_eq!(sink.count("Freezing"), 2);
        assert_eq!(sink.count("Cooking"), 0);
    }
}
