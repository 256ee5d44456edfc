//! Small programs built on the Horizon Sandbox object model.
//!
//! Each submodule exercises one part of the core crate; [`run`] strings them
//! together in a fixed order.

pub mod animal;
pub mod appliance;
pub mod message;
pub mod radio;
pub mod statics;
mod run;

pub use run::run;
