//! Horizon Sandbox demonstration library.
//!
//! The demonstration types live in [`demo`]; [`settings`] loads the values
//! the `horizon-sandbox` binary runs them with.

pub mod demo;
pub mod settings;

pub use settings::{DemoSettings, SettingsError};
