//! The bootstrap sequence: five ordered ensure-steps and the orchestrator that runs them.

pub mod error;
pub mod orchestrator;
pub mod scaffold;
pub mod steps;

pub use orchestrator::{Bootstrap, HostFacts};
