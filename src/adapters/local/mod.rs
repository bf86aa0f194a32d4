//! Local adapters for single-server deployment.

pub mod events;
pub mod fs;
pub mod http;
pub mod retention;

pub use events::hub::EventHub;
pub use fs::JobWorkspace;
