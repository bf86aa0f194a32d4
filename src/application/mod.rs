//! Application layer - Services driving the ports.

pub mod library;
pub mod orchestrator;

pub use library::StreamLibrary;
pub use orchestrator::TranscodeOrchestrator;
