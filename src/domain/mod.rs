//! Domain layer - Pure business logic.

pub mod events;
pub mod hls;
pub mod id;
pub mod jobs;
