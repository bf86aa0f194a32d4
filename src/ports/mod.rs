//! Ports - Trait definitions implemented by adapters.

pub mod encoder;

pub use encoder::RenditionEncoder;
