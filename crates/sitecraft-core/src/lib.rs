//! Domain layer for Sitecraft.
//!
//! Holds the project and history models, the in-memory project store, and the
//! traits the outer layers implement (persistence, generation, packaging).

pub mod archive;
pub mod config;
pub mod deploy;
pub mod error;
pub mod generation;
pub mod history;
pub mod preview;
pub mod project;
pub mod state;

// Re-export common error type
pub use error::{Result, SitecraftError};
