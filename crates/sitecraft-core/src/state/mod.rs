//! Application state persistence: keys and repository traits.

pub mod model;
pub mod repository;

pub use model::StateKey;
pub use repository::{KeyValueStore, StateRepository};
