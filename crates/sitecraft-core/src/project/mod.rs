//! Project domain module.
//!
//! - `model`: the `Project` entity and partial updates (`ProjectPatch`)
//! - `message`: chat transcript entries (`ChatMessage`, `MessageRole`)
//! - `store`: the in-memory collection with the active selection (`ProjectStore`)

mod message;
mod model;
mod store;

pub use message::{ChatMessage, MessageRole};
pub use model::{Project, ProjectPatch};
pub use store::{ProjectStore, WELCOME_MESSAGE};
