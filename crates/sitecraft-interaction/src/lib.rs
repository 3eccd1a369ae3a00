//! External service clients for Sitecraft.

pub mod gemini_client;
pub mod prompts;

pub use gemini_client::GeminiClient;
pub use prompts::PromptBuilder;
