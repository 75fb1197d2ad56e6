//! Prompt system for docchat.
//!
//! - Built-in prompt definitions for the answer and link-correction chains
//! - Optional per-workspace YAML overrides in `.docchat/prompts/<id>.yml`
//! - Handlebars template rendering

pub mod builder;
pub mod defaults;
pub mod loader;
pub mod types;

// Re-export main types
pub use builder::build_prompt;
pub use defaults::{builtin_prompt, LINK_VALIDATION_PROMPT_ID, QUESTION_PROMPT_ID};
pub use loader::{load_prompt, resolve_prompt};
pub use types::{BuiltPrompt, BuiltPromptMetadata, PromptDefinition};
