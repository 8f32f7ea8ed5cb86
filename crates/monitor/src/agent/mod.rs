//! LLM Diagnosis Module
//!
//! Turns a cycle's pod logs into a free-text diagnosis and, when the model
//! suggests one, a vetted command suggestion.

pub mod diagnosis;
pub mod provider;
pub mod safety;
pub mod suggestion;

pub use diagnosis::DiagnosisClient;
pub use provider::{create_provider, LlmConfig, LlmProvider};
pub use safety::{SafetyConfig, SafetyValidator};
pub use suggestion::Suggestion;
