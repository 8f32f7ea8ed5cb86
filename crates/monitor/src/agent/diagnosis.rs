//! Diagnosis Client
//!
//! Serializes a log bundle into a prompt and asks the configured LLM for a
//! troubleshooting diagnosis. One call per cycle; a failure is recoverable at
//! the cycle level.

use std::sync::Arc;

use tracing::debug;

use super::provider::LlmProvider;
use crate::kubernetes::LogBundle;
use crate::{Error, Result};

/// System preamble for the troubleshooting call.
///
/// The structured action block is what the extractor prefers over free-text
/// scanning, so the model is told about it explicitly.
pub const SYSTEM_PROMPT: &str = "You are a Kubernetes troubleshooting assistant. \
Analyze the pod logs you are given and explain the most likely problem. \
If a single CLI command would fix the problem, end your response with a fenced \
json block of the form:\n\
```json\n{\"tool\": \"kubectl\", \"args\": [\"rollout\", \"restart\", \"deployment/example\"]}\n```\n\
Only suggest kubectl, kubeadm, or calicoctl commands. If no command would \
help, do not emit an action block.";

pub struct DiagnosisClient {
    provider: Arc<dyn LlmProvider>,
}

impl DiagnosisClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }

    /// Build the user prompt from a log bundle.
    pub fn build_prompt(bundle: &LogBundle) -> String {
        format!(
            "Analyze these Kubernetes logs and suggest fixes:\n{}",
            serde_json::to_string_pretty(bundle).unwrap_or_default()
        )
    }

    /// Ask the LLM for a diagnosis of the bundle. Returns the free-text
    /// response; no structure is guaranteed.
    pub async fn diagnose(&self, bundle: &LogBundle) -> Result<String> {
        let prompt = Self::build_prompt(bundle);
        debug!(pods = bundle.len(), "Requesting diagnosis");

        let response = self
            .provider
            .complete(SYSTEM_PROMPT, &prompt)
            .await
            .map_err(|e| Error::Diagnosis(e.to_string()))?;

        debug!(chars = response.len(), "Received diagnosis");
        Ok(response)
    }
}
