//! Pod Log Collection
//!
//! Lists pods in a namespace and gathers their trailing log lines into a
//! per-cycle bundle. Pod-level fetch errors are recorded inline so one broken
//! pod never hides the logs of the others.

use std::collections::BTreeMap;

use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams, LogParams},
    Client,
};
use tracing::{debug, warn};

use crate::{Error, Result};

/// Pod name mapped to its (filtered) log text, or the fetch error text.
pub type LogBundle = BTreeMap<String, String>;

pub struct LogCollector {
    client: Client,
    namespace: String,
    filter_keywords: Vec<String>,
    tail_lines: i64,
}

impl LogCollector {
    pub fn new(
        client: Client,
        namespace: String,
        filter_keywords: Vec<String>,
        tail_lines: i64,
    ) -> Self {
        Self {
            client,
            namespace,
            filter_keywords,
            tail_lines,
        }
    }

    /// Fetch trailing logs for every pod in the namespace.
    ///
    /// Only the pod list call is fatal; a failed log read becomes an inline
    /// `Error fetching logs: ...` entry for that pod.
    pub async fn collect(&self) -> Result<LogBundle> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), &self.namespace);
        let pod_list = pods
            .list(&ListParams::default())
            .await
            .map_err(|e| Error::Kubernetes(e.to_string()))?;

        let params = LogParams {
            tail_lines: Some(self.tail_lines),
            ..Default::default()
        };

        let mut bundle = LogBundle::new();
        for pod in pod_list.items {
            let Some(name) = pod.metadata.name else {
                continue;
            };
            match pods.logs(&name, &params).await {
                Ok(log) => {
                    let text = if self.filter_keywords.is_empty() {
                        log
                    } else {
                        filter_lines(&log, &self.filter_keywords)
                    };
                    debug!(pod = %name, bytes = text.len(), "Collected pod logs");
                    bundle.insert(name, text);
                }
                Err(e) => {
                    warn!(pod = %name, error = %e, "Failed to fetch pod logs");
                    bundle.insert(name, format!("Error fetching logs: {}", e));
                }
            }
        }

        Ok(bundle)
    }
}

/// Keep only the lines containing at least one of the keywords.
pub fn filter_lines(log: &str, keywords: &[String]) -> String {
    log.lines()
        .filter(|line| keywords.iter().any(|k| line.contains(k.as_str())))
        .collect::<Vec<_>>()
        .join("\n")
}
