use axum::Json;
use serde_json::{json, Value};

use crate::metrics::gather_metrics;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

pub async fn metrics() -> String {
    gather_metrics()
}
