use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref CYCLES_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "kubemedic_cycles_total",
        "Total number of monitor cycles started."
    ))
    .unwrap();
    pub static ref CYCLE_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "kubemedic_cycle_failures_total",
        "Total number of monitor cycles that failed and were skipped."
    ))
    .unwrap();
    pub static ref FIXES_EXECUTED_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "kubemedic_fixes_executed_total",
        "Total number of suggested fixes that were executed."
    ))
    .unwrap();
    pub static ref NOTIFY_FAILURES_TOTAL: IntCounter = IntCounter::with_opts(Opts::new(
        "kubemedic_notify_failures_total",
        "Total number of failed notification channel deliveries."
    ))
    .unwrap();
}

pub fn register_metrics() {
    REGISTRY
        .register(Box::new(CYCLES_TOTAL.clone()))
        .expect("Failed to register CYCLES_TOTAL");
    REGISTRY
        .register(Box::new(CYCLE_FAILURES_TOTAL.clone()))
        .expect("Failed to register CYCLE_FAILURES_TOTAL");
    REGISTRY
        .register(Box::new(FIXES_EXECUTED_TOTAL.clone()))
        .expect("Failed to register FIXES_EXECUTED_TOTAL");
    REGISTRY
        .register(Box::new(NOTIFY_FAILURES_TOTAL.clone()))
        .expect("Failed to register NOTIFY_FAILURES_TOTAL");
}

pub fn gather_metrics() -> String {
    let mut buffer = vec![];
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .expect("Failed to encode metrics");
    String::from_utf8(buffer).expect("Failed to convert metrics to string")
}
