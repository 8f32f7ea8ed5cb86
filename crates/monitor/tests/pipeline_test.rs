use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use kube_medic_monitor::agent::provider::LlmProvider;
use kube_medic_monitor::agent::{DiagnosisClient, SafetyValidator};
use kube_medic_monitor::config::ExecutionMode;
use kube_medic_monitor::executor::{CommandRunner, ExecutionResult};
use kube_medic_monitor::kubernetes::LogBundle;
use kube_medic_monitor::notify::{Notifier, NotifyChannel};
use kube_medic_monitor::runner::{CycleOutcome, Pipeline};

struct StubProvider(&'static str);

#[async_trait]
impl LlmProvider for StubProvider {
    async fn complete(&self, _preamble: &str, _prompt: &str) -> anyhow::Result<String> {
        Ok(self.0.to_string())
    }
}

struct StubRunner {
    calls: AtomicUsize,
    stdout: &'static str,
}

#[async_trait]
impl CommandRunner for StubRunner {
    async fn run(&self, tool: &str, args: &[String]) -> ExecutionResult {
        assert_eq!(tool, "kubectl");
        assert_eq!(args.join(" "), "rollout restart deployment/pod-a");
        self.calls.fetch_add(1, Ordering::SeqCst);
        ExecutionResult::completed(0, self.stdout.to_string(), String::new())
    }
}

struct StubChannel {
    name: &'static str,
    fail: bool,
    messages: Mutex<Vec<String>>,
}

impl StubChannel {
    fn new(name: &'static str, fail: bool) -> Arc<Self> {
        Arc::new(Self {
            name,
            fail,
            messages: Mutex::new(vec![]),
        })
    }
}

#[async_trait]
impl NotifyChannel for StubChannel {
    fn name(&self) -> &'static str {
        self.name
    }

    async fn send(&self, message: &str) -> anyhow::Result<()> {
        self.messages.lock().unwrap().push(message.to_string());
        if self.fail {
            anyhow::bail!("simulated {} outage", self.name);
        }
        Ok(())
    }
}

fn crash_loop_bundle() -> LogBundle {
    [("pod-a".to_string(), "ERROR: crash loop".to_string())]
        .into_iter()
        .collect()
}

fn build_pipeline(
    response: &'static str,
    slack_fails: bool,
) -> (Pipeline, Arc<StubRunner>, Vec<Arc<StubChannel>>) {
    let runner = Arc::new(StubRunner {
        calls: AtomicUsize::new(0),
        stdout: "restarted",
    });
    let channels = vec![
        StubChannel::new("slack", slack_fails),
        StubChannel::new("email", false),
        StubChannel::new("grafana", false),
    ];
    let notifier = Notifier::with_channels(
        channels
            .iter()
            .map(|c| c.clone() as Arc<dyn NotifyChannel>)
            .collect(),
    );
    let pipeline = Pipeline::new(
        DiagnosisClient::new(Arc::new(StubProvider(response))),
        SafetyValidator::default(),
        runner.clone(),
        notifier,
        ExecutionMode::Enforce,
    );
    (pipeline, runner, channels)
}

const CRASH_LOOP_RESPONSE: &str =
    "Run kubectl rollout restart deployment/pod-a to fix this.";

#[tokio::test]
async fn crash_loop_scenario_runs_end_to_end() {
    let (pipeline, runner, channels) = build_pipeline(CRASH_LOOP_RESPONSE, false);

    let outcome = pipeline.process(&crash_loop_bundle()).await.unwrap();

    let CycleOutcome::FixAttempted {
        suggestion,
        result,
        record,
    } = outcome
    else {
        panic!("expected a fix attempt");
    };

    assert_eq!(suggestion.tool, "kubectl");
    assert_eq!(suggestion.args.join(" "), "rollout restart deployment/pod-a");
    assert_eq!(runner.calls.load(Ordering::SeqCst), 1);
    assert!(result.success());
    assert_eq!(result.result_text(), "restarted");

    assert!(record.all_sent());
    assert_eq!(record.deliveries.len(), 3);
    for channel in &channels {
        let messages = channel.messages.lock().unwrap();
        assert_eq!(messages.len(), 1, "{} not notified", channel.name);
        assert!(
            messages[0].contains("restarted"),
            "{} message missing execution result",
            channel.name
        );
    }
}

#[tokio::test]
async fn cycle_output_is_deterministic_for_a_fixed_bundle() {
    let (first, ..) = build_pipeline(CRASH_LOOP_RESPONSE, false);
    let (second, ..) = build_pipeline(CRASH_LOOP_RESPONSE, false);

    let bundle = crash_loop_bundle();
    let a = first.process(&bundle).await.unwrap();
    let b = second.process(&bundle).await.unwrap();

    let (CycleOutcome::FixAttempted { record: ra, .. }, CycleOutcome::FixAttempted { record: rb, .. }) =
        (a, b)
    else {
        panic!("expected fix attempts");
    };
    assert_eq!(ra.message, rb.message);
    assert_eq!(ra.deliveries, rb.deliveries);
}

#[tokio::test]
async fn slack_outage_does_not_stop_email_or_grafana() {
    let (pipeline, _runner, channels) = build_pipeline(CRASH_LOOP_RESPONSE, true);

    let outcome = pipeline.process(&crash_loop_bundle()).await.unwrap();
    let CycleOutcome::FixAttempted { record, .. } = outcome else {
        panic!("expected a fix attempt");
    };

    assert!(!record.all_sent());
    for channel in &channels {
        assert_eq!(
            channel.messages.lock().unwrap().len(),
            1,
            "{} was not attempted",
            channel.name
        );
    }
    let slack = record
        .deliveries
        .iter()
        .find(|d| d.channel == "slack")
        .unwrap();
    assert!(!slack.sent);
    assert!(record.deliveries.iter().filter(|d| d.sent).count() == 2);
}

#[tokio::test]
async fn quiet_logs_produce_no_fix_and_no_notifications() {
    let (pipeline, runner, channels) =
        build_pipeline("Logs look healthy. No action needed.", false);

    let bundle: LogBundle = [("pod-a".to_string(), "all good".to_string())]
        .into_iter()
        .collect();
    let outcome = pipeline.process(&bundle).await.unwrap();

    assert!(matches!(outcome, CycleOutcome::NoActionableFix { .. }));
    assert_eq!(runner.calls.load(Ordering::SeqCst), 0);
    for channel in &channels {
        assert!(channel.messages.lock().unwrap().is_empty());
    }
}
