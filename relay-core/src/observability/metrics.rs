use prometheus::{Encoder, Gauge, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// How a submission left the handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    Unauthorized,
    Rejected,
    Failed,
}

impl SubmissionOutcome {
    fn label(self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted => "accepted",
            SubmissionOutcome::Unauthorized => "unauthorized",
            SubmissionOutcome::Rejected => "rejected",
            SubmissionOutcome::Failed => "failed",
        }
    }
}

#[derive(Clone)]
pub struct MetricsCollector {
    registry: Arc<Registry>,
    submissions: IntCounterVec,
    workflow_duration: Histogram,
    notify_attempts: IntCounter,
    notify_failures: IntCounter,
    active_submissions: Gauge,
}

impl MetricsCollector {
    pub fn new() -> prometheus::Result<Self> {
        let registry = Registry::new();

        let submissions = IntCounterVec::new(
            Opts::new("relay_submissions_total", "Submissions by outcome")
                .const_label("component", "relay"),
            &["outcome"],
        )?;

        let workflow_duration = Histogram::with_opts(
            HistogramOpts::new("relay_workflow_duration_seconds", "Round workflow duration in seconds")
                .buckets(vec![0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 120.0]),
        )?;

        let notify_attempts = IntCounter::with_opts(
            Opts::new("relay_notify_attempts_total", "Evaluation callback attempts"),
        )?;

        let notify_failures = IntCounter::with_opts(
            Opts::new("relay_notify_failures_total", "Notifications abandoned after the last attempt"),
        )?;

        let active_submissions = Gauge::with_opts(
            Opts::new("relay_active_submissions", "Submissions currently being processed"),
        )?;

        registry.register(Box::new(submissions.clone()))?;
        registry.register(Box::new(workflow_duration.clone()))?;
        registry.register(Box::new(notify_attempts.clone()))?;
        registry.register(Box::new(notify_failures.clone()))?;
        registry.register(Box::new(active_submissions.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            submissions,
            workflow_duration,
            notify_attempts,
            notify_failures,
            active_submissions,
        })
    }

    pub fn record_submission(&self, outcome: SubmissionOutcome) {
        self.submissions.with_label_values(&[outcome.label()]).inc();
    }

    pub fn observe_workflow(&self, seconds: f64) {
        self.workflow_duration.observe(seconds);
    }

    pub fn record_notify_attempt(&self) {
        self.notify_attempts.inc();
    }

    pub fn record_notify_failure(&self) {
        self.notify_failures.inc();
    }

    pub fn increment_active(&self) {
        self.active_submissions.inc();
    }

    pub fn decrement_active(&self) {
        self.active_submissions.dec();
    }

    pub fn submissions(&self, outcome: SubmissionOutcome) -> u64 {
        self.submissions.with_label_values(&[outcome.label()]).get()
    }

    pub fn notify_attempts(&self) -> u64 {
        self.notify_attempts.get()
    }

    pub fn notify_failures(&self) -> u64 {
        self.notify_failures.get()
    }

    /// Prometheus text exposition format.
    pub fn export(&self) -> prometheus::Result<String> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
