//! Per-request timing metrics.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use edge_core::RequestId;
use serde::Serialize;

/// How the deferred tier ended for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DeferredOutcome {
    /// Data arrived and was rendered.
    Resolved,
    /// Fetch failed; the section rendered nothing.
    Absent,
    /// Not delivered because the response ended first.
    Abandoned,
}

impl DeferredOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resolved => "resolved",
            Self::Absent => "absent",
            Self::Abandoned => "abandoned",
        }
    }
}

/// Platform metrics for a single request.
#[derive(Debug, Clone, Serialize)]
pub struct RequestMetrics {
    pub request_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<String>,
    /// Time until critical data resolved (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_critical_us: Option<u64>,
    /// Time to shell flush (microseconds).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_to_shell_us: Option<u64>,
    /// Total request duration (microseconds).
    pub total_duration_us: u64,
    /// Microseconds from request start until each section was sent.
    pub sections: BTreeMap<String, u64>,
    /// Dependency fetches keyed by tag.
    pub dependencies: BTreeMap<String, DependencyMetrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deferred: Option<DeferredOutcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// Metrics for a dependency fetch.
#[derive(Debug, Clone, Serialize)]
pub struct DependencyMetrics {
    /// Dependency tag.
    pub tag: String,
    /// Fetch duration (microseconds).
    pub duration_us: u64,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DependencyMetrics {
    /// Successful fetch.
    pub fn ok(tag: impl Into<String>, duration: Duration) -> Self {
        Self {
            tag: tag.into(),
            duration_us: duration.as_micros() as u64,
            success: true,
            error: None,
        }
    }

    /// Failed fetch.
    pub fn failed(tag: impl Into<String>, duration: Duration, error: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            duration_us: duration.as_micros() as u64,
            success: false,
            error: Some(error.into()),
        }
    }
}

/// Collector for request metrics.
#[derive(Debug)]
pub struct MetricsCollector {
    request_id: RequestId,
    route: Option<String>,
    start: Instant,
    critical_resolved: Option<Instant>,
    shell_sent: Option<Instant>,
    sections: BTreeMap<String, Instant>,
    dependencies: BTreeMap<String, DependencyMetrics>,
    deferred: Option<DeferredOutcome>,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            route: None,
            start: Instant::now(),
            critical_resolved: None,
            shell_sent: None,
            sections: BTreeMap::new(),
            dependencies: BTreeMap::new(),
            deferred: None,
        }
    }

    /// Set route path.
    pub fn set_route(&mut self, route: impl Into<String>) {
        self.route = Some(route.into());
    }

    pub fn record_critical_resolved(&mut self) {
        self.critical_resolved = Some(Instant::now());
    }

    pub fn record_shell_sent(&mut self) {
        self.shell_sent = Some(Instant::now());
    }

    /// Record a section being written. The first write wins.
    pub fn record_section_sent(&mut self, name: &str) {
        self.sections
            .entry(name.to_string())
            .or_insert_with(Instant::now);
    }

    /// Record a dependency fetch.
    pub fn record_dependency(&mut self, metrics: DependencyMetrics) {
        self.dependencies.insert(metrics.tag.clone(), metrics);
    }

    pub fn record_deferred(&mut self, outcome: DeferredOutcome) {
        self.deferred = Some(outcome);
    }

    /// Deferred outcome recorded so far.
    pub fn deferred(&self) -> Option<DeferredOutcome> {
        self.deferred
    }

    /// Get total elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Finalize and return the metrics.
    pub fn finalize(self, status_code: Option<u16>) -> RequestMetrics {
        let start = self.start;
        let since = |t: Instant| t.duration_since(start).as_micros() as u64;

        RequestMetrics {
            request_id: self.request_id.to_string(),
            route: self.route,
            time_to_critical_us: self.critical_resolved.map(since),
            time_to_shell_us: self.shell_sent.map(since),
            total_duration_us: start.elapsed().as_micros() as u64,
            sections: self
                .sections
                .into_iter()
                .map(|(name, t)| (name, since(t)))
                .collect(),
            dependencies: self.dependencies,
            deferred: self.deferred,
            status_code,
        }
    }
}

impl RequestMetrics {
    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let ms = |us: u64| us as f64 / 1000.0;
        let mut lines = vec![format!("Request: {}", self.request_id)];

        if let Some(ttc) = self.time_to_critical_us {
            lines.push(format!("  Time to critical: {:.2}ms", ms(ttc)));
        }
        if let Some(tts) = self.time_to_shell_us {
            lines.push(format!("  Time to shell: {:.2}ms", ms(tts)));
        }
        lines.push(format!("  Total: {:.2}ms", ms(self.total_duration_us)));

        for (name, sent) in &self.sections {
            lines.push(format!("    {} sent at {:.2}ms", name, ms(*sent)));
        }

        for dep in self.dependencies.values() {
            let status = if dep.success { "ok" } else { "FAILED" };
            lines.push(format!(
                "    {} [{}]: {:.2}ms",
                dep.tag,
                status,
                ms(dep.duration_us)
            ));
        }

        if let Some(deferred) = self.deferred {
            lines.push(format!("  Deferred: {:?}", deferred));
        }

        lines.join("\n")
    }
}
