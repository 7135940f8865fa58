//! Request lifecycle tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Lifecycle phases for a page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecyclePhase {
    /// Request received, deferred fetch started.
    Start,
    /// Waiting on the critical tier.
    CriticalPending,
    /// Critical tier resolved, page can be committed.
    CriticalResolved,
    /// Shell HTML has been flushed to client.
    ShellSent,
    /// A named section has been sent.
    SectionSent(String),
    /// Request completed successfully.
    Completion,
    /// An error occurred.
    Error(String),
}

impl LifecyclePhase {
    /// Short name used as a log field.
    pub fn name(&self) -> &str {
        match self {
            Self::Start => "start",
            Self::CriticalPending => "critical_pending",
            Self::CriticalResolved => "critical_resolved",
            Self::ShellSent => "shell_sent",
            Self::SectionSent(_) => "section_sent",
            Self::Completion => "completion",
            Self::Error(_) => "error",
        }
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Record the mark for a lifecycle phase.
    pub fn mark_phase(&mut self, phase: &LifecyclePhase) {
        match phase {
            LifecyclePhase::SectionSent(section) => self.mark_section_sent(section),
            other => self.mark(other.name()),
        }
    }

    /// Mark section sent.
    pub fn mark_section_sent(&mut self, section: &str) {
        self.mark(&format!("section_{}_sent", section));
    }

    /// Offset of a named mark from request start.
    pub fn since_start(&self, mark: &str) -> Option<Duration> {
        self.marks.get(mark).map(|t| t.duration_since(self.start))
    }

    /// Get time until the critical tier resolved.
    pub fn time_to_critical(&self) -> Option<Duration> {
        self.since_start("critical_resolved")
    }

    /// Get time to shell flush.
    pub fn time_to_shell(&self) -> Option<Duration> {
        self.since_start("shell_sent")
    }

    /// Get time to first section.
    pub fn time_to_first_section(&self) -> Option<Duration> {
        self.marks
            .iter()
            .filter(|(k, _)| k.ends_with("_sent") && k.starts_with("section_"))
            .map(|(_, t)| t.duration_since(self.start))
            .min()
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_marks() {
        let mut timing = TimingContext::new();
        assert!(timing.time_to_critical().is_none());

        timing.mark_phase(&LifecyclePhase::CriticalResolved);
        timing.mark_phase(&LifecyclePhase::ShellSent);

        let critical = timing.time_to_critical().unwrap();
        let shell = timing.time_to_shell().unwrap();
        assert!(shell >= critical);
    }

    #[test]
    fn test_first_section() {
        let mut timing = TimingContext::new();
        assert!(timing.time_to_first_section().is_none());

        timing.mark_phase(&LifecyclePhase::SectionSent("hero".into()));
        timing.mark_phase(&LifecyclePhase::SectionSent("footer".into()));
        assert_eq!(
            timing.time_to_first_section(),
            timing.since_start("section_hero_sent")
        );
    }

    #[test]
    fn test_phase_names() {
        assert_eq!(LifecyclePhase::CriticalPending.name(), "critical_pending");
        assert_eq!(LifecyclePhase::Error("x".into()).name(), "error");
    }
}
