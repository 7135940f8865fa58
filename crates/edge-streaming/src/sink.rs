//! Platform-controlled streaming sink.

use std::fmt::Display;
use std::marker::PhantomData;

use edge_core::{LifecyclePhase, TimingContext, WorkloadError};
use futures::{Sink, SinkExt};

/// State of the streaming sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkState {
    /// Initial state, shell not yet sent.
    Initial,
    /// Shell has been sent, sections can be streamed.
    ShellSent,
    /// Response has been completed.
    Completed,
}

/// Platform-controlled streaming sink that enforces shell-first pattern.
///
/// Generic over any `Sink<Vec<u8>>`, e.g. the sending half of a channel
/// feeding a response body.
pub struct StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    inner: S,
    state: SinkState,
    timing: TimingContext,
    sections_sent: Vec<String>,
    bytes_sent: usize,
    _error: PhantomData<fn() -> E>,
}

impl<S, E> StreamingSink<S, E>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    /// Create a new streaming sink.
    pub fn new(sink: S, timing: TimingContext) -> Self {
        Self {
            inner: sink,
            state: SinkState::Initial,
            timing,
            sections_sent: Vec::new(),
            bytes_sent: 0,
            _error: PhantomData,
        }
    }

    /// Send the shell HTML. Must be called before any sections.
    pub async fn send_shell(&mut self, html: &str) -> Result<(), WorkloadError> {
        match self.state {
            SinkState::Initial => {}
            SinkState::ShellSent => return Err(WorkloadError::ShellAlreadySent),
            SinkState::Completed => return Err(WorkloadError::Completed),
        }

        self.write(html.as_bytes().to_vec()).await?;
        self.timing.mark_phase(&LifecyclePhase::ShellSent);
        self.state = SinkState::ShellSent;

        Ok(())
    }

    /// Send a named section. Shell must be sent first.
    ///
    /// Sections can be sent in any order after the shell.
    pub async fn send_section(&mut self, name: &str, html: &str) -> Result<(), WorkloadError> {
        self.ensure_open()?;

        self.write(html.as_bytes().to_vec()).await?;
        self.timing.mark_section_sent(name);
        self.sections_sent.push(name.to_string());

        Ok(())
    }

    /// Send raw bytes. Shell must be sent first.
    pub async fn send_raw(&mut self, bytes: Vec<u8>) -> Result<(), WorkloadError> {
        self.ensure_open()?;
        self.write(bytes).await
    }

    /// Complete the response and close the underlying sink.
    pub async fn complete(&mut self) -> Result<(), WorkloadError> {
        if self.state == SinkState::Completed {
            return Err(WorkloadError::Completed);
        }
        self.state = SinkState::Completed;
        self.timing.mark_phase(&LifecyclePhase::Completion);
        self.inner
            .close()
            .await
            .map_err(|e| WorkloadError::StreamError(e.to_string()))
    }

    fn ensure_open(&self) -> Result<(), WorkloadError> {
        match self.state {
            SinkState::Initial => Err(WorkloadError::ShellNotSent),
            SinkState::ShellSent => Ok(()),
            SinkState::Completed => Err(WorkloadError::Completed),
        }
    }

    async fn write(&mut self, bytes: Vec<u8>) -> Result<(), WorkloadError> {
        let len = bytes.len();
        self.inner
            .send(bytes)
            .await
            .map_err(|e| WorkloadError::StreamError(e.to_string()))?;
        self.bytes_sent += len;
        Ok(())
    }

    /// Get the list of sections sent.
    pub fn sections_sent(&self) -> &[String] {
        &self.sections_sent
    }

    /// Total bytes written so far.
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// Get the current lifecycle phase.
    pub fn phase(&self) -> LifecyclePhase {
        match (self.state, self.sections_sent.last()) {
            (SinkState::Initial, _) => LifecyclePhase::Start,
            (SinkState::ShellSent, None) => LifecyclePhase::ShellSent,
            (SinkState::ShellSent, Some(last)) => LifecyclePhase::SectionSent(last.clone()),
            (SinkState::Completed, _) => LifecyclePhase::Completion,
        }
    }

    /// Get timing context reference.
    pub fn timing(&self) -> &TimingContext {
        &self.timing
    }
}
