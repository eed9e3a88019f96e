//! Per-call execution context.
//!
//! A [`ScanContext`] carries the caller's deadline and cancellation signal
//! into every operation. Both transports resolve it against their default
//! timeout and race the network call against it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::core::error::{Result, SdkError};

/// Deadline and cancellation for a single call.
///
/// Cloning a context shares its cancellation signal: cancelling any clone
/// cancels them all.
#[derive(Debug, Clone, Default)]
pub struct ScanContext {
    /// Absolute deadline for the call, if any.
    pub deadline: Option<Instant>,

    /// Request or correlation ID recorded on tracing spans.
    pub request_id: Option<String>,

    cancel: CancellationToken,
}

impl ScanContext {
    /// Creates a context with no deadline and a fresh cancellation signal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Sets a deadline `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Uses an existing cancellation token, e.g. one shared with a server shutdown.
    pub fn with_cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Sets the request ID.
    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// Returns the cancellation token of this context.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Cancels every call running under this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Returns `true` once the context was cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// The context deadline if set, otherwise `timeout` from now.
    pub(crate) fn deadline_or(&self, timeout: Duration) -> Instant {
        self.deadline.unwrap_or_else(|| Instant::now() + timeout)
    }

    /// The earlier of the context deadline and `timeout` from now.
    pub(crate) fn earliest_deadline(&self, timeout: Duration) -> Instant {
        let fallback = Instant::now() + timeout;
        match self.deadline {
            Some(deadline) => deadline.min(fallback),
            None => fallback,
        }
    }

    /// Fails fast if the context is already cancelled or `deadline` has passed.
    pub(crate) fn check(&self, deadline: Instant) -> Result<()> {
        if self.is_cancelled() {
            return Err(SdkError::timeout("request canceled"));
        }
        if deadline <= Instant::now() {
            return Err(SdkError::timeout("deadline exceeded"));
        }
        Ok(())
    }

    /// Runs `fut` until it completes, the context is cancelled, or `deadline` passes.
    ///
    /// Losing the race drops `fut`, which aborts any request it had in flight.
    pub(crate) async fn run<T, F>(&self, deadline: Instant, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(deadline)?;

        let span = tracing::debug_span!(
            "call",
            request_id = self.request_id.as_deref().unwrap_or_default()
        );
        async {
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => Err(SdkError::timeout("request canceled")),
                _ = tokio::time::sleep_until(deadline) => Err(SdkError::timeout("deadline exceeded")),
                result = fut => result,
            }
        }
        .instrument(span)
        .await
    }
}
