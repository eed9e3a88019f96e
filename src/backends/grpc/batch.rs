//! Multi-file scanning over one bidirectional stream.
//!
//! A batch runs two tasks against a single session:
//!
//! - the sender resolves each [`FileInput`] and writes its chunks, then
//!   half-closes the request stream once;
//! - the receiver forwards every server verdict until the response stream
//!   ends, fails, or the batch is cancelled.
//!
//! Local failures (an unreadable path, a send that cannot complete) become
//! `ERROR` results for that file and the batch moves on. A session failure
//! becomes one final `ERROR` result. Cancellation ends the batch silently.
//! Results are buffered for `2 * files + 1` entries, and every delivery also
//! watches for cancellation, so a consumer that stops reading never leaves
//! either task blocked.

use super::chunk::send_bytes;
use super::proto::{ScanResponse, ScanStreamRequest};
use super::status::map_status;
use crate::core::{FileInput, Result, ScanResult, SdkError};

use futures::{Stream, StreamExt};
use pin_project_lite::pin_project;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::{CancellationToken, DropGuard};
use tonic::{Code, Status};
use uuid::Uuid;

/// Outbound messages buffered ahead of the transport.
const REQUEST_BUFFER: usize = 16;

pin_project! {
    /// Verdicts of a multi-file scan, in arrival order.
    ///
    /// The stream ends when the service has answered every file, the session
    /// fails (after one final `ERROR` result), or the batch is cancelled.
    /// Dropping it cancels the session.
    ///
    /// Expect one result per file, but not exactly: a session that fails
    /// after answering every file still yields its trailing `ERROR` result,
    /// which carries no filename. Match results to files by filename rather
    /// than by count.
    pub struct ScanResults {
        #[pin]
        inner: ReceiverStream<ScanResult>,
        batch_id: Uuid,
        _cancel_on_drop: DropGuard,
    }
}

impl ScanResults {
    /// Returns the identifier recorded on this batch's log events.
    pub fn batch_id(&self) -> Uuid {
        self.batch_id
    }

    /// Collects every remaining result.
    pub async fn collect_all(self) -> Vec<ScanResult> {
        self.collect().await
    }
}

impl std::fmt::Debug for ScanResults {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanResults")
            .field("batch_id", &self.batch_id)
            .finish_non_exhaustive()
    }
}

impl Stream for ScanResults {
    type Item = ScanResult;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.project().inner.poll_next(cx)
    }
}

/// Starts a batch over the session produced by `open`.
///
/// `open` receives the outbound request stream and resolves to the inbound
/// response stream. Failing to open the session, or the context ending
/// before it opens, is returned as an error.
pub(crate) async fn start<O, Fut, S>(
    files: Vec<FileInput>,
    chunk_size: usize,
    deadline: Instant,
    parent: &CancellationToken,
    open: O,
) -> Result<ScanResults>
where
    O: FnOnce(ReceiverStream<ScanStreamRequest>) -> Fut,
    Fut: Future<Output = std::result::Result<S, Status>>,
    S: Stream<Item = std::result::Result<ScanResponse, Status>> + Send + Unpin + 'static,
{
    let batch_id = Uuid::new_v4();
    let token = parent.child_token();
    let cancel_on_drop = token.clone().drop_guard();

    let (results_tx, results_rx) = mpsc::channel(files.len() * 2 + 1);
    let (requests_tx, requests_rx) = mpsc::channel(REQUEST_BUFFER);

    tracing::info!(batch_id = %batch_id, files = files.len(), "Starting batch scan");

    tokio::spawn(send_files(
        batch_id,
        files,
        chunk_size,
        requests_tx,
        results_tx.clone(),
        token.clone(),
    ));

    let session = tokio::select! {
        biased;
        _ = token.cancelled() => return Err(SdkError::timeout("request canceled")),
        _ = tokio::time::sleep_until(deadline) => {
            return Err(SdkError::timeout("deadline exceeded"))
        }
        opened = open(ReceiverStream::new(requests_rx)) => opened.map_err(map_status)?,
    };

    tokio::spawn(receive_results(batch_id, session, deadline, results_tx, token));

    Ok(ScanResults {
        inner: ReceiverStream::new(results_rx),
        batch_id,
        _cancel_on_drop: cancel_on_drop,
    })
}

async fn send_files(
    batch_id: Uuid,
    files: Vec<FileInput>,
    chunk_size: usize,
    requests: mpsc::Sender<ScanStreamRequest>,
    results: mpsc::Sender<ScanResult>,
    token: CancellationToken,
) {
    for input in files {
        if token.is_cancelled() {
            return;
        }

        let filename = input.filename().to_string();
        let outcome = match input.into_data().await {
            Ok((data, name)) => tokio::select! {
                biased;
                _ = token.cancelled() => return,
                sent = send_bytes(&requests, &data, &name, chunk_size) => {
                    sent.map(|_| ()).map_err(SdkError::from)
                }
            },
            Err(e) => Err(e),
        };

        if let Err(err) = outcome {
            tracing::warn!(
                batch_id = %batch_id,
                filename = %filename,
                error = %err,
                "File not submitted"
            );
            let failed = ScanResult::error(err.to_string()).with_filename(filename);
            if !deliver(&results, &token, failed).await {
                return;
            }
        }
    }

    tracing::debug!(batch_id = %batch_id, "All files submitted");
    // `requests` drops here, half-closing the session.
}

async fn receive_results<S>(
    batch_id: Uuid,
    mut session: S,
    deadline: Instant,
    results: mpsc::Sender<ScanResult>,
    token: CancellationToken,
) where
    S: Stream<Item = std::result::Result<ScanResponse, Status>> + Unpin,
{
    // Whatever ends the receiver also stops the sender.
    let _stop_sender = token.clone().drop_guard();
    let mut received = 0usize;

    loop {
        let next = tokio::select! {
            biased;
            _ = token.cancelled() => {
                tracing::debug!(batch_id = %batch_id, received, "Batch cancelled");
                return;
            }
            _ = tokio::time::sleep_until(deadline) => {
                tracing::warn!(batch_id = %batch_id, received, "Batch deadline exceeded");
                let failed = ScanResult::error(SdkError::timeout("deadline exceeded").to_string());
                deliver(&results, &token, failed).await;
                return;
            }
            next = session.next() => next,
        };

        match next {
            None => {
                tracing::info!(batch_id = %batch_id, received, "Batch scan completed");
                return;
            }
            Some(Ok(response)) => {
                received += 1;
                if !deliver(&results, &token, response.into()).await {
                    return;
                }
            }
            Some(Err(status)) if status.code() == Code::Cancelled => return,
            Some(Err(status)) => {
                let err = map_status(status);
                tracing::warn!(
                    batch_id = %batch_id,
                    received,
                    error = %err,
                    "Batch session failed"
                );
                deliver(&results, &token, ScanResult::error(err.to_string())).await;
                return;
            }
        }
    }
}

/// Delivers one result unless the batch is cancelled first.
async fn deliver(
    results: &mpsc::Sender<ScanResult>,
    token: &CancellationToken,
    result: ScanResult,
) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = results.send(result) => sent.is_ok(),
    }
}

impl From<ScanResponse> for ScanResult {
    fn from(response: ScanResponse) -> Self {
        ScanResult::new(response.status.into(), response.message)
            .with_scan_time(response.scan_time)
            .with_filename(response.filename)
    }
}
