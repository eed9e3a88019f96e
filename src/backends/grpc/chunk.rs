//! Splitting payloads into stream messages.
//!
//! Every file sent over a streaming call becomes a run of
//! [`ScanStreamRequest`]s: the filename rides on the first message, every
//! message carries at most `chunk_size` bytes, and exactly one message (the
//! final one) has `is_last` set. An empty payload is a single empty message
//! with both the filename and `is_last`.

use super::proto::ScanStreamRequest;
use crate::core::SdkError;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc::Sender;

/// Failure while feeding a request stream.
#[derive(Debug, Error)]
pub(crate) enum ChunkError {
    /// The call ended and dropped its side of the request stream.
    #[error("request stream closed")]
    Closed,

    /// The source reader failed.
    #[error("failed to read data")]
    Read(#[source] std::io::Error),
}

impl From<ChunkError> for SdkError {
    fn from(err: ChunkError) -> Self {
        match err {
            ChunkError::Closed => SdkError::connection("request stream closed"),
            ChunkError::Read(e) => SdkError::validation("failed to read data").with_source(e),
        }
    }
}

/// Splits an in-memory payload into stream messages.
pub(crate) fn chunks<'a>(
    data: &'a [u8],
    filename: &'a str,
    chunk_size: usize,
) -> impl Iterator<Item = ScanStreamRequest> + 'a {
    let chunk_size = chunk_size.max(1);
    let total = data.len().div_ceil(chunk_size).max(1);

    (0..total).map(move |index| {
        let start = index * chunk_size;
        let end = (start + chunk_size).min(data.len());
        ScanStreamRequest {
            chunk: data[start..end].to_vec(),
            filename: if index == 0 {
                filename.to_string()
            } else {
                String::new()
            },
            is_last: index + 1 == total,
        }
    })
}

/// Sends an in-memory payload. Returns the number of messages sent.
pub(crate) async fn send_bytes(
    tx: &Sender<ScanStreamRequest>,
    data: &[u8],
    filename: &str,
    chunk_size: usize,
) -> Result<usize, ChunkError> {
    let mut sent = 0;
    for message in chunks(data, filename, chunk_size) {
        tx.send(message).await.map_err(|_| ChunkError::Closed)?;
        sent += 1;
    }
    Ok(sent)
}

/// Streams `reader` without buffering it whole. Returns the bytes sent.
///
/// One chunk of read-ahead is kept so the final message can be flagged.
pub(crate) async fn send_reader<R>(
    tx: &Sender<ScanStreamRequest>,
    reader: &mut R,
    filename: &str,
    chunk_size: usize,
) -> Result<u64, ChunkError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let chunk_size = chunk_size.max(1);

    let mut pending = fill(reader, chunk_size).await?;
    if pending.is_empty() {
        let empty = ScanStreamRequest {
            chunk: Vec::new(),
            filename: filename.to_string(),
            is_last: true,
        };
        tx.send(empty).await.map_err(|_| ChunkError::Closed)?;
        return Ok(0);
    }

    let mut total = 0u64;
    let mut first = true;
    loop {
        // A short chunk means the reader is exhausted.
        let next = if pending.len() < chunk_size {
            Vec::new()
        } else {
            fill(reader, chunk_size).await?
        };
        let is_last = next.is_empty();

        total += pending.len() as u64;
        let message = ScanStreamRequest {
            chunk: pending,
            filename: if first {
                filename.to_string()
            } else {
                String::new()
            },
            is_last,
        };
        first = false;
        tx.send(message).await.map_err(|_| ChunkError::Closed)?;

        if is_last {
            return Ok(total);
        }
        pending = next;
    }
}

/// Reads until `size` bytes are buffered or the reader is exhausted.
async fn fill<R>(reader: &mut R, size: usize) -> Result<Vec<u8>, ChunkError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut buf = Vec::with_capacity(size);
    reader
        .take(size as u64)
        .read_to_end(&mut buf)
        .await
        .map_err(ChunkError::Read)?;
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::ReadBuf;
    use tokio::sync::mpsc;

    fn assert_well_formed(messages: &[ScanStreamRequest], data: &[u8], filename: &str, chunk_size: usize) {
        assert!(!messages.is_empty());
        assert_eq!(messages[0].filename, filename);
        assert!(messages[1..].iter().all(|m| m.filename.is_empty()));
        assert_eq!(messages.iter().filter(|m| m.is_last).count(), 1);
        assert!(messages.last().unwrap().is_last);
        assert!(messages.iter().all(|m| m.chunk.len() <= chunk_size));

        let joined: Vec<u8> = messages.iter().flat_map(|m| m.chunk.iter().copied()).collect();
        assert_eq!(joined, data);
    }

    async fn drain(mut rx: mpsc::Receiver<ScanStreamRequest>) -> Vec<ScanStreamRequest> {
        let mut out = Vec::new();
        while let Some(message) = rx.recv().await {
            out.push(message);
        }
        out
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<std::io::Result<()>> {
            Poll::Ready(Err(std::io::Error::other("disk gone")))
        }
    }

    #[rstest]
    #[case(10, 4, 3)]
    #[case(8, 4, 2)]
    #[case(1, 4, 1)]
    #[case(4, 4, 1)]
    #[case(100_000, 65_536, 2)]
    fn test_chunks_layout(#[case] len: usize, #[case] chunk_size: usize, #[case] expected: usize) {
        let data: Vec<u8> = (0..len).map(|i| (i % 251) as u8).collect();
        let messages: Vec<_> = chunks(&data, "sample.bin", chunk_size).collect();
        assert_eq!(messages.len(), expected);
        assert_well_formed(&messages, &data, "sample.bin", chunk_size);
    }

    #[test]
    fn test_chunks_empty_payload() {
        let messages: Vec<_> = chunks(&[], "empty.txt", 4).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].chunk.is_empty());
        assert_eq!(messages[0].filename, "empty.txt");
        assert!(messages[0].is_last);
    }

    #[tokio::test]
    async fn test_send_bytes() {
        let (tx, rx) = mpsc::channel(16);
        let data = b"0123456789".to_vec();
        let sent = send_bytes(&tx, &data, "digits.txt", 3).await.unwrap();
        drop(tx);

        assert_eq!(sent, 4);
        let messages = drain(rx).await;
        assert_well_formed(&messages, &data, "digits.txt", 3);
    }

    #[tokio::test]
    async fn test_send_bytes_closed_stream() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = send_bytes(&tx, b"data", "a.txt", 2).await.unwrap_err();
        assert!(matches!(err, ChunkError::Closed));
    }

    #[rstest]
    #[case(10, 4)]
    #[case(8, 4)]
    #[case(3, 4)]
    #[case(4096, 1000)]
    #[tokio::test]
    async fn test_send_reader(#[case] len: usize, #[case] chunk_size: usize) {
        let data: Vec<u8> = (0..len).map(|i| (i % 7) as u8).collect();
        let (tx, rx) = mpsc::channel(1024);

        let mut reader = std::io::Cursor::new(data.clone());
        let total = send_reader(&tx, &mut reader, "reader.bin", chunk_size).await.unwrap();
        drop(tx);

        assert_eq!(total, len as u64);
        let messages = drain(rx).await;
        assert_eq!(messages.len(), len.div_ceil(chunk_size));
        assert_well_formed(&messages, &data, "reader.bin", chunk_size);
    }

    #[tokio::test]
    async fn test_send_reader_empty() {
        let (tx, rx) = mpsc::channel(4);
        let mut reader: &[u8] = &[];
        let total = send_reader(&tx, &mut reader, "nothing.txt", 64).await.unwrap();
        drop(tx);

        assert_eq!(total, 0);
        let messages = drain(rx).await;
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_last);
        assert_eq!(messages[0].filename, "nothing.txt");
    }

    #[tokio::test]
    async fn test_send_reader_read_failure() {
        let (tx, _rx) = mpsc::channel(4);
        let err = send_reader(&tx, &mut FailingReader, "bad.bin", 64)
            .await
            .unwrap_err();
        assert!(matches!(err, ChunkError::Read(_)));
        assert!(SdkError::from(err).is_validation());
    }
}
