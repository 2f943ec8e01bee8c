//! Framed transport (§4.1): `Content-Length`-delimited messages over an
//! arbitrary `AsyncRead`/`AsyncWrite` pair, decoupled from the dispatcher by
//! two `tokio::sync::mpsc` queues. Header-then-body reading follows the
//! `BufReader::read_line`-for-headers, `read_exact`-for-body split used by
//! `other_examples`' stoat `StdioTransport`; the two-background-worker
//! shape and the fatal-vs-skip malformed-header policy follow
//! `original_source`'s `jsonrpc.h` (`method_read`/`method_write`,
//! `parse_error_strategy::exception | skip`).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

/// How a malformed `Content-Length`/header line is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HeaderErrorPolicy {
    /// Abort the reader task (and, transitively, the process) on the first
    /// malformed header.
    Fatal,
    /// Drop the offending header block and resume reading at the next
    /// message boundary.
    #[default]
    Skip,
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("malformed header line: {0}")]
    MalformedHeader(String),
    #[error("missing Content-Length header")]
    MissingContentLength,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

const IDLE_POLL: Duration = Duration::from_millis(10);

/// Spawns the reader and writer background tasks, returning the queues the
/// dispatcher pumps. `terminate` is shared with the caller so the
/// dispatcher can ask both tasks to stop after `shutdown`/`exit`.
pub struct Transport {
    pub inbound: mpsc::UnboundedReceiver<String>,
    pub outbound: mpsc::UnboundedSender<String>,
    pub terminate: Arc<AtomicBool>,
}

impl Transport {
    pub fn spawn<R, W>(reader: R, writer: W, policy: HeaderErrorPolicy) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let terminate = Arc::new(AtomicBool::new(false));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        tokio::spawn(read_loop(BufReader::new(reader), inbound_tx, policy, terminate.clone()));
        tokio::spawn(write_loop(writer, outbound_rx, terminate.clone()));

        Transport { inbound: inbound_rx, outbound: outbound_tx, terminate }
    }

    pub fn request_shutdown(&self) {
        self.terminate.store(true, Ordering::Relaxed);
    }
}

async fn read_loop<R: AsyncBufRead + Unpin>(
    mut reader: R,
    inbound: mpsc::UnboundedSender<String>,
    policy: HeaderErrorPolicy,
    terminate: Arc<AtomicBool>,
) {
    loop {
        if terminate.load(Ordering::Relaxed) {
            break;
        }
        match tokio::time::timeout(IDLE_POLL, read_one_message(&mut reader, policy)).await {
            Ok(Ok(Some(body))) => {
                if inbound.send(body).is_err() {
                    break;
                }
            }
            Ok(Ok(None)) => break, // EOF
            Ok(Err(err)) => {
                tracing::error!(%err, "transport read error");
                if policy == HeaderErrorPolicy::Fatal {
                    break;
                }
            }
            Err(_elapsed) => continue,
        }
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut outbound: mpsc::UnboundedReceiver<String>,
    terminate: Arc<AtomicBool>,
) {
    loop {
        if terminate.load(Ordering::Relaxed) {
            break;
        }
        match tokio::time::timeout(IDLE_POLL, outbound.recv()).await {
            Ok(Some(body)) => {
                if write_one_message(&mut writer, &body).await.is_err() {
                    break;
                }
            }
            Ok(None) => break, // sender dropped
            Err(_elapsed) => continue,
        }
    }
}

/// Reads one `Content-Length`-framed message, or `Ok(None)` on clean EOF
/// before any header bytes arrive.
async fn read_one_message<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    policy: HeaderErrorPolicy,
) -> Result<Option<String>, TransportError> {
    // Skip mode retries at the next message boundary whenever a header
    // block comes out malformed or yields no usable Content-Length; fatal
    // mode surfaces the first such problem to the caller.
    loop {
        match read_one_header_block(reader, policy).await? {
            HeaderOutcome::Eof => return Ok(None),
            HeaderOutcome::Skipped => continue,
            HeaderOutcome::ContentLength(len) => {
                let mut body = vec![0u8; len];
                tokio::io::AsyncReadExt::read_exact(reader, &mut body).await?;
                return Ok(Some(String::from_utf8_lossy(&body).into_owned()));
            }
        }
    }
}

enum HeaderOutcome {
    Eof,
    Skipped,
    ContentLength(usize),
}

async fn read_one_header_block<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    policy: HeaderErrorPolicy,
) -> Result<HeaderOutcome, TransportError> {
    let mut content_length: Option<usize> = None;
    let mut saw_any_header = false;
    loop {
        let mut line = String::new();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            return Ok(HeaderOutcome::Eof);
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        saw_any_header = true;
        match parse_header(trimmed) {
            Some(("Content-Length", value)) => match value.trim().parse::<usize>() {
                Ok(len) => content_length = Some(len),
                Err(_) if policy == HeaderErrorPolicy::Skip => {}
                Err(_) => return Err(TransportError::MalformedHeader(trimmed.to_string())),
            },
            Some(_) => {} // other headers (e.g. Content-Type) are ignored
            None if policy == HeaderErrorPolicy::Skip => {}
            None => return Err(TransportError::MalformedHeader(trimmed.to_string())),
        }
    }
    match content_length {
        Some(len) => Ok(HeaderOutcome::ContentLength(len)),
        None if saw_any_header && policy == HeaderErrorPolicy::Skip => Ok(HeaderOutcome::Skipped),
        None if saw_any_header => Err(TransportError::MissingContentLength),
        None => Ok(HeaderOutcome::Eof),
    }
}

fn parse_header(line: &str) -> Option<(&str, &str)> {
    line.split_once(':').map(|(k, v)| (k.trim(), v.trim()))
}

async fn write_one_message<W: AsyncWrite + Unpin>(writer: &mut W, body: &str) -> std::io::Result<()> {
    let header = format!("Content-Length: {}\r\nContent-Type: application/json-rpc;charset=utf-8\r\n\r\n", body.len());
    writer.write_all(header.as_bytes()).await?;
    writer.write_all(body.as_bytes()).await?;
    writer.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn single_message_round_trips() {
        let (client, server) = duplex(4096);
        let (client_read, mut client_write) = tokio::io::split(client);
        let transport = Transport::spawn(client_read, tokio::io::sink(), HeaderErrorPolicy::Skip);
        drop(transport);

        let (server_read, mut server_write) = tokio::io::split(server);
        let mut reader = BufReader::new(server_read);
        write_one_message(&mut server_write, "hello").await.unwrap();
        drop(server_write);
        let got = read_one_message(&mut reader, HeaderErrorPolicy::Skip).await.unwrap();
        assert_eq!(got.as_deref(), Some("hello"));
        drop(client_write);
    }

    #[tokio::test]
    async fn two_back_to_back_messages_arrive_in_order() {
        let (mut w, r) = duplex(4096);
        write_one_message(&mut w, "first").await.unwrap();
        write_one_message(&mut w, "second").await.unwrap();
        drop(w);
        let mut reader = BufReader::new(r);
        let first = read_one_message(&mut reader, HeaderErrorPolicy::Skip).await.unwrap();
        let second = read_one_message(&mut reader, HeaderErrorPolicy::Skip).await.unwrap();
        assert_eq!(first.as_deref(), Some("first"));
        assert_eq!(second.as_deref(), Some("second"));
    }

    #[tokio::test]
    async fn skip_mode_recovers_after_malformed_header() {
        let (mut w, r) = duplex(4096);
        tokio::io::AsyncWriteExt::write_all(&mut w, b"Content-Length: banana\r\n\r\n").await.unwrap();
        write_one_message(&mut w, "next").await.unwrap();
        drop(w);
        let mut reader = BufReader::new(r);
        let next = read_one_message(&mut reader, HeaderErrorPolicy::Skip).await.unwrap();
        assert_eq!(next.as_deref(), Some("next"));
    }

    #[tokio::test]
    async fn fatal_mode_errors_on_malformed_header() {
        let (mut w, r) = duplex(4096);
        tokio::io::AsyncWriteExt::write_all(&mut w, b"Content-Length: banana\r\n\r\n").await.unwrap();
        drop(w);
        let mut reader = BufReader::new(r);
        let err = read_one_message(&mut reader, HeaderErrorPolicy::Fatal).await;
        assert!(err.is_err());
    }
}
