//! Single-connection line transport with a retrying connect policy.
//!
//! A [`Connection`] owns exactly one TCP stream. Connect-time failures that
//! a delay is expected to fix (DNS blips, unreachable networks, refused or
//! timed-out connects) are classified as [`ConnectError::Transient`] so the
//! [`retry`] policy can sleep and try again; everything after the connect
//! succeeds is the caller's problem, with EOF surfacing as `Ok(None)` from
//! [`Connection::read_line`].

use std::{fmt, future::Future, io, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    time::sleep,
};
use tracing::{debug, warn};

const LINE_ENDINGS: &[char] = &['\n', '\r'];

/// Default delay between reconnect attempts.
pub const RECONNECT_BACKOFF: Duration = Duration::from_secs(10);

/// An open bidirectional line stream to the chat server.
///
/// Dropping the connection releases the socket; [`Connection::close`] is
/// the polite variant that shuts the write half down first.
pub struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Connection {
    /// One TCP connect attempt, no retries.
    pub async fn open(host: &str, port: u16) -> Result<Self, ConnectError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(classify_connect_error)?;
        debug!(host, port, "connected");
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    /// Reads one line, trimmed of trailing line endings. `Ok(None)` means
    /// the server closed the connection.
    pub async fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let bytes = self.reader.read_line(&mut line).await?;
        if bytes == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(LINE_ENDINGS).to_string()))
    }

    /// Writes `text` followed by `\n` and flushes.
    pub async fn write_line(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await
    }

    pub async fn close(mut self) {
        if let Err(error) = self.writer.shutdown().await {
            warn!(?error, "failed to shut the connection down cleanly");
        }
    }
}

#[derive(Debug)]
pub enum ConnectError {
    /// Expected to resolve itself after a delay; the retry policy handles it.
    Transient(io::Error),
    /// Misconfiguration or a local problem a retry will not fix.
    Fatal(io::Error),
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectError::Transient(error) => {
                write!(f, "transient connection failure: {error}")
            }
            ConnectError::Fatal(error) => write!(f, "connection failed: {error}"),
        }
    }
}

impl std::error::Error for ConnectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConnectError::Transient(error) | ConnectError::Fatal(error) => Some(error),
        }
    }
}

fn classify_connect_error(error: io::Error) -> ConnectError {
    match error.kind() {
        io::ErrorKind::PermissionDenied
        | io::ErrorKind::InvalidInput
        | io::ErrorKind::Unsupported => ConnectError::Fatal(error),
        // DNS lookup failures come through as uncategorized errors, so
        // everything else connect-time counts as transient.
        _ => ConnectError::Transient(error),
    }
}

/// How often and how long to keep retrying a transient failure.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub backoff: Duration,
    /// `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl RetryPolicy {
    pub fn unbounded(backoff: Duration) -> Self {
        Self {
            backoff,
            max_attempts: None,
        }
    }

    pub fn bounded(backoff: Duration, max_attempts: u32) -> Self {
        Self {
            backoff,
            max_attempts: Some(max_attempts),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::unbounded(RECONNECT_BACKOFF)
    }
}

/// Runs `operation` until it succeeds, fails fatally, or exhausts the
/// policy's attempts, sleeping `policy.backoff` after each transient
/// failure. This is the only place in the crate that sleeps-and-retries.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, mut operation: F) -> Result<T, ConnectError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ConnectError>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(ConnectError::Transient(error)) => {
                if policy.max_attempts.is_some_and(|max| attempt >= max) {
                    return Err(ConnectError::Transient(error));
                }
                warn!(
                    ?error,
                    backoff_secs = policy.backoff.as_secs(),
                    "connection error: check your internet connection"
                );
                sleep(policy.backoff).await;
            }
            Err(fatal) => return Err(fatal),
        }
    }
}

/// Connects with retry-on-transient-failure per `policy`.
pub async fn connect_with_retry(
    host: &str,
    port: u16,
    policy: &RetryPolicy,
) -> Result<Connection, ConnectError> {
    retry(policy, || Connection::open(host, port)).await
}
