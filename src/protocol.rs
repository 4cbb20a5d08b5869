//! Server-line classification and the handshake state machine.
//!
//! Every line the server sends is classified exactly once into a
//! [`ServerLine`] tag, checked strictly in order: exact prompt match on the
//! trimmed text first, then JSON, then plain-text fallback. The session
//! functions are pure transitions over those tags, so the protocol logic
//! tests independently of how lines were parsed.

use std::{fmt, io};

use serde_json::Value;
use tracing::debug;

use crate::{credentials::Credentials, transport::Connection};

/// Sent when the server wants a personal hash, or an empty line to open
/// registration instead.
pub const AUTH_REQUIRED: &str =
    "Hello %username%! Enter your personal hash or leave it empty to create new account.";

/// Sent during registration, after the empty-hash reply.
pub const ENTER_NICKNAME: &str = "Enter preferred nickname below:";

/// Sent once authentication succeeded; the message may now be posted.
pub const CHAT_GREETING: &str =
    "Welcome to chat! Post your message below. End it with an empty line.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    AuthRequired,
    EnterNickname,
    ChatGreeting,
}

/// One server line, classified.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerLine {
    Prompt(Prompt),
    /// JSON object carrying a non-empty `account_hash`.
    Credential(Credentials),
    /// JSON `null` or an empty object: the server rejected the hash.
    Rejection,
    /// Any other JSON value, e.g. an account-info echo after auth.
    Json(Value),
    /// Plain chat text or anything unrecognized.
    Text(String),
}

pub fn classify(line: &str) -> ServerLine {
    let trimmed = line.trim();
    match trimmed {
        AUTH_REQUIRED => return ServerLine::Prompt(Prompt::AuthRequired),
        ENTER_NICKNAME => return ServerLine::Prompt(Prompt::EnterNickname),
        CHAT_GREETING => return ServerLine::Prompt(Prompt::ChatGreeting),
        _ => {}
    }

    // JSON parse failure is not an error: it just means the line is plain text.
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Null) => ServerLine::Rejection,
        Ok(Value::Object(fields)) => {
            if fields.is_empty() {
                return ServerLine::Rejection;
            }
            match fields.get("account_hash").and_then(Value::as_str) {
                Some(hash) if !hash.is_empty() => ServerLine::Credential(Credentials {
                    account_hash: hash.to_string(),
                }),
                _ => ServerLine::Json(Value::Object(fields)),
            }
        }
        Ok(other) => ServerLine::Json(other),
        Err(_) => ServerLine::Text(trimmed.to_string()),
    }
}

#[derive(Debug)]
pub enum SessionError {
    /// The established connection was lost mid-dialogue.
    Disconnected,
    /// The server rejected the submitted account hash.
    InvalidToken,
    /// The server dialogue desynchronized; the offending line is attached.
    UnexpectedResponse(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Disconnected => write!(f, "connection to the chat server was lost"),
            SessionError::InvalidToken => write!(f, "server rejected the account hash"),
            SessionError::UnexpectedResponse(line) => {
                write!(f, "unexpected server response: {line:?}")
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<io::Error> for SessionError {
    fn from(_: io::Error) -> Self {
        SessionError::Disconnected
    }
}

/// Registers a new account: answers `AUTH_REQUIRED` with an empty line,
/// `ENTER_NICKNAME` with `display_name`, and returns the first credential
/// object the server issues. Persisting it is the caller's job.
pub async fn register(
    conn: &mut Connection,
    display_name: &str,
) -> Result<Credentials, SessionError> {
    loop {
        let Some(line) = conn.read_line().await? else {
            return Err(SessionError::Disconnected);
        };
        debug!(%line, "server");

        match classify(&line) {
            ServerLine::Prompt(Prompt::AuthRequired) => {
                // Empty hash requests a fresh account.
                conn.write_line("").await?;
            }
            ServerLine::Prompt(Prompt::EnterNickname) => {
                conn.write_line(display_name).await?;
                debug!(%display_name, "nickname sent");
            }
            ServerLine::Credential(credentials) => return Ok(credentials),
            _ => return Err(SessionError::UnexpectedResponse(line)),
        }
    }
}

/// Authenticates with `hash` and posts `message`, terminated by the blank
/// line the protocol uses to mark end-of-message. A JSON rejection fails
/// with [`SessionError::InvalidToken`] and writes nothing further; other
/// JSON lines (account-info echoes) are logged and skipped.
pub async fn authenticate_and_submit(
    conn: &mut Connection,
    hash: &str,
    message: &str,
) -> Result<(), SessionError> {
    loop {
        let Some(line) = conn.read_line().await? else {
            return Err(SessionError::Disconnected);
        };
        debug!(%line, "server");

        match classify(&line) {
            ServerLine::Prompt(Prompt::AuthRequired) => {
                conn.write_line(hash).await?;
            }
            ServerLine::Prompt(Prompt::ChatGreeting) => {
                conn.write_line(message).await?;
                conn.write_line("").await?;
                return Ok(());
            }
            ServerLine::Rejection => return Err(SessionError::InvalidToken),
            ServerLine::Credential(_) | ServerLine::Json(_) => {
                debug!("ignoring account info echo");
            }
            ServerLine::Prompt(Prompt::EnterNickname) | ServerLine::Text(_) => {
                return Err(SessionError::UnexpectedResponse(line));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompts_classify_by_exact_match() {
        assert_eq!(
            classify(AUTH_REQUIRED),
            ServerLine::Prompt(Prompt::AuthRequired)
        );
        assert_eq!(
            classify(ENTER_NICKNAME),
            ServerLine::Prompt(Prompt::EnterNickname)
        );
        assert_eq!(
            classify(CHAT_GREETING),
            ServerLine::Prompt(Prompt::ChatGreeting)
        );
        // Trailing whitespace from the wire is tolerated, prefixes are not.
        assert_eq!(
            classify("Enter preferred nickname below: \r"),
            ServerLine::Prompt(Prompt::EnterNickname)
        );
        assert_eq!(
            classify("xx Enter preferred nickname below:"),
            ServerLine::Text("xx Enter preferred nickname below:".into())
        );
    }

    #[test]
    fn credential_objects_yield_the_hash() {
        let line = r#"{"account_hash": "abc123", "nickname": "alice"}"#;
        assert_eq!(
            classify(line),
            ServerLine::Credential(Credentials {
                account_hash: "abc123".into()
            })
        );
    }

    #[test]
    fn null_and_empty_objects_are_rejections() {
        assert_eq!(classify("null"), ServerLine::Rejection);
        assert_eq!(classify("{}"), ServerLine::Rejection);
        // An empty hash is not a usable credential either, but a populated
        // object is account info, not a rejection.
        assert_eq!(
            classify(r#"{"account_hash": "", "nickname": "alice"}"#),
            ServerLine::Json(serde_json::json!({"account_hash": "", "nickname": "alice"}))
        );
    }

    #[test]
    fn everything_else_is_plain_text() {
        assert_eq!(classify("hello there"), ServerLine::Text("hello there".into()));
        assert_eq!(classify(""), ServerLine::Text(String::new()));
    }
}
