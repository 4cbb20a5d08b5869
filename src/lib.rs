//! Line-oriented TCP chat client for the minechat protocol.
//!
//! The server speaks newline-delimited UTF-8 text: a handful of literal
//! prompts drive authentication and registration, credentials travel as a
//! single-line JSON object, and everything else is chat. Each module
//! focuses on a concrete responsibility:
//!
//! - [`cli`] parses the command-line interface for listen and send modes.
//! - [`transport`] owns one TCP connection at a time, exposing read-line /
//!   write-line operations plus the retry-with-backoff connect policy.
//! - [`protocol`] classifies server lines and runs the handshake state
//!   machine for registration and message submission.
//! - [`credentials`] loads and persists the server-issued account hash.
//! - [`listener`] streams incoming chat into a timestamped history file
//!   until cancelled, reconnecting whenever the server drops us.
//! - [`sender`] authenticates (registering a new account when necessary)
//!   and submits a single message.
//!
//! Integration tests use this crate directly against scripted TCP servers
//! to exercise the handshake and the reconnect behavior.

pub mod cli;
pub mod credentials;
pub mod listener;
pub mod protocol;
pub mod sender;
pub mod transport;
