//! Send mode: authenticate (registering a new account when no hash is
//! available) and submit a single message.

use anyhow::{anyhow, Context, Result};
use tracing::info;

use crate::{
    cli::SendArgs,
    credentials::{self, Credentials},
    protocol::{self, SessionError},
    transport::{connect_with_retry, RetryPolicy},
};

pub async fn run(args: SendArgs) -> Result<()> {
    // The wire protocol is line-oriented; embedded newlines would be
    // interpreted as extra protocol lines.
    let display_name = args.user_name.replace('\n', "");
    let message = args.message.replace('\n', " ");

    let policy = RetryPolicy::default();
    let hash = resolve_hash(&args, &display_name, &policy).await?;

    let mut conn = connect_with_retry(&args.host, args.port, &policy)
        .await
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    let outcome = protocol::authenticate_and_submit(&mut conn, &hash, &message).await;
    conn.close().await;

    match outcome {
        Ok(()) => {
            info!("message submitted");
            Ok(())
        }
        Err(SessionError::InvalidToken) => Err(anyhow!(
            "invalid token: check the hash, or delete {} (or pass an empty --user-hash) \
             to register a new account",
            args.credentials_file.display()
        )),
        Err(error) => Err(error).context("chat session failed"),
    }
}

/// Effective hash: the one supplied on the command line, else the stored
/// one, else whatever registering a fresh account yields.
async fn resolve_hash(args: &SendArgs, display_name: &str, policy: &RetryPolicy) -> Result<String> {
    let supplied = args.user_hash.trim();
    if !supplied.is_empty() {
        return Ok(supplied.to_string());
    }

    if let Some(Credentials { account_hash }) = credentials::load(&args.credentials_file).await {
        return Ok(account_hash);
    }

    register_account(args, display_name, policy).await
}

async fn register_account(
    args: &SendArgs,
    display_name: &str,
    policy: &RetryPolicy,
) -> Result<String> {
    info!("no account hash available; registering a new account");

    let mut conn = connect_with_retry(&args.host, args.port, policy)
        .await
        .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
    let outcome = protocol::register(&mut conn, display_name).await;
    conn.close().await;

    let credentials = outcome.context("registration failed")?;
    credentials::save(&credentials, &args.credentials_file).await?;
    info!(path = %args.credentials_file.display(), "registered new account");

    Ok(credentials.account_hash)
}
