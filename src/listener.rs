//! Listen mode: stream chat into a timestamped history file until cancelled.

use std::{future::Future, path::Path};

use anyhow::{Context, Result};
use chrono::Local;
use tokio::{
    fs::OpenOptions,
    io::AsyncWriteExt,
    select,
};
use tracing::{info, warn};

use crate::{
    cli::ListenArgs,
    transport::{connect_with_retry, RetryPolicy},
};

const TIMESTAMP_FORMAT: &str = "%d.%m.%y %H:%M";

/// Runs the listener until ctrl-c.
pub async fn run_until_ctrl_c(args: ListenArgs) -> Result<()> {
    run_until(args, async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            warn!(?error, "failed to install ctrl-c handler");
        }
    })
    .await
}

/// Runs the listener until the `shutdown` future completes. Cancellation
/// interrupts pending reads and backoff sleeps and drops the connection.
pub async fn run_until<F>(args: ListenArgs, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    select! {
        _ = &mut shutdown => {
            info!("listener shutting down");
            Ok(())
        }
        result = listen_loop(&args) => result,
    }
}

async fn listen_loop(args: &ListenArgs) -> Result<()> {
    let policy = RetryPolicy::default();

    loop {
        let mut conn = connect_with_retry(&args.host, args.port, &policy)
            .await
            .with_context(|| format!("failed to connect to {}:{}", args.host, args.port))?;
        info!(host = %args.host, port = args.port, "listening for chat messages");

        loop {
            match conn.read_line().await {
                Ok(Some(line)) => record_message(&args.history_file, &line).await?,
                Ok(None) => {
                    warn!("server closed the connection; reconnecting");
                    break;
                }
                Err(error) => {
                    warn!(?error, "connection lost; reconnecting");
                    break;
                }
            }
        }

        conn.close().await;
        // Full reconnect, no resume: anything missed while away is gone.
    }
}

async fn record_message(history_file: &Path, line: &str) -> Result<()> {
    let stamped = format!("[{}] {}", Local::now().format(TIMESTAMP_FORMAT), line);

    append_history(history_file, &stamped)
        .await
        .with_context(|| format!("failed to append to {}", history_file.display()))?;
    write_stdout(&stamped).await?;
    Ok(())
}

async fn append_history(path: &Path, line: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.write_all(b"\n").await?;
    file.flush().await
}

async fn write_stdout(line: &str) -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(line.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await
}
