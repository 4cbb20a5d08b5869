use anyhow::Result;
use clap::Parser;

use minechat::{
    cli::{Cli, Command},
    listener, sender,
};

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr; stdout is reserved for the chat stream.
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Listen(args) => listener::run_until_ctrl_c(args).await,
        Command::Send(args) => sender::run(args).await,
    }
}
