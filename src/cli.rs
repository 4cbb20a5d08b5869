use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stream incoming chat messages to stdout and a history file.
    Listen(ListenArgs),
    /// Authenticate (registering a new account if needed) and send one message.
    Send(SendArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListenArgs {
    /// Chat server host name.
    #[arg(long, env = "HOST", default_value = "minechat.dvmn.org")]
    pub host: String,

    /// Port serving the chat message stream.
    #[arg(long, env = "LISTEN_PORT", default_value_t = 5000)]
    pub port: u16,

    /// File the timestamped chat history is appended to.
    #[arg(long, env = "CHAT_HISTORY_FILE", default_value = "chat_history.txt")]
    pub history_file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Chat server host name.
    #[arg(long, env = "HOST", default_value = "minechat.dvmn.org")]
    pub host: String,

    /// Port accepting authenticated message submissions.
    #[arg(long, env = "WRITE_PORT", default_value_t = 5050)]
    pub port: u16,

    /// Account hash. Leave empty to use stored credentials or register.
    #[arg(long, env = "USER_HASH", default_value = "")]
    pub user_hash: String,

    /// Display name used when registering a new account.
    #[arg(long, env = "USER_NAME", default_value = "anonymous")]
    pub user_name: String,

    /// Message to send.
    #[arg(long)]
    pub message: String,

    /// Path of the stored credentials file.
    #[arg(long, env = "CREDENTIALS_FILE", default_value = "credentials.json")]
    pub credentials_file: PathBuf,
}
