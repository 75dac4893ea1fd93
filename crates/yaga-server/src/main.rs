//! Yaga server binary.
//!
//! # Usage
//!
//! ```bash
//! # Defaults: port 8082, five sessions, stores in the working directory
//! yaga-server
//!
//! # Custom capacity and store locations
//! yaga-server --bind 127.0.0.1:9000 --max-sessions 20 --users data/users.txt
//! ```

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use yaga_server::{DuplicateNamePolicy, Server, ServerConfig};

/// Yaga chat server
#[derive(Parser, Debug)]
#[command(name = "yaga-server")]
#[command(about = "Multi-client TCP chat server")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, default_value = "0.0.0.0:8082")]
    bind: String,

    /// Maximum concurrent sessions
    #[arg(long, default_value_t = ServerConfig::DEFAULT_MAX_SESSIONS)]
    max_sessions: usize,

    /// Users store file
    #[arg(long, default_value = "users.txt")]
    users: PathBuf,

    /// Messages store file
    #[arg(long, default_value = "messages.txt")]
    messages: PathBuf,

    /// Forbidden-word list, one entry per line
    #[arg(long, default_value = "forbidden_words.txt")]
    forbidden_words: PathBuf,

    /// What to do when a joining name is already online
    #[arg(long, value_enum, default_value_t = DuplicateNamePolicy::Allow)]
    duplicate_names: DuplicateNamePolicy,

    /// Remove a user's records from the users store when they leave
    #[arg(long)]
    prune_users_on_leave: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Yaga server starting");
    tracing::info!("Binding to {}", args.bind);

    let config = ServerConfig {
        bind_address: args.bind,
        max_sessions: args.max_sessions,
        users_path: args.users,
        messages_path: args.messages,
        forbidden_words_path: args.forbidden_words,
        duplicate_names: args.duplicate_names,
        prune_users_on_leave: args.prune_users_on_leave,
    };

    let server = Server::bind(config).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}
