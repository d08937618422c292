//! Room-based real-time chat server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin hiroba-server
//! cargo run --bin hiroba-server -- --host 0.0.0.0 --port 3000
//! HIROBA_RATE_LIMIT_MAX=10 cargo run --bin hiroba-server
//! ```

use std::time::Duration;

use clap::Parser;
use hiroba_server::{config::ChatConfig, domain::RateLimitPolicy, ui::Server};
use hiroba_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "hiroba-server")]
#[command(about = "Room-based real-time chat server over WebSocket", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "HIROBA_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "HIROBA_PORT", default_value = "8080")]
    port: u16,

    /// Rate limit window in milliseconds
    #[arg(long, env = "HIROBA_RATE_LIMIT_WINDOW_MS", default_value = "3000")]
    rate_limit_window_ms: i64,

    /// Maximum messages per connection within the rate limit window
    #[arg(long, env = "HIROBA_RATE_LIMIT_MAX", default_value = "5")]
    rate_limit_max: usize,

    /// Number of messages sent as history when joining a room
    #[arg(long, env = "HIROBA_HISTORY_LIMIT", default_value = "20")]
    history_limit: usize,

    /// Timeout for the liveness probe used to reclaim nicknames, in milliseconds
    #[arg(long, env = "HIROBA_PROBE_TIMEOUT_MS", default_value = "2000")]
    probe_timeout_ms: u64,

    /// Days to keep messages before the retention sweep deletes them
    #[arg(long, env = "HIROBA_RETENTION_DAYS", default_value = "1")]
    retention_days: u32,

    /// Interval between retention sweeps, in seconds
    #[arg(long, env = "HIROBA_SWEEP_INTERVAL_SECS", default_value = "3600")]
    sweep_interval_secs: u64,
}

impl Args {
    fn chat_config(&self) -> ChatConfig {
        ChatConfig {
            rate_limit: RateLimitPolicy {
                window_millis: self.rate_limit_window_ms,
                max_messages: self.rate_limit_max,
            },
            history_limit: self.history_limit,
            probe_timeout: Duration::from_millis(self.probe_timeout_ms),
            retention_days: self.retention_days,
            sweep_interval: Duration::from_secs(self.sweep_interval_secs.max(1)),
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();
    let config = args.chat_config();
    tracing::info!("Starting with {:?}", config);

    // Repository, MessagePusher and UseCases are wired inside Server (ui::state::AppState)
    let server = Server::new(config);
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
