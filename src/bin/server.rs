//! Matchmaking and signaling relay server for two-party WebRTC video chat.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin server
//! cargo run --bin server -- --host 0.0.0.0 --port 3000
//! PORT=3000 cargo run --bin server
//! ```

use clap::Parser;
use rtc_roulette_rs::{
    common::logger::setup_logger,
    server::{run_server, DEFAULT_PORT},
};

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "WebRTC matchmaking and signaling relay server", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "debug");

    let args = Args::parse();

    if let Err(e) = run_server(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
