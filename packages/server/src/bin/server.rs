//! Support chat router server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin handoff-server -- --port 5000
//! ```

use clap::Parser;
use handoff_server::config::Config;
use handoff_shared::logger::setup_logger;

#[tokio::main]
async fn main() {
    let config = Config::parse();

    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), &config.log_level);

    // Run the server
    if let Err(e) = handoff_server::run_server(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
