//! Issue tracker service.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                ISSUE TRACKER                 │
//!                        │                                              │
//!     Client Request     │  ┌─────────┐    ┌──────────┐    ┌─────────┐  │
//!     ───────────────────┼─▶│  http   │───▶│  issues  │───▶│  store  │──┼──▶ MongoDB
//!                        │  │ server  │    │ handlers │    │  trait  │  │
//!     Client Response    │  └─────────┘    └──────────┘    └─────────┘  │
//!     ◀──────────────────┼───────┘                                     │
//!                        │  ┌────────────────────────────────────────┐  │
//!                        │  │         Cross-Cutting Concerns         │  │
//!                        │  │  config · observability · lifecycle    │  │
//!                        │  └────────────────────────────────────────┘  │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use issue_tracker::lifecycle::startup::{self, StartupOptions};

#[derive(Parser)]
#[command(name = "issue-tracker")]
#[command(about = "Issue tracking API backed by MongoDB", version)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "ISSUE_TRACKER_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address, overriding the config file and PORT.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    startup::run(StartupOptions {
        config_path: args.config,
        bind_address: args.bind,
    })
    .await
}
