//! PDF edge router.
//!
//! Forwards `POST /pdf/load` to the Load-Service, `POST /pdf/query` and all
//! other traffic to the Query-Service, and records one analytics event per
//! request without holding up the response.
//!
//! ```text
//!     Client ──▶ edge handler ──▶ router ──▶ Load-Service / Query-Service
//!       ◀──────── response (verbatim) ◀────────────┘
//!                     │
//!                     └──spawn──▶ analytics queue ──▶ worker ──▶ sink
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

#[derive(Parser)]
#[command(name = "pdf-edge-router")]
#[command(about = "Edge router for the PDF load and query services", long_about = None)]
struct Cli {
    /// Path to a TOML config file. DB_SERVER and QUERY_SERVER override it.
    #[arg(short, long, env = "EDGE_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match pdf_edge_router::lifecycle::run(cli.config.as_deref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            eprintln!("pdf-edge-router: {e}");
            ExitCode::FAILURE
        }
    }
}
