// SPDX-FileCopyrightText: 2026 Cytara Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cytara - persona quote-corpus platform.
//!
//! This is the binary entry point for the Cytara server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;
mod status;

/// Cytara - persona quote-corpus platform.
#[derive(Parser, Debug)]
#[command(name = "cytara", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Cytara gateway server.
    Serve,
    /// Show platform state: personas, corpus sizes, queue depth.
    Status {
        /// Output machine-readable JSON.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cytara_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            cytara_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Status { json }) => status::run_status(&config, json).await,
        None => {
            println!("cytara: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
