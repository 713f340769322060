// SPDX-FileCopyrightText: 2026 Tsunagi Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tsunagi - LINE-first CRM chat backend for loan brokerages.
//!
//! This is the binary entry point for the Tsunagi server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod serve;

/// Tsunagi - LINE-first CRM chat backend for loan brokerages.
#[derive(Parser, Debug)]
#[command(name = "tsunagi", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Tsunagi server.
    Serve,
    /// Validate and print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match tsunagi_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            tsunagi_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => {
            match toml::to_string_pretty(&config) {
                Ok(rendered) => println!("{rendered}"),
                Err(e) => {
                    eprintln!("error: failed to render config: {e}");
                    std::process::exit(1);
                }
            }
        }
        None => {
            println!("tsunagi: use --help for available commands");
        }
    }
}
