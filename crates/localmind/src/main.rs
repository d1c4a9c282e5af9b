// SPDX-FileCopyrightText: 2026 Local-Mind Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Local-Mind - a local, memory-augmented chat assistant.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use localmind_config::{ConfigError, LocalMindConfig};

mod serve;

/// Local-Mind - a local, memory-augmented chat assistant.
#[derive(Parser, Debug)]
#[command(name = "localmind", version, about, long_about = None)]
struct Cli {
    /// Read configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the chat server.
    Serve,
    /// Print the effective configuration as TOML.
    Config,
}

fn load_config(path: Option<&std::path::Path>) -> Result<LocalMindConfig, Vec<ConfigError>> {
    match path {
        Some(path) => localmind_config::load_and_validate_path(path),
        None => localmind_config::load_and_validate(),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            localmind_config::render_errors(&errors);
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
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render configuration: {e}");
                std::process::exit(1);
            }
        },
        None => {
            println!("localmind: use --help for available commands");
        }
    }
}
