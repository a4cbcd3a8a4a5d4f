// SPDX-FileCopyrightText: 2026 Modelmux Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Modelmux - a multi-tenant LLM model routing engine.
//!
//! This is the binary entry point for the modelmux server.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};

mod doctor;
mod serve;

/// Modelmux - a multi-tenant LLM model routing engine.
#[derive(Parser, Debug)]
#[command(name = "modelmux", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the modelmux gateway server.
    Serve,
    /// Run diagnostic checks against the modelmux environment.
    Doctor {
        /// Run additional intensive checks.
        #[arg(long)]
        deep: bool,
        /// Disable colored output.
        #[arg(long)]
        plain: bool,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Load and validate configuration at startup.
    let config = match modelmux_config::load_and_validate() {
        Ok(config) => config,
        Err(errors) => {
            modelmux_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command {
        Some(Commands::Serve) => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("modelmux serve: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Doctor { deep, plain }) => {
            if let Err(e) = doctor::run_doctor(&config, deep, plain).await {
                eprintln!("modelmux doctor: {e}");
                std::process::exit(1);
            }
        }
        None => {
            println!("modelmux: use --help for available commands");
        }
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn binary_loads_config_defaults() {
        // Verify config loads with defaults (no config file needed)
        let config = modelmux_config::load_and_validate()
            .expect("default config should be valid");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
    }
}
