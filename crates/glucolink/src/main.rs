// SPDX-FileCopyrightText: 2026 Glucolink Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Glucolink - publishes the latest reading from a remote glucose monitor.
//!
//! This is the binary entry point.

mod commands;
mod prompt;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Glucolink - publishes the latest reading from a remote glucose monitor.
#[derive(Parser, Debug)]
#[command(name = "glucolink", version, about, long_about = None)]
struct Cli {
    /// Use this config file instead of the standard lookup.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Poll the selected source and print every published value.
    Serve,
    /// List the available measurement sources.
    Sources,
    /// Switch to another measurement source.
    Source {
        /// Source id, as shown by `glucolink sources`.
        id: String,
    },
    /// Log in to the active source.
    Login {
        #[arg(long)]
        email: String,
        /// Prompted for when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// List the patients shared with the logged-in account.
    Patients,
    /// Choose which patient's readings to follow.
    Select {
        /// Patient id, as shown by `glucolink patients`.
        patient_id: String,
    },
    /// Set how old a reading may be before the placeholder replaces it.
    Cutoff {
        /// Seconds.
        secs: u64,
    },
    /// Set the value published when no fresh reading exists.
    Placeholder {
        #[arg(allow_negative_numbers = true)]
        value: f64,
    },
    /// Set how often the active source is polled.
    Interval {
        /// Seconds.
        secs: u64,
    },
    /// Show settings and the current reading.
    Status {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
        /// Seconds to wait for a fresh reading.
        #[arg(long, default_value_t = 10)]
        wait: u64,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => glucolink_config::load_and_validate_path(path),
        None => glucolink_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            glucolink_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    init_tracing(&config.agent.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Sources) => commands::run_sources(&config).await,
        Some(Commands::Source { id }) => commands::run_select_source(&config, &id).await,
        Some(Commands::Login { email, password }) => {
            commands::run_login(&config, &email, password).await
        }
        Some(Commands::Patients) => commands::run_patients(&config).await,
        Some(Commands::Select { patient_id }) => {
            commands::run_select_patient(&config, &patient_id).await
        }
        Some(Commands::Cutoff { secs }) => commands::run_cutoff(&config, secs).await,
        Some(Commands::Placeholder { value }) => commands::run_placeholder(&config, value).await,
        Some(Commands::Interval { secs }) => commands::run_interval(&config, secs).await,
        Some(Commands::Status { json, wait }) => commands::run_status(&config, json, wait).await,
        None => {
            println!("glucolink: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

/// Installs the global subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("glucolink={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
