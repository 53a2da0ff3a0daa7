// Copyright 2026 Cortex Contributors
// SPDX-License-Identifier: Apache-2.0

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use reciprocity_runtime::cli;
use reciprocity_runtime::cli::run_cmd::RunFlags;

#[derive(Parser)]
#[command(
    name = "reciprocity",
    about = "Reciprocal-subscription bot for the Tistory community forum",
    version,
    after_help = "Credentials and settings are read from the environment.\nRun 'reciprocity doctor' to check them."
)]
struct Cli {
    /// Output results, progress events and logs as JSON lines
    #[arg(long, global = true)]
    json: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a solicitation post, then subscribe to and comment on candidates
    Run {
        /// Skip the solicitation post
        #[arg(long)]
        no_publish: bool,
        /// Title keyword marking a reciprocal-subscription post
        #[arg(long)]
        keyword: Option<String>,
        /// Read subscription states only; never click, type or publish
        #[arg(long)]
        dry_run: bool,
    },
    /// Authenticate and list candidates without engaging
    Scan {
        /// Title keyword marking a reciprocal-subscription post
        #[arg(long)]
        keyword: Option<String>,
    },
    /// Check Chromium and configuration
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));
    let logs = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if cli.json {
        logs.json().init();
    } else {
        logs.init();
    }

    cli::output::set_json(cli.json);

    let result = match cli.command {
        Commands::Run {
            no_publish,
            keyword,
            dry_run,
        } => {
            cli::run_cmd::run(RunFlags {
                keyword,
                no_publish,
                dry_run,
            })
            .await
        }
        Commands::Scan { keyword } => cli::scan_cmd::run(keyword).await,
        Commands::Doctor => cli::doctor::run().await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "reciprocity", &mut std::io::stdout());
            Ok(())
        }
    };

    // 0 = success, 1 = error
    if let Err(e) = &result {
        if cli::output::is_json() {
            cli::output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
