pub mod commands;
pub mod config;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file to use instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Also write logs to a file (the default log location if no path is given)
    #[arg(long, global = true, num_args = 0..=1)]
    pub log_file: Option<Option<PathBuf>>,
}

impl Cli {
    /// Log file requested on the command line, if any
    pub fn log_file(&self) -> Option<PathBuf> {
        self.log_file
            .clone()
            .map(|path| path.unwrap_or_else(crate::utils::default_log_file))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl a site from a seed URL and audit every same-origin page it links to
    Audit {
        /// Seed URL to start from
        #[arg(required = true)]
        url: String,

        /// Also check text/background color contrast
        #[arg(short, long)]
        contrast: bool,

        /// Save the report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format of the saved report (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,

        /// Report language (de, en)
        #[arg(short, long)]
        lang: Option<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a default configuration file
        #[arg(long)]
        init: bool,
    },
}

/// Parse command line arguments
pub fn parse_args() -> Cli {
    Cli::parse()
}

/// Process the command
pub async fn process_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Audit { url, contrast, output, format, lang } => {
            info!("Starting audit of {}", url);
            commands::audit(commands::AuditArgs {
                url,
                contrast,
                output,
                format,
                lang,
                config: cli.config,
            })
            .await
        }
        Commands::Config { init } => {
            if init {
                info!("Writing default configuration");
                commands::init_config().await
            } else {
                info!("Showing current configuration");
                commands::show_config(cli.config).await
            }
        }
    }
}
