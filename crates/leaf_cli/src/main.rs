mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leaf_core::AppConfig;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

pub const APP_VERSION: &str = env!("LEAFCHECK_VERSION");

#[derive(Parser, Debug)]
#[command(
    name = "leafcheck",
    version = APP_VERSION,
    about = "Classify leaf images as healthy or unhealthy",
    long_about = None
)]
struct Cli {
    /// Pretrained classifier (JSON); overrides the config file
    #[arg(long, env = "LEAF_MODEL", global = true)]
    model: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify one or more images
    Classify {
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Print reports as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// Print the feature vector of an image without classifying it
    Features {
        image: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Classify every image in a folder
    Scan {
        dir: PathBuf,
        /// Descend into subdirectories
        #[arg(long)]
        recursive: bool,
        /// Write results to this CSV file
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Show information about this tool
    About,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_level = if cli.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(outcome) => outcome.exit_code(),
        Err(e) => {
            eprintln!("leafcheck: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<commands::Outcome> {
    let mut cfg = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        cfg.classifier.model_path = model;
    }

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Classify { images, json } => {
            commands::classify(&cfg, &images, json, &mut out, &mut io::stderr().lock())
        }
        Command::Features { image, json } => commands::features(&image, json, &mut out),
        Command::Scan {
            dir,
            recursive,
            csv,
        } => {
            cfg.scan.recursive |= recursive;
            commands::scan(&cfg, &dir, csv.as_deref(), &mut out)
        }
        Command::About => {
            writeln!(out, "{}", commands::about_text())?;
            Ok(commands::Outcome::default())
        }
    }
}
