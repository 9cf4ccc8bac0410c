//! LLM Model Predictor CLI
//!
//! Trains execution-time and quality models from a history of rated runs,
//! then predicts both for every known model given a prompt's size.

mod commands;
mod output;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use output::{LogFormat, OutputFormat};
use predictor_lib::{PredictorConfig, RegressionStrategy};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// LLM Model Predictor CLI
#[derive(Parser)]
#[command(name = "lmp")]
#[command(author, version, about = "Predict LLM execution time and answer quality", long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, JSON or YAML)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Regression strategy for execution time (overrides the config file)
    #[arg(long, global = true)]
    pub time_strategy: Option<RegressionStrategy>,

    /// Regression strategy for quality (overrides the config file)
    #[arg(long, global = true)]
    pub quality_strategy: Option<RegressionStrategy>,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Log line format on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train both models from a history file
    #[command(short_flag = 't', long_flag = "train")]
    Train {
        /// History file: `model lines words chars execution_time user_rating` per line
        trainfile: PathBuf,

        /// Prefix of the model files to write
        prefix: PathBuf,
    },

    /// Predict time and quality for every known model
    #[command(short_flag = 'a', long_flag = "ask")]
    Ask {
        /// Prefix of the trained model files
        prefix: PathBuf,

        /// Number of lines in the prompt
        #[arg(allow_hyphen_values = true)]
        lines: String,

        /// Number of words in the prompt
        #[arg(allow_hyphen_values = true)]
        words: String,

        /// Number of characters in the prompt
        #[arg(allow_hyphen_values = true)]
        chars: String,

        /// Output format
        #[arg(long, short, value_enum, default_value_t = OutputFormat::Plain)]
        format: OutputFormat,
    },
}

fn init_logging(verbose: u8, format: LogFormat) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let registry = tracing_subscriber::registry().with(EnvFilter::new(level));

    match format {
        LogFormat::Text => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn load_config(cli: &Cli) -> Result<PredictorConfig> {
    let mut config = PredictorConfig::load(cli.config.as_deref())?;
    if let Some(strategy) = cli.time_strategy {
        config.time_strategy = strategy;
    }
    if let Some(strategy) = cli.quality_strategy {
        config.quality_strategy = strategy;
    }
    debug!(
        time_strategy = %config.time_strategy,
        quality_strategy = %config.quality_strategy,
        "Configuration resolved"
    );
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Train { trainfile, prefix } => {
            commands::train::run(&config, &trainfile, &prefix)?;
        }
        Commands::Ask {
            prefix,
            lines,
            words,
            chars,
            format,
        } => {
            commands::ask::run(&config, &prefix, [lines.as_str(), words.as_str(), chars.as_str()], format)?;
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            output::print_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}
