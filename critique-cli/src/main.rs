//! Critique CLI - Command line interface for critique
//!
//! Reviews a single source file with a hosted language model.

mod commands;

use std::path::PathBuf;

use clap::Parser;
use critique_core::{CliOverrides, Config};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::ReviewArgs;

/// Critique: review one source file with a hosted language model
#[derive(Parser, Debug)]
#[command(name = "critique")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Model to use (overrides config and env)
    #[arg(long, env = "CRITIQUE_MODEL")]
    model: Option<String>,

    /// API root of an OpenAI-compatible service (overrides config and env)
    #[arg(long, env = "CRITIQUE_BASE_URL")]
    base_url: Option<String>,

    /// Config file to use instead of ~/.config/critique/config.toml
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(flatten)]
    review: ReviewArgs,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // stdout carries only the report
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if cli.verbose => EnvFilter::new("debug"),
        Err(_) => EnvFilter::new("error"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = Config::load_with_overrides(
        cli.config.as_deref(),
        CliOverrides {
            model: cli.model.clone(),
            base_url: cli.base_url.clone(),
            oversize: cli.review.on_oversize,
        },
    )?;

    if cli.verbose {
        tracing::info!(
            model = %config.api.model,
            base_url = %config.api.base_url,
            oversize = %config.review.oversize,
            "Configuration loaded"
        );
    }

    cli.review.execute(cli.verbose, &config).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;
    use critique_core::OversizePolicy;

    #[test]
    fn test_requires_file() {
        let err = Cli::try_parse_from(["critique"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    }

    #[test]
    fn test_rejects_extra_positional() {
        let err = Cli::try_parse_from(["critique", "a.py", "b.py"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_parses_file_and_flags() {
        let cli = Cli::try_parse_from([
            "critique",
            "--model",
            "gpt-4o-mini",
            "--on-oversize",
            "truncate",
            "-v",
            "data_parser.py",
        ])
        .unwrap();

        assert_eq!(cli.review.file, PathBuf::from("data_parser.py"));
        assert_eq!(cli.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(cli.review.on_oversize, Some(OversizePolicy::Truncate));
        assert!(cli.verbose);
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let err = Cli::try_parse_from(["critique", "--on-oversize", "drop", "a.py"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
