//! Review command - Send one file to the model and print its review

use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use critique_core::{Config, OpenAiClient, OversizePolicy, Reviewer, Secrets, Settings};

/// Arguments for reviewing a file
#[derive(Args, Debug)]
pub struct ReviewArgs {
    /// Path to the file to review
    #[arg(required = true, value_name = "FILE")]
    pub file: PathBuf,

    /// What to do with files over the size limit (warn, truncate, reject)
    #[arg(long, value_name = "POLICY")]
    pub on_oversize: Option<OversizePolicy>,
}

impl ReviewArgs {
    /// Execute the review
    pub async fn execute(&self, verbose: bool, config: &Config) -> anyhow::Result<()> {
        let secrets = Secrets::load()?;
        let settings = Settings::resolve(config, &secrets)?;

        if verbose {
            tracing::info!(
                file = %self.file.display(),
                settings = ?settings,
                "Starting review"
            );
        }

        let client = OpenAiClient::new(&settings)?;
        let reviewer = Reviewer::new(&settings, &config.review, &client);

        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        reviewer
            .run(&self.file, &mut stdout.lock(), &mut stderr.lock())
            .await
            .with_context(|| format!("Review of '{}' failed", self.file.display()))?;

        Ok(())
    }
}
