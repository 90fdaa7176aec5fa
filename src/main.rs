//! Command-line entry point for transcript calibration and summarization.
//!
//! # Usage
//!
//! ```bash
//! # Correct a transcript file, print the result
//! transcript-calibrate calibrate meeting.txt
//!
//! # Summarize from stdin, JSON result
//! cat meeting.txt | transcript-calibrate --json summarize
//!
//! # One-off endpoint overrides
//! transcript-calibrate --model gpt-4o-mini --api-key sk-... calibrate notes.txt
//!
//! # Persist the overrides to the settings file
//! transcript-calibrate --model gpt-4o-mini --api-key sk-... init
//! ```

use std::io::Read;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use transcript_calibrate::{
    config::{AppConfig, AppPaths},
    pipeline::{Calibrator, Summarizer, SummaryResult},
};

/// Calibrate or summarize long transcripts with an OpenAI-compatible LLM.
#[derive(Parser)]
#[command(name = "transcript-calibrate", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Override the API base URL
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Override the API key
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Override the model name
    #[arg(long, global = true)]
    model: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Correct recognition errors, returning the original text on failure
    Calibrate {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
    /// Produce a single narrative summary
    Summarize {
        /// Input file (default: stdin)
        file: Option<PathBuf>,
    },
    /// Write the effective settings (file plus overrides) to the settings file
    Init,
}

impl Cli {
    fn load_config(&self) -> Result<AppConfig> {
        let mut config = match &self.config {
            Some(path) => AppConfig::load_from(path)
                .with_context(|| format!("failed to load settings from {}", path.display()))?,
            None => AppConfig::load().context("failed to load settings")?,
        };

        if let Some(url) = &self.base_url {
            config.llm.base_url = url.clone();
        }
        if let Some(key) = &self.api_key {
            config.llm.api_key = Some(key.clone());
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        Ok(config)
    }

    /// Persist `config` to `--config` or the default settings file.
    fn save_config(&self, config: &AppConfig) -> Result<PathBuf> {
        match &self.config {
            Some(path) => {
                config
                    .save_to(path)
                    .with_context(|| format!("failed to save settings to {}", path.display()))?;
                Ok(path.clone())
            }
            None => {
                config.save().context("failed to save settings")?;
                Ok(AppPaths::new().settings_file)
            }
        }
    }
}

fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            Ok(text)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    match &cli.command {
        Command::Calibrate { file } => {
            let text = read_input(file.as_ref())?;
            let result = Calibrator::from_config(&config).calibrate(&text).await;

            if !result.succeeded {
                log::warn!("{}", result.status_message);
            }
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", result.final_text);
            }
        }
        Command::Summarize { file } => {
            let text = read_input(file.as_ref())?;
            let result = Summarizer::from_config(&config).summarize(&text).await;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            match result {
                SummaryResult::Summary(summary) => {
                    if !cli.json {
                        println!("{summary}");
                    }
                }
                SummaryResult::ErrorMessage(message) => {
                    bail!("summarization failed: {message}");
                }
            }
        }
        Command::Init => {
            let path = cli.save_config(&config)?;
            log::info!("settings written to {}", path.display());
            if let Err(reason) = config.llm.readiness() {
                log::warn!("service still unusable: {reason}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn overrides_replace_file_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "[llm]\nmodel = \"from-file\"\n").expect("write");

        let cli = Cli::try_parse_from([
            "transcript-calibrate",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--api-key",
            "sk-cli",
            "summarize",
        ])
        .expect("parse");
        let config = cli.load_config().expect("load");

        assert_eq!(config.llm.model, "from-file");
        assert_eq!(config.llm.api_key.as_deref(), Some("sk-cli"));
    }

    #[test]
    fn init_writes_overrides_to_config_path() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nested").join("settings.toml");

        let cli = Cli::try_parse_from([
            "transcript-calibrate",
            "--config",
            path.to_str().expect("utf-8 path"),
            "--model",
            "gpt-4o-mini",
            "init",
        ])
        .expect("parse");
        let config = cli.load_config().expect("load");
        let written = cli.save_config(&config).expect("save");

        assert_eq!(written, path);
        let reloaded = AppConfig::load_from(&path).expect("reload");
        assert_eq!(reloaded.llm.model, "gpt-4o-mini");
    }
}
