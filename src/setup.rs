use anyhow::{Context, Result};
use log::debug;
use relnotes::{FileConfig, OLLAMA_HOST_ENV, Summarizer, SummarizerConfig};
use std::env;
use std::fs;
use std::time::Duration;

use crate::cli_args::Cli;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Final resolved settings for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub summarizer: SummarizerConfig,
    /// `None` means the built-in release-notes template.
    pub template: Option<String>,
    pub timeout: Duration,
}

impl Settings {
    /// Build the final settings from CLI flags, environment, TOML file, and defaults.
    ///
    /// Precedence:
    ///   1. CLI flags (`--model`, `--host`, `--template`, `--template-file`, `--timeout`)
    ///   2. Env vars `RELNOTES_MODEL` (via clap) and `OLLAMA_HOST`
    ///   3. TOML `~/.config/relnotes.toml`
    ///   4. Hardcoded defaults ("mistral", local Ollama, 30s)
    pub fn from_sources(cli: &Cli, file_cfg: FileConfig, env_host: Option<String>) -> Result<Self> {
        let model = cli.model.clone().or(file_cfg.model).unwrap_or_default();

        let ollama_url = cli
            .host
            .clone()
            .or(env_host.filter(|h| !h.trim().is_empty()))
            .or(file_cfg.ollama_url)
            .unwrap_or_default();

        let template = match (&cli.template, &cli.template_file) {
            (Some(t), _) => Some(t.clone()),
            (None, Some(path)) => Some(
                fs::read_to_string(path)
                    .with_context(|| format!("failed to read template {}", path.display()))?,
            ),
            (None, None) => file_cfg.template,
        };

        let timeout_secs = cli
            .timeout
            .or(file_cfg.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        Ok(Settings {
            summarizer: SummarizerConfig { model, ollama_url },
            template,
            timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn load(cli: &Cli) -> Result<Self> {
        Self::from_sources(cli, FileConfig::load(), env::var(OLLAMA_HOST_ENV).ok())
    }
}

/// Build the summarizer based on the resolved settings.
pub fn build_summarizer(settings: &Settings) -> Result<Summarizer> {
    let summarizer = Summarizer::new(settings.summarizer.clone())
        .context("failed to set up the Ollama client")?;

    debug!("Using model {} (timeout {:?})", summarizer.model(), settings.timeout);

    Ok(summarizer)
}
