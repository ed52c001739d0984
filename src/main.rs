mod cli_args;
mod logging;
mod setup;

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use relnotes::{CallContext, RELEASE_NOTES_TEMPLATE, Summarizer};
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use std::time::Duration;

use crate::cli_args::Cli;
use crate::setup::{Settings, build_summarizer};

fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(p) if p != Path::new("-") => {
            fs::read_to_string(p).with_context(|| format!("failed to read {}", p.display()))
        }
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("failed to read changes from stdin")?;
            Ok(buf)
        }
    }
}

/// Print fragments as they arrive, then finish the line.
fn run_streaming(
    summarizer: &Summarizer,
    ctx: &CallContext,
    content: &str,
    template: &str,
) -> Result<()> {
    let mut stdout = io::stdout();
    let mut write_err = None;

    let summary = summarizer.stream_with_template(ctx, content, template, |fragment| {
        if write_err.is_some() {
            return;
        }
        if let Err(e) = write!(stdout, "{fragment}").and_then(|_| stdout.flush()) {
            write_err = Some(e);
        }
    })?;

    if let Some(e) = write_err {
        return Err(e).context("failed to write summary to stdout");
    }
    if !summary.ends_with('\n') {
        writeln!(stdout)?;
    }
    Ok(())
}

/// Wait behind a spinner, then print the whole summary.
fn run_buffered(
    summarizer: &Summarizer,
    ctx: &CallContext,
    content: &str,
    template: &str,
) -> Result<()> {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style.tick_chars("-\\|/ "));
    }
    spinner.set_message(format!("Asking {} for a summary...", summarizer.model()));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = summarizer.summarize_with_template(ctx, content, template);
    spinner.finish_and_clear();

    let summary = result?;
    println!("{}", summary.trim_end());
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    let settings = Settings::load(&cli)?;
    let content = read_input(cli.input.as_deref())?;
    if content.trim().is_empty() {
        log::warn!("No changes given; the model will see an empty list");
    }

    let summarizer = build_summarizer(&settings)?;
    let template = settings
        .template
        .as_deref()
        .unwrap_or(RELEASE_NOTES_TEMPLATE);
    let ctx = CallContext::with_timeout(settings.timeout);

    let outcome = if cli.stream {
        run_streaming(&summarizer, &ctx, &content, template)
    } else {
        run_buffered(&summarizer, &ctx, &content, template)
    };

    outcome.context("failed to generate summary")
}
