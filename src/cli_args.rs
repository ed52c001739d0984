use clap::{ArgAction, ArgGroup, Parser};
use std::path::PathBuf;

/// CLI options
#[derive(Parser, Debug)]
#[command(
    name = "relnotes",
    version,
    about = "Summarize change-log entries into release notes with a local Ollama model"
)]
#[command(group(
    ArgGroup::new("template_group")
        .args(["template", "template_file"])
        .multiple(false)
))]
pub struct Cli {
    /// File with the changes to summarize; omit or use '-' to read stdin
    pub input: Option<PathBuf>,

    /// Model name to use (e.g. mistral, llama3)
    #[arg(long, env = "RELNOTES_MODEL")]
    pub model: Option<String>,

    /// Ollama address (otherwise uses the OLLAMA_HOST env var)
    #[arg(long)]
    pub host: Option<String>,

    /// Custom prompt template; '%s' marks where the changes go
    #[arg(long)]
    pub template: Option<String>,

    /// Read the custom prompt template from a file
    #[arg(long)]
    pub template_file: Option<PathBuf>,

    /// Give up after this many seconds (default 30)
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Print the summary as it is generated
    #[arg(long)]
    pub stream: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}
