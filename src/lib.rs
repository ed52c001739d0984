//! Summarize change-log entries into release notes with a local Ollama model.
//!
//! ```no_run
//! use std::time::Duration;
//! use relnotes::{CallContext, Summarizer, SummarizerConfig};
//!
//! let summarizer = Summarizer::new(SummarizerConfig::new("mistral"))?;
//! let ctx = CallContext::with_timeout(Duration::from_secs(30));
//! let notes = summarizer.summarize(&ctx, "- Fixed bug in password reset flow")?;
//! println!("{notes}");
//! # Ok::<(), relnotes::SummarizeError>(())
//! ```

pub mod config;
pub mod context;
pub mod error;
pub mod llm;
pub mod summarizer;

pub use config::{DEFAULT_MODEL, FileConfig, OLLAMA_HOST_ENV, SummarizerConfig};
pub use context::{CallContext, CancelHandle};
pub use error::{CancelReason, SummarizeError};
pub use llm::prompt_builder::format_prompt;
pub use llm::prompts::RELEASE_NOTES_TEMPLATE;
pub use summarizer::Summarizer;
