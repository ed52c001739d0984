//! Summarization over a streaming generation backend.
//!
//! Each call spawns one reader thread that pulls chunks from the backend and
//! hands every fragment to the calling thread over a zero-capacity channel.
//! The reader therefore blocks on each fragment until the caller has taken
//! the previous one, and the caller appends fragments in arrival order.
//!
//! The reader always finishes with exactly one terminal message, so a clean
//! end of stream and a failure are never confused. If the caller stops
//! waiting (deadline or cancellation), the receiver is dropped and the
//! reader's next send fails, which ends the backend call and releases the
//! HTTP response.

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::SummarizerConfig;
use crate::context::CallContext;
use crate::error::{CancelReason, SummarizeError};
use crate::llm::ollama::OllamaClient;
use crate::llm::prompt_builder::format_prompt;
use crate::llm::prompts::RELEASE_NOTES_TEMPLATE;
use crate::llm::{Generate, GenerateChunk, GenerateRequest};

/// Upper bound on how long the caller sleeps before re-checking its context.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Reader-to-caller handoff.
enum Relay {
    Fragment(String),
    Finished,
    Failed(SummarizeError),
}

/// Handle bundling the resolved configuration and the generation backend.
/// Cheap to clone; clones share the transport.
#[derive(Clone)]
pub struct Summarizer {
    backend: Arc<dyn Generate>,
    config: SummarizerConfig,
}

impl Summarizer {
    /// Build a handle talking to Ollama.
    ///
    /// An empty model becomes [`DEFAULT_MODEL`](crate::DEFAULT_MODEL). The
    /// endpoint comes from `config.ollama_url` or, when that is empty, from
    /// `OLLAMA_HOST`. No network I/O happens here.
    pub fn new(config: SummarizerConfig) -> Result<Self, SummarizeError> {
        let config = config.with_defaults();
        let endpoint = config.endpoint()?;
        let client = OllamaClient::new(&endpoint)?;

        log::debug!(
            "Using Ollama at {} with model: {}",
            client.base_url(),
            config.model
        );

        Ok(Self {
            backend: Arc::new(client),
            config,
        })
    }

    /// Build a handle around any backend. `ollama_url` is ignored.
    pub fn with_backend(config: SummarizerConfig, backend: Arc<dyn Generate>) -> Self {
        Self {
            backend,
            config: config.with_defaults(),
        }
    }

    /// The model every request from this handle uses.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Summarize change-log style content into release notes.
    pub fn summarize(&self, ctx: &CallContext, content: &str) -> Result<String, SummarizeError> {
        self.stream_with_template(ctx, content, RELEASE_NOTES_TEMPLATE, |_| {})
    }

    /// Summarize using a caller template with one `%s` placeholder.
    pub fn summarize_with_template(
        &self,
        ctx: &CallContext,
        content: &str,
        template: &str,
    ) -> Result<String, SummarizeError> {
        self.stream_with_template(ctx, content, template, |_| {})
    }

    /// Like [`summarize_with_template`](Self::summarize_with_template), but
    /// also shows every fragment to `on_fragment` as it is accepted, on the
    /// calling thread and in order.
    pub fn stream_with_template<F>(
        &self,
        ctx: &CallContext,
        content: &str,
        template: &str,
        on_fragment: F,
    ) -> Result<String, SummarizeError>
    where
        F: FnMut(&str),
    {
        ctx.check()?;

        let request = GenerateRequest {
            model: self.config.model.clone(),
            prompt: format_prompt(template, content),
        };

        log::debug!(
            "Requesting summary from model {:?} ({} prompt bytes)",
            request.model,
            request.prompt.len()
        );
        log::trace!("Prompt:\n{}", request.prompt);

        let started = Instant::now();
        let rx = self.spawn_reader(request, ctx.clone())?;

        match collect(&rx, ctx, on_fragment) {
            Ok((summary, fragments)) => {
                log::info!(
                    "Summary complete: {fragments} fragments, {} chars in {:.2?}",
                    summary.len(),
                    started.elapsed()
                );
                Ok(summary)
            }
            Err(e) => {
                if e.is_cancelled() {
                    log::warn!("Summary abandoned after {:.2?}: {e}", started.elapsed());
                } else {
                    log::error!("Summary failed: {e}");
                }
                Err(e)
            }
        }
    }

    fn spawn_reader(
        &self,
        request: GenerateRequest,
        ctx: CallContext,
    ) -> Result<Receiver<Relay>, SummarizeError> {
        let (tx, rx) = mpsc::sync_channel::<Relay>(0);
        let backend = Arc::clone(&self.backend);

        thread::Builder::new()
            .name("relnotes-stream".to_string())
            .spawn(move || {
                let mut forward = |chunk: GenerateChunk| -> Result<(), SummarizeError> {
                    if chunk.response.is_empty() {
                        return Ok(());
                    }
                    ctx.check()?;
                    log::trace!("Fragment: {:?}", chunk.response);
                    // Fails only once the caller has stopped listening.
                    tx.send(Relay::Fragment(chunk.response))
                        .map_err(|_| SummarizeError::Cancelled(CancelReason::Requested))
                };
                let outcome = backend.generate(&request, &ctx, &mut forward);

                let last = match outcome {
                    Ok(()) => Relay::Finished,
                    Err(e) => Relay::Failed(e),
                };
                // Nobody may be listening anymore; that's fine.
                let _ = tx.send(last);
            })
            .map_err(|e| SummarizeError::Stream(format!("failed to spawn stream reader: {e}")))?;

        Ok(rx)
    }
}

/// Drain the reader's handoff channel into one string.
fn collect<F>(
    rx: &Receiver<Relay>,
    ctx: &CallContext,
    mut on_fragment: F,
) -> Result<(String, usize), SummarizeError>
where
    F: FnMut(&str),
{
    let mut summary = String::new();
    let mut fragments = 0usize;

    loop {
        ctx.check()?;

        let wait = ctx
            .remaining()
            .map_or(POLL_INTERVAL, |left| left.min(POLL_INTERVAL));

        match rx.recv_timeout(wait) {
            Ok(Relay::Fragment(fragment)) => {
                on_fragment(&fragment);
                summary.push_str(&fragment);
                fragments += 1;
            }
            Ok(Relay::Finished) => return Ok((summary, fragments)),
            Ok(Relay::Failed(e)) => return Err(e),
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(SummarizeError::Stream(
                    "stream reader stopped without finishing".to_string(),
                ));
            }
        }
    }
}
