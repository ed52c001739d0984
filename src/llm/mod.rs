pub mod ollama;
pub mod prompt_builder;
pub mod prompts;
mod stream;

use crate::context::CallContext;
use crate::error::SummarizeError;

/// One generation call: which model, and the fully formatted prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
}

/// One incremental piece of a streamed generation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GenerateChunk {
    pub response: String,
    pub done: bool,
}

/// Trait for a streaming text-generation backend.
///
/// `generate` calls `on_chunk` once per chunk, in the order the server emits
/// them, and returns `Ok(())` only after the server signalled completion. An
/// error returned by `on_chunk` aborts the stream and is passed back unchanged.
pub trait Generate: Send + Sync {
    fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CallContext,
        on_chunk: &mut dyn FnMut(GenerateChunk) -> Result<(), SummarizeError>,
    ) -> Result<(), SummarizeError>;
}
