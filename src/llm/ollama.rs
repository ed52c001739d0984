use musli::json;
use musli::{Decode, Encode};
use reqwest::blocking::Client;
use reqwest::Url;
use std::io::BufReader;
use std::time::Duration;

use crate::context::CallContext;
use crate::error::SummarizeError;

use super::stream::{read_stream_lines, LineFlow};
use super::{Generate, GenerateChunk, GenerateRequest};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Encode)]
struct OllamaGenerateRequest {
    model: String,
    prompt: String,
    stream: bool,
}

/// One NDJSON line from /api/generate. Unknown fields (timings, context) are
/// skipped.
#[derive(Debug, Decode)]
struct OllamaStreamResponse {
    #[musli(default)]
    response: Option<String>,
    #[musli(default)]
    done: Option<bool>,
    #[musli(default)]
    error: Option<String>,
}

/// Synchronous Ollama client using /api/generate with streaming enabled.
pub struct OllamaClient {
    http: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: &Url) -> Result<Self, SummarizeError> {
        // No overall timeout: each call's deadline is set per request.
        let http = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None::<Duration>)
            .build()
            .map_err(|e| {
                SummarizeError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url)
    }
}

impl Generate for OllamaClient {
    fn generate(
        &self,
        request: &GenerateRequest,
        ctx: &CallContext,
        on_chunk: &mut dyn FnMut(GenerateChunk) -> Result<(), SummarizeError>,
    ) -> Result<(), SummarizeError> {
        ctx.check()?;

        let req_body = OllamaGenerateRequest {
            model: request.model.clone(),
            prompt: request.prompt.clone(),
            stream: true,
        };

        let body_str = json::to_string(&req_body).map_err(|e| {
            SummarizeError::Stream(format!("failed to encode Ollama JSON request: {e}"))
        })?;

        log::trace!("Ollama request body: {body_str}");

        let url = self.generate_url();

        let mut builder = self
            .http
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body_str);
        if let Some(remaining) = ctx.remaining() {
            builder = builder.timeout(remaining);
        }

        let resp = builder.send().map_err(|e| {
            classify(ctx, SummarizeError::Stream(format!("Error calling Ollama at {url}: {e}")))
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(SummarizeError::Stream(format!(
                "Ollama HTTP error from {url}: {} - {}",
                status.as_u16(),
                error_message(&text)
            )));
        }

        let reader = BufReader::new(resp);
        let handle_line = |line: &str| -> Result<LineFlow, SummarizeError> {
            ctx.check()?;

            let chunk = parse_stream_line(line)?;
            let done = chunk.done;
            on_chunk(chunk)?;

            Ok(if done { LineFlow::Stop } else { LineFlow::Continue })
        };
        // An elapsed deadline surfaces from reqwest as a generic body error.
        let completed = read_stream_lines(reader, handle_line).map_err(|e| classify(ctx, e))?;

        if !completed {
            return Err(SummarizeError::Stream(format!(
                "Ollama stream from {url} ended before completion"
            )));
        }

        Ok(())
    }
}

fn parse_stream_line(line: &str) -> Result<GenerateChunk, SummarizeError> {
    let parsed: OllamaStreamResponse = json::from_str(line).map_err(|e| {
        SummarizeError::Stream(format!("failed to decode Ollama stream JSON: {e}"))
    })?;

    if let Some(error) = parsed.error {
        return Err(SummarizeError::Stream(format!("Ollama reported an error: {error}")));
    }

    Ok(GenerateChunk {
        response: parsed.response.unwrap_or_default(),
        done: parsed.done.unwrap_or(false),
    })
}

/// A failure observed after the call's deadline or cancel is reported as such,
/// whatever shape the transport gave it.
fn classify(ctx: &CallContext, err: SummarizeError) -> SummarizeError {
    ctx.check().err().unwrap_or(err)
}

/// Ollama answers failures with `{"error": "..."}`; fall back to the raw body.
fn error_message(body: &str) -> String {
    #[derive(Decode)]
    struct ErrorBody {
        error: String,
    }

    match json::from_str::<ErrorBody>(body) {
        Ok(parsed) => parsed.error,
        Err(_) => body.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CancelReason;
    use std::time::Instant;

    #[test]
    fn parses_fragment_lines() {
        let chunk = parse_stream_line(
            r#"{"model":"mistral","created_at":"2024-01-01T00:00:00Z","response":"Hel","done":false}"#,
        )
        .unwrap();
        assert_eq!(
            chunk,
            GenerateChunk {
                response: "Hel".into(),
                done: false
            }
        );
    }

    #[test]
    fn parses_final_line_with_stats() {
        let chunk = parse_stream_line(
            r#"{"model":"mistral","response":"","done":true,"done_reason":"stop","context":[1,2,3],"total_duration":12345}"#,
        )
        .unwrap();
        assert!(chunk.done);
        assert!(chunk.response.is_empty());
    }

    #[test]
    fn error_lines_become_stream_errors() {
        let err = parse_stream_line(r#"{"error":"model 'nope' not found"}"#).unwrap_err();
        assert!(err.is_stream());
        assert!(err.to_string().contains("model 'nope' not found"));
    }

    #[test]
    fn garbage_lines_are_stream_errors() {
        assert!(parse_stream_line("not json").unwrap_err().is_stream());
    }

    #[test]
    fn error_body_falls_back_to_raw_text() {
        assert_eq!(error_message(r#"{"error":"boom"}"#), "boom");
        assert_eq!(error_message("  Bad Gateway \n"), "Bad Gateway");
    }

    #[test]
    fn failures_after_the_deadline_are_cancellations() {
        let failure = || SummarizeError::Stream("request or response body error".into());

        let expired = CallContext::with_deadline(Instant::now());
        assert!(matches!(
            classify(&expired, failure()),
            SummarizeError::Cancelled(CancelReason::DeadlineExceeded)
        ));

        let cancelled = CallContext::background();
        cancelled.cancel_handle().cancel();
        assert!(matches!(
            classify(&cancelled, failure()),
            SummarizeError::Cancelled(CancelReason::Requested)
        ));
    }

    #[test]
    fn failures_without_a_deadline_stay_stream_errors() {
        // e.g. a connect timeout on a background call
        let err = classify(
            &CallContext::background(),
            SummarizeError::Stream("connect timed out".into()),
        );
        assert!(err.is_stream());
    }

    #[test]
    fn base_url_drops_trailing_slash() {
        let url = Url::parse("http://127.0.0.1:11434/").unwrap();
        let client = OllamaClient::new(&url).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:11434");
        assert_eq!(client.generate_url(), "http://127.0.0.1:11434/api/generate");
    }
}
