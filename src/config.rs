use reqwest::Url;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::SummarizeError;

/// Model used when the configuration leaves `model` empty.
pub const DEFAULT_MODEL: &str = "mistral";

/// Environment variable the Ollama tooling uses for the server address.
pub const OLLAMA_HOST_ENV: &str = "OLLAMA_HOST";

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 11434;

/// Settings a [`Summarizer`](crate::Summarizer) is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummarizerConfig {
    /// Model identifier; empty means [`DEFAULT_MODEL`].
    pub model: String,
    /// Endpoint override; empty means "read `OLLAMA_HOST`".
    pub ollama_url: String,
}

impl SummarizerConfig {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ollama_url: String::new(),
        }
    }

    pub fn with_ollama_url(mut self, url: impl Into<String>) -> Self {
        self.ollama_url = url.into();
        self
    }

    /// Fill in the default model. The model string is otherwise kept verbatim.
    pub(crate) fn with_defaults(mut self) -> Self {
        if self.model.is_empty() {
            self.model = DEFAULT_MODEL.to_string();
        }
        self
    }

    /// Resolve the base URL from the override, falling back to `OLLAMA_HOST`.
    pub fn endpoint(&self) -> Result<Url, SummarizeError> {
        self.endpoint_with_env(env::var(OLLAMA_HOST_ENV).ok().as_deref())
    }

    /// Like [`endpoint`](Self::endpoint), with the `OLLAMA_HOST` value passed in.
    pub fn endpoint_with_env(&self, env_host: Option<&str>) -> Result<Url, SummarizeError> {
        if !self.ollama_url.is_empty() {
            return resolve_endpoint(&self.ollama_url);
        }

        resolve_endpoint(env_host.unwrap_or_default())
    }
}

/// Turn an `OLLAMA_HOST`-style address into a base URL.
///
/// Accepted shapes:
///   - empty                      -> `http://127.0.0.1:11434`
///   - `host`, `host:port`, `:port` (scheme defaults to http, port to 11434)
///   - `http://host` (port 80), `https://host` (port 443)
///   - `[::1]:11434`, bare IPv6 literals
///   - a trailing path, e.g. `https://proxy.local/ollama`
pub fn resolve_endpoint(raw: &str) -> Result<Url, SummarizeError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return build_url("http", DEFAULT_HOST, DEFAULT_PORT, "");
    }

    let (scheme, rest, default_port) = match raw.split_once("://") {
        None => ("http", raw, DEFAULT_PORT),
        Some(("http", rest)) => ("http", rest, 80),
        Some(("https", rest)) => ("https", rest, 443),
        Some((other, _)) => {
            return Err(SummarizeError::Configuration(format!(
                "unsupported scheme '{other}' in Ollama host '{raw}'"
            )));
        }
    };

    let (hostport, path) = rest.split_once('/').unwrap_or((rest, ""));

    let (host, port) = split_host_port(hostport).map_err(|reason| {
        SummarizeError::Configuration(format!("invalid Ollama host '{raw}': {reason}"))
    })?;

    let host = if host.is_empty() { DEFAULT_HOST } else { host };

    let port = match port {
        None | Some("") => default_port,
        Some(p) => p.parse::<u16>().map_err(|_| {
            SummarizeError::Configuration(format!("invalid port '{p}' in Ollama host '{raw}'"))
        })?,
    };

    build_url(scheme, host, port, path)
}

fn split_host_port(hostport: &str) -> Result<(&str, Option<&str>), String> {
    if let Some(rest) = hostport.strip_prefix('[') {
        let (host, after) = rest
            .split_once(']')
            .ok_or_else(|| "missing ']' after IPv6 address".to_string())?;
        if after.is_empty() {
            return Ok((host, None));
        }
        return after
            .strip_prefix(':')
            .map(|port| (host, Some(port)))
            .ok_or_else(|| format!("unexpected '{after}' after IPv6 address"));
    }

    match hostport.split_once(':') {
        // More than one colon and no brackets: a bare IPv6 literal.
        Some((_, port)) if port.contains(':') => Ok((hostport, None)),
        Some((host, port)) => Ok((host, Some(port))),
        None => Ok((hostport, None)),
    }
}

fn build_url(scheme: &str, host: &str, port: u16, path: &str) -> Result<Url, SummarizeError> {
    let host = if host.contains(':') {
        format!("[{host}]")
    } else {
        host.to_string()
    };

    let url = format!("{scheme}://{host}:{port}/{path}");
    Url::parse(&url)
        .map_err(|e| SummarizeError::Configuration(format!("invalid Ollama URL '{url}': {e}")))
}

/// Optional `~/.config/relnotes.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    /// Default model to use when not provided via CLI or env.
    pub model: Option<String>,
    pub ollama_url: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Custom template with a `%s` placeholder.
    pub template: Option<String>,
}

impl FileConfig {
    /// Read the user's config file. A missing or unreadable file yields the
    /// empty config; a malformed one is logged and ignored.
    pub fn load() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }

        let data = match fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Could not read {}: {e}", path.display());
                return Self::default();
            }
        };

        Self::parse(&data).unwrap_or_else(|e| {
            log::warn!("Ignoring malformed {}: {e}", path.display());
            Self::default()
        })
    }

    pub fn parse(data: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<FileConfig>(data)
    }
}

/// Return `~/.config/relnotes.toml`
pub fn config_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    Some(home.join(".config").join("relnotes.toml"))
}
