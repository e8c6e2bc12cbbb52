//! Ollama HTTP adapter.
//!
//! One [`OllamaClient`] serves both collaborator roles: it implements
//! [`Embedder`] on `POST /api/embed` and [`Generator`] on `POST /api/generate`.
//!
//! # Retry Strategy
//!
//! With `max_retries > 0`, transient failures are retried with exponential
//! backoff:
//! - HTTP 429 (rate limited) and 5xx (server error) → retry
//! - HTTP 4xx (client error, not 429) → fail immediately
//! - Network errors → retry
//! - Backoff: 1s, 2s, 4s, 8s, 16s, 32s (capped at 2^5)
//!
//! The default of zero retries keeps the fail-fast behaviour.
use std::io::{BufRead, BufReader};
use std::thread;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Config;
use crate::embedder::{Embedder, EmbedderError};
use crate::generator::{ChunkStream, GenerationError, GenerationRequest, Generator};

// ── Wire types ───────────────────────────────────────────────────────

#[derive(Serialize)]
struct EmbedBody<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

#[derive(Serialize)]
struct GenerateBody<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// A whole response, or one line of a streamed one.
#[derive(Deserialize)]
struct GenerateChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

pub struct OllamaClient {
    http: Client,
    base_url: String,
    embed_model: String,
    llm_model: String,
    max_retries: u32,
}

impl OllamaClient {
    /// Build a client for the server and models named in `config`.
    ///
    /// Must be called outside an async context: the blocking client owns its
    /// own runtime.
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.ollama_url.trim_end_matches('/').to_string(),
            embed_model: config.embed_model.clone(),
            llm_model: config.llm_model.clone(),
            max_retries: config.max_retries,
        })
    }

    fn post<T: Serialize>(&self, path: &str, body: &T) -> Result<Response, String> {
        let url = format!("{}{path}", self.base_url);
        let mut last_err = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                debug!("Retrying {path} in {delay:?} (attempt {attempt})");
                thread::sleep(delay);
            }

            match self.http.post(&url).json(body).send() {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let body_text = response.text().unwrap_or_default();
                    let err = format!("Ollama API error {status}: {body_text}");
                    if status.as_u16() == 429 || status.is_server_error() {
                        warn!("{err}");
                        last_err = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    let err = format!(
                        "Ollama connection error (is Ollama running at {}?): {e}",
                        self.base_url
                    );
                    warn!("{err}");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or_else(|| "Ollama request failed after retries".to_string()))
    }
}

fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt.saturating_sub(1)).min(5))
}

/// Exactly one non-empty vector is expected per embed call.
fn single_embedding(response: EmbedResponse) -> Result<Vec<f32>, EmbedderError> {
    let count = response.embeddings.len();
    let mut embeddings = response.embeddings.into_iter();
    match (embeddings.next(), count) {
        (Some(vector), 1) if !vector.is_empty() => Ok(vector),
        (Some(_), 1) => Err(EmbedderError::InvalidResponse(
            "embedding is empty".to_string(),
        )),
        _ => Err(EmbedderError::InvalidResponse(format!(
            "expected 1 embedding, got {count}"
        ))),
    }
}

impl Embedder for OllamaClient {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedderError> {
        let body = EmbedBody {
            model: &self.embed_model,
            input: text,
        };
        let response = self
            .post("/api/embed", &body)
            .map_err(EmbedderError::RequestFailed)?;
        let parsed: EmbedResponse = response
            .json()
            .map_err(|e| EmbedderError::InvalidResponse(e.to_string()))?;
        single_embedding(parsed)
    }

    fn model_name(&self) -> &str {
        &self.embed_model
    }
}

impl Generator for OllamaClient {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        let body = GenerateBody {
            model: &self.llm_model,
            system: request.system,
            prompt: request.prompt,
            stream: false,
        };
        let response = self
            .post("/api/generate", &body)
            .map_err(GenerationError::RequestFailed)?;
        let parsed: GenerateChunk = response
            .json()
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        match parsed.error {
            Some(err) => Err(GenerationError::Model(err)),
            None => Ok(parsed.response),
        }
    }

    fn generate_stream(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<ChunkStream, GenerationError> {
        let body = GenerateBody {
            model: &self.llm_model,
            system: request.system,
            prompt: request.prompt,
            stream: true,
        };
        let response = self
            .post("/api/generate", &body)
            .map_err(GenerationError::RequestFailed)?;

        Ok(Box::new(NdjsonChunks::new(BufReader::new(response))))
    }

    fn model_name(&self) -> &str {
        &self.llm_model
    }
}

// ── Streaming ────────────────────────────────────────────────────────

/// Decodes a newline-delimited JSON generation stream into text chunks.
///
/// Ends after the object carrying `"done": true`. An `"error"` object, a
/// malformed line, or end of input before `done` yields one error and ends
/// the stream.
pub struct NdjsonChunks<R> {
    reader: R,
    line: String,
    finished: bool,
}

impl<R: BufRead> NdjsonChunks<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
            finished: false,
        }
    }

    fn fail(&mut self, err: GenerationError) -> Option<Result<String, GenerationError>> {
        self.finished = true;
        Some(Err(err))
    }
}

impl<R: BufRead> Iterator for NdjsonChunks<R> {
    type Item = Result<String, GenerationError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => {
                    return self.fail(GenerationError::InvalidResponse(
                        "stream ended before completion".to_string(),
                    ));
                }
                Ok(_) => {}
                Err(e) => return self.fail(GenerationError::RequestFailed(e.to_string())),
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }

            let chunk: GenerateChunk = match serde_json::from_str(line) {
                Ok(chunk) => chunk,
                Err(e) => return self.fail(GenerationError::InvalidResponse(e.to_string())),
            };

            if let Some(err) = chunk.error {
                return self.fail(GenerationError::Model(err));
            }
            if chunk.done {
                self.finished = true;
            }
            if !chunk.response.is_empty() {
                return Some(Ok(chunk.response));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn collect(input: &str) -> Vec<Result<String, GenerationError>> {
        NdjsonChunks::new(Cursor::new(input.as_bytes().to_vec())).collect()
    }

    #[test]
    fn test_stream_yields_chunks_in_order() {
        let input = concat!(
            r#"{"model":"m","response":"Use ","done":false}"#,
            "\n",
            r#"{"model":"m","response":"the VPN.","done":false}"#,
            "\n\n",
            r#"{"model":"m","response":"","done":true,"total_duration":12}"#,
            "\n",
        );
        let chunks: Vec<String> = collect(input).into_iter().map(Result::unwrap).collect();
        assert_eq!(chunks, vec!["Use ", "the VPN."]);
    }

    #[test]
    fn test_stream_stops_after_done() {
        let input = concat!(
            r#"{"response":"last","done":true}"#,
            "\n",
            r#"{"response":"ignored","done":false}"#,
            "\n",
        );
        let chunks = collect(input);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].as_ref().unwrap(), "last");
    }

    #[test]
    fn test_stream_error_object() {
        let input = concat!(
            r#"{"response":"partial","done":false}"#,
            "\n",
            r#"{"error":"model not found"}"#,
            "\n",
        );
        let chunks = collect(input);
        assert_eq!(chunks.len(), 2);
        assert!(matches!(&chunks[1], Err(GenerationError::Model(m)) if m == "model not found"));
    }

    #[test]
    fn test_stream_truncated() {
        let chunks = collect("{\"response\":\"half\",\"done\":false}\n");
        assert_eq!(chunks.len(), 2);
        assert!(matches!(chunks[1], Err(GenerationError::InvalidResponse(_))));
    }

    #[test]
    fn test_stream_malformed_line() {
        let chunks = collect("not json\n");
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].is_err());
    }

    #[test]
    fn test_single_embedding() {
        let ok = EmbedResponse {
            embeddings: vec![vec![0.1, 0.2]],
        };
        assert_eq!(single_embedding(ok).unwrap(), vec![0.1, 0.2]);

        let none = EmbedResponse { embeddings: vec![] };
        assert!(single_embedding(none).is_err());

        let two = EmbedResponse {
            embeddings: vec![vec![0.1], vec![0.2]],
        };
        assert!(single_embedding(two).is_err());

        let empty = EmbedResponse {
            embeddings: vec![vec![]],
        };
        assert!(single_embedding(empty).is_err());
    }

    #[test]
    fn test_request_bodies() {
        let body = serde_json::to_value(GenerateBody {
            model: "granite3.3:2b",
            system: "sys",
            prompt: "p",
            stream: true,
        })
        .unwrap();
        assert_eq!(body["model"], "granite3.3:2b");
        assert_eq!(body["system"], "sys");
        assert_eq!(body["stream"], true);

        let body = serde_json::to_value(EmbedBody {
            model: "nomic-embed-text:latest",
            input: "hello",
        })
        .unwrap();
        assert_eq!(body["input"], "hello");
    }

    #[test]
    fn test_backoff_delay() {
        assert_eq!(backoff_delay(1), Duration::from_secs(1));
        assert_eq!(backoff_delay(2), Duration::from_secs(2));
        assert_eq!(backoff_delay(4), Duration::from_secs(8));
        assert_eq!(backoff_delay(10), Duration::from_secs(32));
    }

    #[test]
    fn test_unreachable_server_fails() {
        let config = Config {
            ollama_url: "http://127.0.0.1:9".to_string(),
            request_timeout_secs: 2,
            ..Config::default()
        };
        let client = OllamaClient::from_config(&config).unwrap();
        let err = client.embed("hello").unwrap_err();
        assert!(matches!(err, EmbedderError::RequestFailed(_)));
    }
}
