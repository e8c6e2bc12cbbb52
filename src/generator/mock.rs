/// Scripted generator for testing purposes.
///
/// Replies with a fixed text and records every request it receives, so tests
/// can inspect the exact system instruction and prompt that reached the model.
use std::sync::Mutex;

use super::{ChunkStream, GenerationError, GenerationRequest, Generator};

/// A request as seen by [`MockGenerator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub system: String,
    pub prompt: String,
    pub stream: bool,
}

pub struct MockGenerator {
    reply: String,
    fail: bool,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockGenerator {
    /// A generator that always answers `reply`.
    #[must_use]
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            fail: false,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A generator whose every call fails.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("")
        }
    }

    /// Requests received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// The chunks a streaming call yields: the reply split after each space.
    #[must_use]
    pub fn chunks(&self) -> Vec<String> {
        self.reply
            .split_inclusive(' ')
            .map(str::to_string)
            .collect()
    }

    fn record(&self, request: &GenerationRequest<'_>, stream: bool) -> Result<(), GenerationError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                system: request.system.to_string(),
                prompt: request.prompt.to_string(),
                stream,
            });
        }
        if self.fail {
            return Err(GenerationError::RequestFailed(
                "mock generator configured to fail".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for MockGenerator {
    fn default() -> Self {
        Self::new("Connect through the company VPN before using remote services.")
    }
}

impl Generator for MockGenerator {
    fn generate(&self, request: &GenerationRequest<'_>) -> Result<String, GenerationError> {
        self.record(request, false)?;
        Ok(self.reply.clone())
    }

    fn generate_stream(
        &self,
        request: &GenerationRequest<'_>,
    ) -> Result<ChunkStream, GenerationError> {
        self.record(request, true)?;
        Ok(Box::new(self.chunks().into_iter().map(Ok)))
    }

    fn model_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUEST: GenerationRequest<'static> = GenerationRequest {
        system: "be brief",
        prompt: "why?",
    };

    #[test]
    fn test_mock_records_requests() {
        let generator = MockGenerator::new("because");
        assert_eq!(generator.generate(&REQUEST).unwrap(), "because");

        let requests = generator.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].system, "be brief");
        assert_eq!(requests[0].prompt, "why?");
        assert!(!requests[0].stream);
    }

    #[test]
    fn test_mock_stream_concatenates_to_reply() {
        let generator = MockGenerator::new("one two three");
        let chunks: Vec<String> = generator
            .generate_stream(&REQUEST)
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(chunks, vec!["one ", "two ", "three"]);
        assert_eq!(chunks.concat(), "one two three");
    }

    #[test]
    fn test_mock_failing() {
        let generator = MockGenerator::failing();
        assert!(generator.generate(&REQUEST).is_err());
        assert!(generator.generate_stream(&REQUEST).is_err());
        assert_eq!(generator.requests().len(), 2);
    }

    #[test]
    fn test_mock_model_name() {
        assert_eq!(MockGenerator::default().model_name(), "mock");
    }
}
