use tokio_util::sync::CancellationToken;

use crate::console::{Output, status};
use crate::error::RagError;
use crate::generator::Generator;
use crate::rag::prompt::AssembledPrompt;

const WORKING_MESSAGE: &str = "Generating response...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Wait for the complete answer, then print it.
    Whole,
    /// Print each chunk as soon as it arrives.
    Streaming,
}

impl DeliveryMode {
    pub fn from_stream_flag(stream: bool) -> Self {
        if stream { Self::Streaming } else { Self::Whole }
    }
}

/// Run the generation call and render its output. Returns the full text.
pub fn deliver(
    generator: &dyn Generator,
    prompt: &AssembledPrompt,
    mode: DeliveryMode,
    output: &dyn Output,
    token: &CancellationToken,
) -> Result<String, RagError> {
    let request = prompt.request();
    output.print("");

    let text = match mode {
        DeliveryMode::Whole => {
            let text = {
                let _working = status(output, WORKING_MESSAGE);
                generator.generate(&request)?
            };
            if token.is_cancelled() {
                return Err(RagError::Cancelled);
            }
            output.print(&text);
            text
        }
        DeliveryMode::Streaming => {
            // The indicator only covers the wait for the first chunk.
            let mut working = Some(status(output, WORKING_MESSAGE));
            let chunks = generator.generate_stream(&request)?;

            let mut text = String::new();
            for chunk in chunks {
                if token.is_cancelled() {
                    return Err(RagError::Cancelled);
                }
                let chunk = chunk?;
                drop(working.take());
                output.print_inline(&chunk);
                text.push_str(&chunk);
            }
            drop(working);
            output.print("");
            text
        }
    };

    output.print("");
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::{MemoryOutput, OutputEvent};
    use crate::generator::mock::MockGenerator;
    use crate::rag::prompt::assemble;

    const REPLY: &str = "Connect with the VPN client, then sign in.";

    fn prompt() -> AssembledPrompt {
        assemble("sys", "Use VPN for remote access.", "How?", None)
    }

    #[test]
    fn test_whole_response() {
        let generator = MockGenerator::new(REPLY);
        let output = MemoryOutput::new();
        let text = deliver(
            &generator,
            &prompt(),
            DeliveryMode::Whole,
            &output,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(text, REPLY);
        assert_eq!(output.lines(), vec!["", REPLY, ""]);
        assert!(output.events().contains(&OutputEvent::Status(WORKING_MESSAGE.to_string())));
        assert!(!generator.requests()[0].stream);
    }

    #[test]
    fn test_streaming_renders_chunks_in_order() {
        let generator = MockGenerator::new(REPLY);
        let output = MemoryOutput::new();
        let text = deliver(
            &generator,
            &prompt(),
            DeliveryMode::Streaming,
            &output,
            &CancellationToken::new(),
        )
        .unwrap();

        assert_eq!(text, REPLY);
        let inline: Vec<String> = output
            .events()
            .into_iter()
            .filter_map(|e| match e {
                OutputEvent::Inline(chunk) => Some(chunk),
                _ => None,
            })
            .collect();
        assert_eq!(inline, generator.chunks());
        assert!(inline.len() > 1);
        assert!(generator.requests()[0].stream);
    }

    #[test]
    fn test_modes_render_same_text() {
        let token = CancellationToken::new();

        let whole_out = MemoryOutput::new();
        let whole = deliver(
            &MockGenerator::new(REPLY),
            &prompt(),
            DeliveryMode::Whole,
            &whole_out,
            &token,
        )
        .unwrap();

        let stream_out = MemoryOutput::new();
        let streamed = deliver(
            &MockGenerator::new(REPLY),
            &prompt(),
            DeliveryMode::Streaming,
            &stream_out,
            &token,
        )
        .unwrap();

        assert_eq!(whole, streamed);
        assert_eq!(whole_out.text(), stream_out.text());
    }

    #[test]
    fn test_streaming_status_cleared_before_first_chunk() {
        let generator = MockGenerator::new("a b");
        let output = MemoryOutput::new();
        deliver(
            &generator,
            &prompt(),
            DeliveryMode::Streaming,
            &output,
            &CancellationToken::new(),
        )
        .unwrap();

        let events = output.events();
        let cleared = events
            .iter()
            .position(|e| *e == OutputEvent::StatusCleared)
            .unwrap();
        let first_chunk = events
            .iter()
            .position(|e| matches!(e, OutputEvent::Inline(_)))
            .unwrap();
        assert!(cleared < first_chunk);
    }

    #[test]
    fn test_streaming_cancelled() {
        let generator = MockGenerator::new(REPLY);
        let token = CancellationToken::new();
        token.cancel();
        let result = deliver(
            &generator,
            &prompt(),
            DeliveryMode::Streaming,
            &MemoryOutput::new(),
            &token,
        );
        assert!(matches!(result, Err(RagError::Cancelled)));
    }

    #[test]
    fn test_generation_failure_propagates() {
        let output = MemoryOutput::new();
        let result = deliver(
            &MockGenerator::failing(),
            &prompt(),
            DeliveryMode::Whole,
            &output,
            &CancellationToken::new(),
        );
        assert!(matches!(result, Err(RagError::Generation(_))));
        assert_eq!(output.events().last(), Some(&OutputEvent::StatusCleared));
    }
}
