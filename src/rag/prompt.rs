use crate::generator::GenerationRequest;

/// System instruction plus the user-facing prompt for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssembledPrompt {
    pub system: String,
    pub prompt: String,
}

impl AssembledPrompt {
    pub fn request(&self) -> GenerationRequest<'_> {
        GenerationRequest {
            system: &self.system,
            prompt: &self.prompt,
        }
    }
}

/// Inline `context` verbatim (up to `max_context_chars` characters, if set)
/// ahead of the question.
pub fn assemble(
    system: &str,
    context: &str,
    question: &str,
    max_context_chars: Option<usize>,
) -> AssembledPrompt {
    let context = match max_context_chars {
        Some(limit) => truncate_chars(context, limit),
        None => context,
    };

    AssembledPrompt {
        system: system.to_string(),
        prompt: format!("Using this data: {context}. Respond to this prompt: {question}"),
    }
}

fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
