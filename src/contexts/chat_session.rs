use crate::contexts::{GeminiError, GenerativeModel};
use crate::data::gemini::{Content, GenerateContentResponse, Part};

/// A multi-turn conversation with one model.
///
/// Turns are only committed to the history once the model has answered, so
/// a failed request can simply be retried.
pub struct ChatSession<'a, M: GenerativeModel + ?Sized> {
    backend: &'a M,
    model: String,
    history: Vec<Content>,
}

impl<'a, M: GenerativeModel + ?Sized> ChatSession<'a, M> {
    pub fn new(backend: &'a M, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            history: Vec::new(),
        }
    }

    pub fn backend(&self) -> &'a M {
        self.backend
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn history(&self) -> &[Content] {
        &self.history
    }

    /// Sends a user turn and streams the reply through `on_text`.
    pub fn send(
        &mut self,
        parts: Vec<Part>,
        on_text: &mut dyn FnMut(&str),
    ) -> Result<GenerateContentResponse, GeminiError> {
        let mut contents = self.history.clone();
        contents.push(Content::user(parts));

        let response = self.backend.stream_generate(&self.model, &contents, on_text)?;

        let reply = response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .filter(|content| !content.parts.is_empty());
        if let Some(reply) = reply {
            contents.push(Content::model(reply.parts.clone()));
            self.history = contents;
        }

        Ok(response)
    }
}
