#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

use super::CoachSettings;
use super::Event;
use super::Message;
use super::Role;
use super::TokenCount;

#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum BackendName {
    Ollama,
    OpenAI,
}

/// A fully composed chat request: the system instructions followed by the
/// session transcript, in the order the backend should see them.
pub struct BackendPrompt {
    pub messages: Vec<Message>,
}

impl BackendPrompt {
    pub fn new(messages: Vec<Message>) -> BackendPrompt {
        return BackendPrompt { messages };
    }

    /// Builds the outgoing request: the standing instructions with the
    /// writing-type and feedback-focus directives appended, a fixed second
    /// directive, then the full transcript including the newest user entry.
    pub fn compose(settings: &CoachSettings, transcript: &[Message]) -> BackendPrompt {
        let lead = format!(
            "{}Provide feedback for {}. Focus on the following aspects: {}. ",
            settings.instructions,
            settings.writing_type,
            settings.focus.join(", ")
        );

        let mut messages = vec![
            Message::new(Role::System, &lead),
            Message::new(
                Role::System,
                "Provide constructive feedback, explain your suggestions, and offer specific examples for improvement.",
            ),
        ];
        messages.extend(transcript.iter().cloned());

        return BackendPrompt::new(messages);
    }
}

/// One streamed fragment of assistant output. The final event carries
/// `done: true` along with whatever token usage the backend reported in its
/// terminal chunk.
pub struct BackendResponse {
    pub role: Role,
    pub text: String,
    pub done: bool,
    pub usage: Option<TokenCount>,
}

/// A completed non-streaming response.
pub struct Completion {
    pub text: String,
    pub usage: TokenCount,
}

#[async_trait]
pub trait Backend {
    fn name(&self) -> BackendName;

    /// Used at startup to verify the backend is reachable before the first
    /// submission.
    async fn health_check(&self) -> Result<()>;

    /// Called for the `/modellist` and `/model` commands to provide all
    /// available models for the backend.
    async fn list_models(&self) -> Result<Vec<String>>;

    /// Requests a single completed response plus its token counts. Failures
    /// are surfaced to the user by the caller and degrade to no output.
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<Completion>;

    /// Requests a streamed completion. Text deltas are passed through the
    /// channel as they arrive, and a final `done` response closes the round
    /// carrying the usage counts from the backend's terminal chunk.
    async fn stream_completion<'a>(
        &self,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()>;
}
