#[cfg(test)]
#[path = "ollama_test.rs"]
mod tests;

use std::time::Duration;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use futures::stream::TryStreamExt;
use serde_derive::Deserialize;
use serde_derive::Serialize;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tokio_util::io::StreamReader;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::BackendName;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::Completion;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::TokenCount;

fn convert_err(err: reqwest::Error) -> std::io::Error {
    let err_msg = err.to_string();
    return std::io::Error::new(std::io::ErrorKind::Interrupted, err_msg);
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageRequest {
    role: String,
    content: String,
}

impl MessageRequest {
    fn from_message(message: &Message) -> MessageRequest {
        return MessageRequest {
            role: message.role.as_str().to_string(),
            content: message.content.to_string(),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    stream: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageResponse {
    #[serde(default)]
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    message: MessageResponse,
    done: bool,
    // Both counts are absent on delta chunks and may be omitted entirely
    // when the prompt was served from cache.
    #[serde(default)]
    prompt_eval_count: u64,
    #[serde(default)]
    eval_count: u64,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    name: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    pub models: Vec<Model>,
}

/// The local backend: an Ollama-shaped chat API served by a locally running
/// process, no authentication.
pub struct Ollama {
    url: String,
    timeout: String,
}

impl Default for Ollama {
    fn default() -> Ollama {
        return Ollama {
            url: Config::get(ConfigKey::OllamaURL),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for Ollama {
    fn name(&self) -> BackendName {
        return BackendName::Ollama;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "Ollama is not running");
            bail!("Ollama is not running");
        }

        let res = res.unwrap();
        if res.status() != 200 {
            tracing::error!(status = res.status().as_u16(), "Ollama health check failed");
            bail!("Ollama health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/api/tags", url = self.url))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .models
            .iter()
            .map(|model| {
                return model.name.to_string();
            })
            .collect();

        models.sort();

        return Ok(models);
    }

    #[allow(clippy::implicit_return)]
    async fn get_completion(&self, prompt: BackendPrompt) -> Result<Completion> {
        let req = CompletionRequest {
            model: Config::get(ConfigKey::Model),
            messages: prompt
                .messages
                .iter()
                .map(|message| {
                    return MessageRequest::from_message(message);
                })
                .collect(),
            stream: false,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/api/chat", url = self.url))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Ollama"
            );
            bail!("Failed to make completion request to Ollama");
        }

        let body = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?body, "Completion response");

        return Ok(Completion {
            text: body.message.content.to_string(),
            usage: TokenCount::new(body.prompt_eval_count, body.eval_count),
        });
    }

    #[allow(clippy::implicit_return)]
    async fn stream_completion<'a>(
        &self,
        prompt: BackendPrompt,
        tx: &'a mpsc::UnboundedSender<Event>,
    ) -> Result<()> {
        let req = CompletionRequest {
            model: Config::get(ConfigKey::Model),
            messages: prompt
                .messages
                .iter()
                .map(|message| {
                    return MessageRequest::from_message(message);
                })
                .collect(),
            stream: true,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/api/chat", url = self.url))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to Ollama"
            );
            bail!("Failed to make completion request to Ollama");
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut sent_done = false;
        loop {
            let line = match lines_reader.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = ?err, "Stream from Ollama failed");
                    bail!("The stream from Ollama failed mid-response");
                }
            };

            let chunk: CompletionResponse = match serde_json::from_str(&line) {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::error!(error = ?err, "Malformed stream chunk from Ollama");
                    bail!("Ollama returned a malformed stream chunk");
                }
            };
            tracing::debug!(body = ?chunk, "Completion chunk");

            if !chunk.message.content.is_empty() {
                tx.send(Event::BackendPromptResponse(BackendResponse {
                    role: Role::Assistant,
                    text: chunk.message.content.to_string(),
                    done: false,
                    usage: None,
                }))?;
            }

            // The terminal chunk carries the token counts for the round.
            if chunk.done {
                tx.send(Event::BackendPromptResponse(BackendResponse {
                    role: Role::Assistant,
                    text: "".to_string(),
                    done: true,
                    usage: Some(TokenCount::new(chunk.prompt_eval_count, chunk.eval_count)),
                }))?;
                sent_done = true;
                break;
            }
        }

        if !sent_done {
            tx.send(Event::BackendPromptResponse(BackendResponse {
                role: Role::Assistant,
                text: "".to_string(),
                done: true,
                usage: None,
            }))?;
        }

        return Ok(());
    }
}
