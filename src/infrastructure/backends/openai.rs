#[cfg(test)]
#[path = "openai_test.rs"]
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
struct StreamOptions {
    include_usage: bool,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<MessageRequest>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    stream_options: Option<StreamOptions>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct UsageResponse {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct MessageResponse {
    content: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionChoiceResponse {
    message: MessageResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoiceResponse>,
    usage: Option<UsageResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct CompletionDeltaResponse {
    content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StreamChoiceResponse {
    delta: CompletionDeltaResponse,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StreamCompletionResponse {
    #[serde(default)]
    choices: Vec<StreamChoiceResponse>,
    usage: Option<UsageResponse>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Model {
    id: String,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct ModelListResponse {
    data: Vec<Model>,
}

/// The hosted backend: an authenticated OpenAI-shaped chat-completion API
/// reached over the network.
pub struct OpenAI {
    url: String,
    token: String,
    timeout: String,
}

impl Default for OpenAI {
    fn default() -> OpenAI {
        return OpenAI {
            url: Config::get(ConfigKey::OpenAiURL),
            token: Config::get(ConfigKey::OpenAiToken),
            timeout: Config::get(ConfigKey::BackendHealthCheckTimeout),
        };
    }
}

#[async_trait]
impl Backend for OpenAI {
    fn name(&self) -> BackendName {
        return BackendName::OpenAI;
    }

    #[allow(clippy::implicit_return)]
    async fn health_check(&self) -> Result<()> {
        if self.url.is_empty() {
            bail!("OpenAI URL is not defined");
        }
        if self.token.is_empty() {
            bail!("OpenAI token is not defined");
        }

        // OpenAI are trolls with their API where the index either returns a
        // 404 or a 418. If using the official API, don't bother health
        // checking it.
        if self.url == "https://api.openai.com" {
            return Ok(());
        }

        let res = reqwest::Client::new()
            .get(&self.url)
            .timeout(Duration::from_millis(self.timeout.parse::<u64>()?))
            .send()
            .await;

        if res.is_err() {
            tracing::error!(error = ?res.unwrap_err(), "OpenAI is not reachable");
            bail!("OpenAI is not reachable");
        }

        let status = res.unwrap().status().as_u16();
        if status >= 400 {
            tracing::error!(status = status, "OpenAI health check failed");
            bail!("OpenAI health check failed");
        }

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn list_models(&self) -> Result<Vec<String>> {
        let res = reqwest::Client::new()
            .get(format!("{url}/v1/models", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .send()
            .await?
            .json::<ModelListResponse>()
            .await?;

        let mut models: Vec<String> = res
            .data
            .iter()
            .map(|model| {
                return model.id.to_string();
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
            stream_options: None,
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to OpenAI"
            );
            bail!("Failed to make completion request to OpenAI");
        }

        let body = res.json::<CompletionResponse>().await?;
        tracing::debug!(body = ?body, "Completion response");

        if body.choices.is_empty() {
            bail!("OpenAI returned no completion choices");
        }

        let usage = body.usage.unwrap_or_default();

        return Ok(Completion {
            text: body.choices[0].message.content.to_string(),
            usage: TokenCount::new(usage.prompt_tokens, usage.completion_tokens),
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
            // Asks for a terminal chunk carrying token usage, which closes
            // the round without a second non-streaming call.
            stream_options: Some(StreamOptions {
                include_usage: true,
            }),
        };

        let res = reqwest::Client::new()
            .post(format!("{url}/v1/chat/completions", url = self.url))
            .header("Authorization", format!("Bearer {}", self.token))
            .json(&req)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                "Failed to make completion request to OpenAI"
            );
            bail!("Failed to make completion request to OpenAI");
        }

        let stream = res.bytes_stream().map_err(convert_err);
        let mut lines_reader = StreamReader::new(stream).lines();

        let mut usage: Option<TokenCount> = None;
        loop {
            let line = match lines_reader.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    tracing::error!(error = ?err, "Stream from OpenAI failed");
                    bail!("The stream from OpenAI failed mid-response");
                }
            };

            let mut cleaned_line = line.trim().to_string();
            if cleaned_line.starts_with("data:") {
                cleaned_line = cleaned_line.split_off(5).trim().to_string();
            }
            if cleaned_line.is_empty() {
                continue;
            }
            if cleaned_line == "[DONE]" {
                break;
            }

            let chunk: StreamCompletionResponse = match serde_json::from_str(&cleaned_line) {
                Ok(chunk) => chunk,
                Err(err) => {
                    tracing::error!(error = ?err, line = cleaned_line, "Malformed stream chunk from OpenAI");
                    bail!("OpenAI returned a malformed stream chunk");
                }
            };
            tracing::debug!(body = ?chunk, "Completion chunk");

            if let Some(chunk_usage) = chunk.usage {
                usage = Some(TokenCount::new(
                    chunk_usage.prompt_tokens,
                    chunk_usage.completion_tokens,
                ));
            }

            if let Some(choice) = chunk.choices.first() {
                if let Some(text) = choice.delta.content.clone() {
                    if !text.is_empty() {
                        tx.send(Event::BackendPromptResponse(BackendResponse {
                            role: Role::Assistant,
                            text,
                            done: false,
                            usage: None,
                        }))?;
                    }
                }
            }
        }

        tx.send(Event::BackendPromptResponse(BackendResponse {
            role: Role::Assistant,
            text: "".to_string(),
            done: true,
            usage,
        }))?;

        return Ok(());
    }
}
