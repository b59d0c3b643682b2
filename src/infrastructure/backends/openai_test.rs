use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::CompletionChoiceResponse;
use super::CompletionDeltaResponse;
use super::CompletionResponse;
use super::MessageResponse;
use super::Model;
use super::ModelListResponse;
use super::OpenAI;
use super::StreamChoiceResponse;
use super::StreamCompletionResponse;
use super::UsageResponse;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::TokenCount;

impl OpenAI {
    fn with_url(url: String) -> OpenAI {
        return OpenAI {
            url,
            token: "abc".to_string(),
            timeout: "200".to_string(),
        };
    }
}

fn to_res(event: Option<Event>) -> Result<BackendResponse> {
    let res = match event.unwrap() {
        Event::BackendPromptResponse(res) => res,
        _ => bail!("Wrong type from recv"),
    };

    return Ok(res);
}

fn feedback_prompt() -> BackendPrompt {
    return BackendPrompt::new(vec![
        Message::new(Role::System, "Provide feedback for Essay. "),
        Message::new(Role::User, "Ann: Fix my grammar."),
    ]);
}

#[tokio::test]
async fn it_successfully_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(200).create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_successfully_health_checks_418() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(418).create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(500).create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let body = serde_json::to_string(&ModelListResponse {
        data: vec![
            Model {
                id: "first".to_string(),
            },
            Model {
                id: "second".to_string(),
            },
        ],
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/v1/models")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.list_models().await?;
    mock.assert();

    assert_eq!(res, vec!["first".to_string(), "second".to_string()]);

    return Ok(());
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = serde_json::to_string(&CompletionResponse {
        choices: vec![CompletionChoiceResponse {
            message: MessageResponse {
                content: "Your grammar is mostly sound.".to_string(),
            },
        }],
        usage: Some(UsageResponse {
            prompt_tokens: 42,
            completion_tokens: 7,
        }),
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.get_completion(feedback_prompt()).await?;

    mock.assert();

    assert_eq!(res.text, "Your grammar is mostly sound.".to_string());
    assert_eq!(res.usage, TokenCount::new(42, 7));

    return Ok(());
}

#[tokio::test]
async fn it_fails_completions_on_server_errors() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(401)
        .create();

    let backend = OpenAI::with_url(server.url());
    let res = backend.get_completion(feedback_prompt()).await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_streams_completions_with_terminal_usage() -> Result<()> {
    let first_chunk = serde_json::to_string(&StreamCompletionResponse {
        choices: vec![StreamChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some("Your grammar ".to_string()),
            },
        }],
        usage: None,
    })?;

    let second_chunk = serde_json::to_string(&StreamCompletionResponse {
        choices: vec![StreamChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some("is mostly sound.".to_string()),
            },
        }],
        usage: None,
    })?;

    let usage_chunk = serde_json::to_string(&StreamCompletionResponse {
        choices: vec![],
        usage: Some(UsageResponse {
            prompt_tokens: 42,
            completion_tokens: 7,
        }),
    })?;

    let body = [
        format!("data: {first_chunk}"),
        format!("data: {second_chunk}"),
        format!("data: {usage_chunk}"),
        "data: [DONE]".to_string(),
    ]
    .join("\n");

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("Authorization", "Bearer abc")
        .with_status(200)
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let backend = OpenAI::with_url(server.url());
    backend.stream_completion(feedback_prompt(), &tx).await?;

    mock.assert();

    let first_recv = to_res(rx.recv().await)?;
    let second_recv = to_res(rx.recv().await)?;
    let third_recv = to_res(rx.recv().await)?;

    assert_eq!(first_recv.text, "Your grammar ".to_string());
    assert!(!first_recv.done);
    assert_eq!(first_recv.usage, None);

    assert_eq!(second_recv.text, "is mostly sound.".to_string());
    assert!(!second_recv.done);

    assert!(third_recv.text.is_empty());
    assert!(third_recv.done);
    assert_eq!(third_recv.usage, Some(TokenCount::new(42, 7)));

    return Ok(());
}

#[tokio::test]
async fn it_closes_the_round_when_no_usage_is_reported() -> Result<()> {
    let chunk = serde_json::to_string(&StreamCompletionResponse {
        choices: vec![StreamChoiceResponse {
            delta: CompletionDeltaResponse {
                content: Some("Short.".to_string()),
            },
        }],
        usage: None,
    })?;

    let body = [format!("data: {chunk}"), "data: [DONE]".to_string()].join("\n");

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let backend = OpenAI::with_url(server.url());
    backend.stream_completion(feedback_prompt(), &tx).await?;

    mock.assert();

    let first_recv = to_res(rx.recv().await)?;
    let second_recv = to_res(rx.recv().await)?;

    assert_eq!(first_recv.text, "Short.".to_string());
    assert!(second_recv.done);
    assert_eq!(second_recv.usage, None);

    return Ok(());
}
