use anyhow::bail;
use anyhow::Result;
use tokio::sync::mpsc;

use super::CompletionResponse;
use super::MessageResponse;
use super::Model;
use super::ModelListResponse;
use super::Ollama;
use crate::domain::models::Backend;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::Role;
use crate::domain::models::TokenCount;

impl Ollama {
    fn with_url(url: String) -> Ollama {
        return Ollama {
            url,
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

    let backend = Ollama::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_ok());
    mock.assert();
}

#[tokio::test]
async fn it_fails_health_checks() {
    let mut server = mockito::Server::new();
    let mock = server.mock("GET", "/").with_status(500).create();

    let backend = Ollama::with_url(server.url());
    let res = backend.health_check().await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_lists_models() -> Result<()> {
    let body = serde_json::to_string(&ModelListResponse {
        models: vec![
            Model {
                name: "first".to_string(),
            },
            Model {
                name: "second".to_string(),
            },
        ],
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/api/tags")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = Ollama::with_url(server.url());
    let res = backend.list_models().await?;

    assert_eq!(res, vec!["first".to_string(), "second".to_string()]);
    mock.assert();

    return Ok(());
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let body = serde_json::to_string(&CompletionResponse {
        message: MessageResponse {
            content: "Your grammar is mostly sound.".to_string(),
        },
        done: true,
        prompt_eval_count: 18,
        eval_count: 5,
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(body)
        .create();

    let backend = Ollama::with_url(server.url());
    let res = backend.get_completion(feedback_prompt()).await?;

    mock.assert();

    assert_eq!(res.text, "Your grammar is mostly sound.".to_string());
    assert_eq!(res.usage, TokenCount::new(18, 5));

    return Ok(());
}

#[tokio::test]
async fn it_fails_completions_on_server_errors() {
    let mut server = mockito::Server::new();
    let mock = server.mock("POST", "/api/chat").with_status(500).create();

    let backend = Ollama::with_url(server.url());
    let res = backend.get_completion(feedback_prompt()).await;

    assert!(res.is_err());
    mock.assert();
}

#[tokio::test]
async fn it_streams_completions_with_terminal_usage() -> Result<()> {
    let first_chunk = serde_json::to_string(&CompletionResponse {
        message: MessageResponse {
            content: "Your grammar ".to_string(),
        },
        done: false,
        prompt_eval_count: 0,
        eval_count: 0,
    })?;

    let second_chunk = serde_json::to_string(&CompletionResponse {
        message: MessageResponse {
            content: "is mostly sound.".to_string(),
        },
        done: false,
        prompt_eval_count: 0,
        eval_count: 0,
    })?;

    let done_chunk = serde_json::to_string(&CompletionResponse {
        message: MessageResponse {
            content: "".to_string(),
        },
        done: true,
        prompt_eval_count: 18,
        eval_count: 5,
    })?;

    let body = [first_chunk, second_chunk, done_chunk].join("\n");

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(body)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let backend = Ollama::with_url(server.url());
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
    assert_eq!(third_recv.usage, Some(TokenCount::new(18, 5)));

    return Ok(());
}

#[tokio::test]
async fn it_closes_the_round_on_truncated_streams() -> Result<()> {
    let chunk = serde_json::to_string(&CompletionResponse {
        message: MessageResponse {
            content: "Short.".to_string(),
        },
        done: false,
        prompt_eval_count: 0,
        eval_count: 0,
    })?;

    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/api/chat")
        .with_status(200)
        .with_body(chunk)
        .create();

    let (tx, mut rx) = mpsc::unbounded_channel::<Event>();

    let backend = Ollama::with_url(server.url());
    backend.stream_completion(feedback_prompt(), &tx).await?;

    mock.assert();

    let first_recv = to_res(rx.recv().await)?;
    let second_recv = to_res(rx.recv().await)?;

    assert_eq!(first_recv.text, "Short.".to_string());
    assert!(second_recv.done);
    assert_eq!(second_recv.usage, None);

    return Ok(());
}
