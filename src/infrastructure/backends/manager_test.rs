use anyhow::Result;

use super::backend_for_model;
use super::register_model_route;
use super::BackendManager;
use crate::domain::models::BackendName;

#[test]
fn it_routes_allow_listed_models_to_the_hosted_backend() {
    for model in ["gpt-4o", "gpt-4o-mini", "gpt-4-turbo", "gpt-3.5-turbo"] {
        assert_eq!(backend_for_model(model), BackendName::OpenAI);
    }
}

#[test]
fn it_routes_everything_else_to_the_local_backend() {
    for model in [
        "llama3.1:8b",
        "gemma2:2b",
        "mistral-nemo:latest",
        "phi3:latest",
        "",
    ] {
        assert_eq!(backend_for_model(model), BackendName::Ollama);
    }
}

#[test]
fn it_accepts_registered_routes() {
    register_model_route("acme-", BackendName::OpenAI);

    assert_eq!(backend_for_model("acme-large"), BackendName::OpenAI);
    assert_eq!(backend_for_model("acme"), BackendName::Ollama);
}

#[test]
fn it_prefers_the_longest_matching_prefix() {
    register_model_route("gpt-local-", BackendName::Ollama);

    assert_eq!(backend_for_model("gpt-local-7b"), BackendName::Ollama);
    assert_eq!(backend_for_model("gpt-4o"), BackendName::OpenAI);
}

#[test]
fn it_builds_backends_by_model_name() -> Result<()> {
    assert_eq!(BackendManager::get("gpt-4o")?.name(), BackendName::OpenAI);
    assert_eq!(
        BackendManager::get("phi3:latest")?.name(),
        BackendName::Ollama
    );
    return Ok(());
}
