use anyhow::Result;
use tokio::fs;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::Sessions;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Action;
use crate::domain::models::Event;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::StoredSession;
use crate::infrastructure::backends::BackendManager;

pub fn help_text() -> String {
    let text = r#"
COMMANDS:
- /new (/n) - Start a new writing session, clearing the transcript and token counters.
- /save (/s) [FILENAME?] - Append the current transcript to a session file. Defaults to a filename derived from the writing type.
- /load (/l) [PATH] [INDEX?] - List the sessions inside a transcript file, or load one of them by index.
- /modellist (/ml) - Lists all available models from the current model's backend.
- /model (/m) [MODEL_NAME,MODEL_INDEX] - Sets the specified model as the active model. You can pass either the model name, or the index from /modellist.
- /type (/w) [WRITING_TYPE] - Sets the writing type feedback is tailored to.
- /focus (/f) [CATEGORY,CATEGORY] - Sets the feedback categories to concentrate on.
- /name (/u) [NAME] - Changes the name prefixed to your submissions.
- /tokens (/tk) - Show prompt, completion, and total token usage for this session.
- /quit /exit (/q) - Exit Redpen.
- /help (/h) - Provides this help menu.

HOTKEYS:
- Up arrow - Scroll up
- Down arrow - Scroll down
- CTRL+U - Page up
- CTRL+D - Page down
- CTRL+C - Interrupt waiting for feedback if in progress, otherwise exit.
- CTRL+R - Resubmit your last message to the backend.
        "#;

    return text.trim().to_string();
}

fn send_notice(tx: &mpsc::UnboundedSender<Event>, text: &str) -> Result<()> {
    tx.send(Event::CoachMessage(Message::new_with_type(
        Role::System,
        MessageType::Notice,
        text,
    )))?;

    return Ok(());
}

fn send_error(tx: &mpsc::UnboundedSender<Event>, text: &str) -> Result<()> {
    tx.send(Event::CoachMessage(Message::new_with_type(
        Role::System,
        MessageType::Error,
        text,
    )))?;

    return Ok(());
}

fn worker_error(err: anyhow::Error, tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    return send_error(
        tx,
        &format!("The backend failed with the following error: {err:?}"),
    );
}

async fn model_list(tx: &mpsc::UnboundedSender<Event>) -> Result<()> {
    let backend = BackendManager::get(&Config::get(ConfigKey::Model))?;
    let mut models = backend.list_models().await?;
    models.sort();

    let res = models
        .iter()
        .enumerate()
        .map(|(idx, model)| {
            let n = idx + 1;
            return format!("- ({n}) {model}");
        })
        .collect::<Vec<String>>();

    return send_notice(tx, res.join("\n").as_str());
}

async fn model_set(tx: &mpsc::UnboundedSender<Event>, text: &str) -> Result<()> {
    let mut model_name = text.to_string();

    // A bare index selects from the current backend's model list.
    if let Ok(idx) = model_name.parse::<usize>() {
        let backend = BackendManager::get(&Config::get(ConfigKey::Model))?;
        let mut models = backend.list_models().await?;
        models.sort();

        if idx < 1 || idx > models.len() {
            return send_error(
                tx,
                &format!("{idx} is not a valid index from the model list."),
            );
        }
        model_name = models[idx - 1].to_string();
    }

    // Model names dispatch through the route table, so the requested model
    // may live on a different backend than the current one.
    let backend = BackendManager::get(&model_name)?;
    let models = backend.list_models().await?;
    if !models.contains(&model_name) {
        return send_error(
            tx,
            &format!(
                "No model named {model_name} found on the {} backend. Did you mistype it?",
                backend.name()
            ),
        );
    }

    Config::set(ConfigKey::Model, &model_name);

    return send_notice(tx, &format!("{model_name} has joined the session."));
}

async fn save_session(
    tx: &mpsc::UnboundedSender<Event>,
    messages: Vec<Message>,
    filename: String,
) -> Result<()> {
    match Sessions::default().save(&messages, &filename).await {
        Ok(file_path) => {
            return send_notice(
                tx,
                &format!(
                    "Saved {} messages to {}.",
                    messages.len(),
                    file_path.display()
                ),
            );
        }
        Err(err) => {
            return send_error(tx, &format!("Saving the session failed: {err}"));
        }
    }
}

fn format_stored_session(idx: usize, session: &StoredSession) -> String {
    let n = idx + 1;
    let mut res = format!("- ({n}) {}, {} messages", session.timestamp, session.messages.len());

    if let Some(first) = session.messages.first() {
        let mut line = first.content.split('\n').collect::<Vec<_>>()[0].to_string();
        if line.len() >= 70 {
            line = format!("{}...", &line[..67]);
        }
        res = format!("{res}, {line}");
    }

    return res;
}

async fn load_session(
    tx: &mpsc::UnboundedSender<Event>,
    file_path: String,
    index: Option<usize>,
) -> Result<()> {
    let bytes = match fs::read(&file_path).await {
        Ok(bytes) => bytes,
        Err(err) => {
            return send_error(tx, &format!("Could not read {file_path}: {err}"));
        }
    };

    let sessions = match Sessions::load_bytes(&bytes) {
        Ok(sessions) => sessions,
        Err(_) => {
            return send_error(
                tx,
                &format!(
                    "Could not decode {file_path}. The file may be corrupted or not in JSON format."
                ),
            );
        }
    };

    if sessions.is_empty() {
        return send_error(tx, &format!("No writing sessions found in {file_path}."));
    }

    match index {
        None => {
            let listing = sessions
                .iter()
                .enumerate()
                .map(|(idx, session)| {
                    return format_stored_session(idx, session);
                })
                .collect::<Vec<String>>()
                .join("\n");

            return send_notice(
                tx,
                &format!("{listing}\n\nLoad one with /load {file_path} INDEX."),
            );
        }
        Some(idx) => {
            if idx < 1 || idx > sessions.len() {
                return send_error(
                    tx,
                    &format!("{idx} is not a valid session index for {file_path}."),
                );
            }

            tx.send(Event::SessionLoaded(sessions[idx - 1].clone()))?;
            return Ok(());
        }
    }
}

/// The worker half of the conversation controller: takes explicit actions
/// off the channel, talks to backends and the session store, and reports
/// back as events. Backend failures become error bubbles, never panics.
pub struct ActionsService {}

impl ActionsService {
    pub async fn start(
        tx: mpsc::UnboundedSender<Event>,
        rx: &mut mpsc::UnboundedReceiver<Action>,
    ) -> Result<()> {
        // Lazy default.
        let mut worker: JoinHandle<Result<()>> = tokio::spawn(async {
            return Ok(());
        });

        loop {
            let action = rx.recv().await;
            if action.is_none() {
                continue;
            }

            let worker_tx = tx.clone();
            match action.unwrap() {
                Action::BackendAbort() => {
                    worker.abort();
                }
                Action::BackendRequest(prompt) => {
                    worker = tokio::spawn(async move {
                        let model = Config::get(ConfigKey::Model);
                        let backend = match BackendManager::get(&model) {
                            Ok(backend) => backend,
                            Err(err) => {
                                worker_error(err, &worker_tx)?;
                                return Ok(());
                            }
                        };

                        if let Err(err) = backend.stream_completion(prompt, &worker_tx).await {
                            worker_error(err, &worker_tx)?;
                        }

                        return Ok(());
                    });
                }
                Action::ModelList() => {
                    if let Err(err) = model_list(&tx).await {
                        worker_error(err, &tx)?;
                    }
                }
                Action::ModelSet(model_name) => {
                    if let Err(err) = model_set(&tx, &model_name).await {
                        worker_error(err, &tx)?;
                    }
                }
                Action::SaveSession(messages, filename) => {
                    save_session(&tx, messages, filename).await?;
                }
                Action::LoadSession(file_path, index) => {
                    load_session(&tx, file_path, index).await?;
                }
            }
        }
    }
}
