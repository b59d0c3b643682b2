use super::BackendPrompt;
use super::Message;

/// Work dispatched from the UI to the actions worker. Each operation the
/// interface can trigger maps to one explicit variant.
pub enum Action {
    BackendAbort(),
    BackendRequest(BackendPrompt),
    LoadSession(String, Option<usize>),
    ModelList(),
    ModelSet(String),
    SaveSession(Vec<Message>, String),
}
