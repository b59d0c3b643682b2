use tui_textarea::Input;

use super::BackendResponse;
use super::Message;
use super::StoredSession;

pub enum Event {
    BackendPromptResponse(BackendResponse),
    CoachMessage(Message),
    SessionLoaded(StoredSession),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLR(),
    KeyboardEnter(),
    KeyboardPaste(String),
    UITick(),
    UIScrollDown(),
    UIScrollUp(),
    UIScrollPageDown(),
    UIScrollPageUp(),
}
