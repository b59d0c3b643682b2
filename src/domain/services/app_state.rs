#[cfg(test)]
#[path = "app_state_test.rs"]
mod tests;

use anyhow::Result;
use ratatui::prelude::Rect;
use tokio::sync::mpsc;

use super::actions::help_text;
use super::BubbleList;
use super::Scroll;
use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::default_session_filename;
use crate::domain::models::Action;
use crate::domain::models::BackendPrompt;
use crate::domain::models::BackendResponse;
use crate::domain::models::CoachSettings;
use crate::domain::models::Conversation;
use crate::domain::models::Message;
use crate::domain::models::MessageType;
use crate::domain::models::Role;
use crate::domain::models::SlashCommand;
use crate::domain::models::StoredSession;
use crate::domain::models::ThemeName;
use crate::infrastructure::backends::BackendManager;

/// The interactive half of the conversation controller. Owns the active
/// session and decides what each keypress-level event does to it; anything
/// that talks to a backend or the filesystem is handed to the actions worker
/// through the channel.
pub struct AppState {
    pub conversation: Conversation,
    pub bubble_list: BubbleList,
    pub scroll: Scroll,
    pub waiting_for_backend: bool,
    stream_in_flight: bool,
    pub last_known_width: u16,
    pub last_known_height: u16,
}

impl AppState {
    pub async fn new(model: &str, theme: ThemeName) -> Result<AppState> {
        let mut app_state = AppState {
            conversation: Conversation::default(),
            bubble_list: BubbleList::new(theme),
            scroll: Scroll::default(),
            waiting_for_backend: false,
            stream_in_flight: false,
            last_known_width: 0,
            last_known_height: 0,
        };

        app_state.conversation.push(Message::new_with_type(
            Role::System,
            MessageType::Notice,
            "Welcome! Paste text to get feedback on it, or run /help to see every command.",
        ));

        let backend = BackendManager::get(model)?;
        if let Err(err) = backend.health_check().await {
            app_state.conversation.push(Message::new_with_type(
                Role::System,
                MessageType::Error,
                &format!("The {} backend isn't reachable, so feedback requests will fail until it is. Error: {err}", backend.name()),
            ));
        } else if let Ok(models) = backend.list_models().await {
            if !models.contains(&model.to_string()) {
                app_state.conversation.push(Message::new_with_type(
                    Role::System,
                    MessageType::Error,
                    &format!("Model {model} doesn't exist on the {} backend. Use /modellist to see what's available, and /model NAME to switch.", backend.name()),
                ));
            }
        }

        return Ok(app_state);
    }

    pub fn set_rect(&mut self, rect: Rect) {
        self.last_known_width = rect.width;
        self.last_known_height = rect.height;
        self.sync_dependants();
    }

    pub fn add_message(&mut self, message: Message) {
        self.conversation.push(message);
        self.sync_dependants();
        self.scroll.jump_to_end();
    }

    fn add_notice(&mut self, content: &str) {
        self.add_message(Message::new_with_type(
            Role::System,
            MessageType::Notice,
            content,
        ));
    }

    fn add_error(&mut self, content: &str) {
        self.add_message(Message::new_with_type(
            Role::System,
            MessageType::Error,
            content,
        ));
    }

    /// Streams append to a single in-flight assistant message. The terminal
    /// response closes the round and carries the backend's usage counts;
    /// until it arrives the tail message is provisional and is discarded if
    /// the round fails or is aborted.
    pub fn handle_backend_response(&mut self, res: BackendResponse) {
        if !self.stream_in_flight {
            return;
        }

        if !res.text.is_empty() {
            let tail_is_reply = matches!(
                self.conversation.messages().last(),
                Some(last) if last.role == Role::Assistant && last.message_type() == MessageType::Normal
            );

            if tail_is_reply {
                if let Some(tail) = self.conversation.last_mut() {
                    tail.append(&res.text);
                }
            } else {
                self.conversation.push(Message::new(res.role, &res.text));
            }
        }

        if res.done {
            self.stream_in_flight = false;
            self.waiting_for_backend = false;
            if let Some(usage) = res.usage {
                self.conversation.add_usage(usage);
            }
        }

        self.sync_dependants();
        self.scroll.jump_to_end();
    }

    fn discard_inflight_reply(&mut self) {
        if !self.stream_in_flight {
            return;
        }

        let tail_is_reply = matches!(
            self.conversation.messages().last(),
            Some(last) if last.role == Role::Assistant && last.message_type() == MessageType::Normal
        );
        if tail_is_reply {
            self.conversation.pop();
        }

        self.stream_in_flight = false;
    }

    /// Notices and errors from the worker end whatever round is in flight: a
    /// failed round keeps only the user's message, never a partial reply.
    pub fn handle_coach_message(&mut self, message: Message) {
        self.discard_inflight_reply();
        self.waiting_for_backend = false;
        self.add_message(message);
    }

    pub fn handle_session_loaded(&mut self, session: StoredSession) {
        self.discard_inflight_reply();
        self.waiting_for_backend = false;
        self.conversation.replace_transcript(session.messages);
        self.add_notice(&format!(
            "Loaded the writing session from {}.",
            session.timestamp
        ));
    }

    pub fn abort_backend_request(&mut self) {
        self.discard_inflight_reply();
        self.waiting_for_backend = false;
        self.add_notice("Feedback request interrupted.");
    }

    pub fn submit_feedback_request(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        let settings = CoachSettings::from_config();
        let prompt = BackendPrompt::compose(&settings, &self.conversation.transcript());

        self.waiting_for_backend = true;
        self.stream_in_flight = true;
        tx.send(Action::BackendRequest(prompt))?;

        return Ok(());
    }

    /// CTRL+R: resubmits the pending user message after a failed or
    /// interrupted round. Does nothing once a reply has landed.
    pub fn resubmit(&mut self, tx: &mpsc::UnboundedSender<Action>) -> Result<()> {
        let tail_is_user = matches!(
            self.conversation.transcript().last(),
            Some(last) if last.role == Role::User
        );
        if tail_is_user {
            self.submit_feedback_request(tx)?;
        }

        return Ok(());
    }

    /// Returns (should_break, was_handled).
    pub fn handle_slash_commands(
        &mut self,
        input: &str,
        tx: &mpsc::UnboundedSender<Action>,
    ) -> Result<(bool, bool)> {
        let command = match SlashCommand::parse(input) {
            Some(command) => command,
            None => return Ok((false, false)),
        };

        if command.is_quit() {
            return Ok((true, true));
        }

        // Echo the command as a notice-typed bubble so it shows in the chat
        // without entering the transcript.
        self.add_message(Message::new_with_type(
            Role::User,
            MessageType::Notice,
            input,
        ));

        if command.is_new_session() {
            self.conversation.reset();
            self.add_notice("Started a new writing session.");
            return Ok((false, true));
        }

        if command.is_model_list() {
            self.waiting_for_backend = true;
            tx.send(Action::ModelList())?;
            return Ok((false, true));
        }

        if command.is_model_set() {
            match command.args.first() {
                Some(model) => {
                    self.waiting_for_backend = true;
                    tx.send(Action::ModelSet(model.to_string()))?;
                }
                None => {
                    self.add_error(
                        "You must specify a model name or index with /model. Run /modellist to see what's available.",
                    );
                }
            }
            return Ok((false, true));
        }

        if command.is_writing_type() {
            match CoachSettings::parse_writing_type(&command.args.join(" ")) {
                Ok(writing_type) => {
                    Config::set(ConfigKey::WritingType, &writing_type);
                    self.add_notice(&format!("Feedback will now target {writing_type} writing."));
                }
                Err(err) => self.add_error(&err.to_string()),
            }
            return Ok((false, true));
        }

        if command.is_name() {
            let name = command.args.join(" ");
            if name.trim().is_empty() {
                self.add_error("You must provide a name, like /name Ann.");
            } else {
                Config::set(ConfigKey::Username, name.trim());
                self.add_notice(&format!("Your feedback requests will be signed {}.", name.trim()));
            }
            return Ok((false, true));
        }

        if command.is_focus() {
            match CoachSettings::parse_focus(&command.args.join(" ")) {
                Ok(focus) => {
                    Config::set(ConfigKey::FeedbackFocus, &focus.join(","));
                    self.add_notice(&format!("Focusing feedback on: {}.", focus.join(", ")));
                }
                Err(err) => self.add_error(&err.to_string()),
            }
            return Ok((false, true));
        }

        if command.is_save() {
            let filename = match command.args.first() {
                Some(filename) => filename.to_string(),
                None => default_session_filename(&Config::get(ConfigKey::WritingType)),
            };
            self.waiting_for_backend = true;
            tx.send(Action::SaveSession(self.conversation.transcript(), filename))?;
            return Ok((false, true));
        }

        if command.is_load() {
            match command.args.first() {
                Some(file_path) => {
                    let index = match command.args.get(1) {
                        Some(raw) => match raw.parse::<usize>() {
                            Ok(index) => Some(index),
                            Err(_) => {
                                self.add_error("The session index must be a number, like /load sessions.json 2.");
                                return Ok((false, true));
                            }
                        },
                        None => None,
                    };
                    self.waiting_for_backend = true;
                    tx.send(Action::LoadSession(file_path.to_string(), index))?;
                }
                None => {
                    self.add_notice("No session file given. Usage: /load PATH [INDEX].");
                }
            }
            return Ok((false, true));
        }

        if command.is_tokens() {
            let count = self.conversation.token_count();
            self.add_notice(&format!(
                "Prompt tokens: {}\nCompletion tokens: {}\nTotal tokens: {}",
                count.prompt,
                count.completion,
                count.total()
            ));
            return Ok((false, true));
        }

        if command.is_help() {
            self.add_notice(&help_text());
            return Ok((false, true));
        }

        return Ok((false, true));
    }

    fn sync_dependants(&mut self) {
        self.bubble_list
            .set_messages(self.conversation.messages(), self.last_known_width as usize);

        let viewport_height = self.last_known_height.saturating_sub(2);
        self.scroll
            .resize(self.bubble_list.len() as u16, viewport_height);
    }
}
