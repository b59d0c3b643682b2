#[cfg(test)]
#[path = "conversation_test.rs"]
mod tests;

use super::Message;
use super::MessageType;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenCount {
    pub prompt: u64,
    pub completion: u64,
}

impl TokenCount {
    pub fn new(prompt: u64, completion: u64) -> TokenCount {
        return TokenCount { prompt, completion };
    }

    pub fn add(&mut self, other: TokenCount) {
        self.prompt += other.prompt;
        self.completion += other.completion;
    }

    pub fn total(&self) -> u64 {
        return self.prompt + self.completion;
    }
}

/// The active session: every rendered message plus the running token
/// counters. Notice and error bubbles live alongside the feedback exchange,
/// but only the Normal-typed transcript is ever sent to a backend or saved.
#[derive(Default)]
pub struct Conversation {
    messages: Vec<Message>,
    token_count: TokenCount,
}

impl Conversation {
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[Message] {
        return &self.messages;
    }

    pub fn last_mut(&mut self) -> Option<&mut Message> {
        return self.messages.last_mut();
    }

    pub fn pop(&mut self) -> Option<Message> {
        return self.messages.pop();
    }

    pub fn transcript(&self) -> Vec<Message> {
        return self
            .messages
            .iter()
            .filter(|message| return message.message_type() == MessageType::Normal)
            .cloned()
            .collect();
    }

    /// Swaps in a transcript loaded from a stored session. Token counters are
    /// left alone: they track backend spend, not the on-screen history.
    pub fn replace_transcript(&mut self, messages: Vec<Message>) {
        self.messages = messages;
    }

    pub fn token_count(&self) -> TokenCount {
        return self.token_count;
    }

    pub fn add_usage(&mut self, usage: TokenCount) {
        self.token_count.add(usage);
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.token_count = TokenCount::default();
    }
}
