#[cfg(test)]
#[path = "message_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => return "system",
            Role::User => return "user",
            Role::Assistant => return "assistant",
        }
    }
}

impl ToString for Role {
    fn to_string(&self) -> String {
        match self {
            Role::System => return String::from("Redpen"),
            Role::User => return Config::get(ConfigKey::Username),
            Role::Assistant => return Config::get(ConfigKey::Model),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    #[default]
    Normal,
    Notice,
    Error,
}

/// A single transcript entry. Only `role` and `content` are persisted, so the
/// on-disk shape stays `{"role": ..., "content": ...}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
    #[serde(skip)]
    mtype: MessageType,
}

impl Message {
    pub fn new(role: Role, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string().replace('\t', "  "),
            mtype: MessageType::Normal,
        };
    }

    pub fn new_with_type(role: Role, mtype: MessageType, content: &str) -> Message {
        return Message {
            role,
            content: content.to_string().replace('\t', "  "),
            mtype,
        };
    }

    pub fn message_type(&self) -> MessageType {
        return self.mtype;
    }

    pub fn append(&mut self, content: &str) {
        self.content += &content.replace('\t', "  ");
    }

    /// Word-wraps the content for the bubble renderer. Blank lines survive as
    /// a single space so paragraph breaks keep their height.
    pub fn wrapped_lines(&self, line_max_width: usize) -> Vec<String> {
        let mut lines: Vec<String> = Vec::new();

        for full_line in self.content.split('\n') {
            if full_line.trim().is_empty() {
                lines.push(" ".to_string());
                continue;
            }

            let mut char_count = 0;
            let mut current_line: Vec<&str> = vec![];

            for word in full_line.split(' ') {
                if word.len() + char_count + 1 > line_max_width && !current_line.is_empty() {
                    lines.push(current_line.join(" ").trim_end().to_string());
                    current_line = vec![word];
                    char_count = word.len() + 1;
                } else {
                    current_line.push(word);
                    char_count += word.len() + 1;
                }
            }
            if !current_line.is_empty() {
                lines.push(current_line.join(" ").trim_end().to_string());
            }
        }

        return lines;
    }
}
