use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Message;

/// One timestamped transcript snapshot. Session files on disk are a JSON
/// array of these, appended to on every save.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    pub timestamp: String,
    pub messages: Vec<Message>,
}
