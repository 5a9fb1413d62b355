use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who authored a history entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    Error,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Error => "error",
        };
        f.write_str(name)
    }
}

/// One entry in the conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            at: Utc::now(),
        }
    }
}

/// Ordered conversation history.
///
/// Entries are append-only, with one exception: the assistant entry a
/// streaming turn is growing may be revised in place through
/// [`revise_assistant`], and only through it. Nothing else mutates an
/// entry once pushed.
///
/// [`revise_assistant`]: MessageHistory::revise_assistant
#[derive(Debug, Clone, Default)]
pub struct MessageHistory {
    messages: Vec<Message>,
}

impl MessageHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Append a user message, returning its index
    pub fn push_user(&mut self, text: impl Into<String>) -> usize {
        self.push(Message::new(Role::User, text))
    }

    /// Append the empty assistant entry a turn is about to stream into,
    /// returning its index
    pub fn push_assistant_placeholder(&mut self) -> usize {
        self.push(Message::new(Role::Assistant, ""))
    }

    /// Append a standalone error message, returning its index
    pub fn push_error(&mut self, text: impl Into<String>) -> usize {
        self.push(Message::new(Role::Error, text))
    }

    /// Replace the text of the assistant entry at `index` with the full
    /// buffer accumulated so far (never a delta). Returns false when the
    /// index does not name an assistant entry; the history is untouched
    /// in that case.
    pub fn revise_assistant(&mut self, index: usize, full_text: impl Into<String>) -> bool {
        match self.messages.get_mut(index) {
            Some(message) if message.role == Role::Assistant => {
                message.text = full_text.into();
                true
            }
            _ => false,
        }
    }

    /// Render the history as one display line per message. A pure
    /// function of the entries: rendering twice gives identical output.
    pub fn transcript(&self) -> Vec<String> {
        self.messages
            .iter()
            .map(|m| format!("{}: {}", m.role, m.text))
            .collect()
    }

    fn push(&mut self, message: Message) -> usize {
        self.messages.push(message);
        self.messages.len() - 1
    }
}
