use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Text the chat API returns when an edit would not change the message.
pub const MESSAGE_UNCHANGED: &str = "specified new message content and reply markup are exactly the same as a current content and reply markup of the message";

/// A rendered event: message body plus one button per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedView {
    pub text: String,
    pub actions: Vec<Action>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub label: String,
    pub kind: ActionKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ActionKind {
    /// Button press answered by the bot with this payload.
    Callback(String),
    /// Opens the web view inside the chat client.
    WebApp(String),
    /// Plain link.
    Url(String),
}

#[derive(Debug, Error)]
pub enum MessagingError {
    #[error("message content unchanged")]
    Unchanged,
    #[error("{0}")]
    Other(String),
}

impl MessagingError {
    /// Classifies an error description returned by the chat API.
    pub fn from_description(description: &str) -> Self {
        if description.contains(MESSAGE_UNCHANGED) {
            Self::Unchanged
        } else {
            Self::Other(description.to_string())
        }
    }
}

/// The chat target the event view is pushed to.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Sends a new message and returns its id.
    async fn send(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        view: &RenderedView,
    ) -> Result<i64, MessagingError>;

    /// Replaces the content of an existing message.
    async fn edit(&self, chat_id: i64, message_id: i64, view: &RenderedView) -> Result<(), MessagingError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_unchanged_edit() {
        let description = format!("Bad Request: message is not modified: {MESSAGE_UNCHANGED}");
        assert!(matches!(MessagingError::from_description(&description), MessagingError::Unchanged));
        assert!(matches!(
            MessagingError::from_description("Bad Request: message to edit not found"),
            MessagingError::Other(_)
        ));
    }
}
