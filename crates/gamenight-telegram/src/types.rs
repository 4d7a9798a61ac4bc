/// Bot API objects, limited to the fields the bot reads or writes.
use serde::{Deserialize, Serialize};

use gamenight_engine::messaging::{ActionKind, RenderedView};

// -- Incoming --

#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
    pub reply_to_message: Option<Box<Message>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Username, else "first last", else `user_<id>`.
    pub fn display_name(&self) -> String {
        if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
            return username.to_string();
        }

        let full = format!("{} {}", self.first_name, self.last_name.as_deref().unwrap_or(""));
        if full.trim().is_empty() {
            format!("user_{}", self.id)
        } else {
            full.trim().to_string()
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

// -- Outgoing --

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub web_app: Option<WebAppInfo>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WebAppInfo {
    pub url: String,
}

impl InlineKeyboardMarkup {
    /// One button per row, in action order. `None` when the view has no actions.
    pub fn from_view(view: &RenderedView) -> Option<Self> {
        if view.actions.is_empty() {
            return None;
        }

        let inline_keyboard = view
            .actions
            .iter()
            .map(|action| {
                let mut button = InlineKeyboardButton {
                    text: action.label.clone(),
                    callback_data: None,
                    url: None,
                    web_app: None,
                };
                match &action.kind {
                    ActionKind::Callback(data) => button.callback_data = Some(data.clone()),
                    ActionKind::Url(url) => button.url = Some(url.clone()),
                    ActionKind::WebApp(url) => button.web_app = Some(WebAppInfo { url: url.clone() }),
                }
                vec![button]
            })
            .collect();

        Some(Self { inline_keyboard })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LinkPreviewOptions {
    pub is_disabled: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    pub allow_sending_without_reply: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageParams<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub link_preview_options: LinkPreviewOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditMessageTextParams<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
    pub parse_mode: &'static str,
    pub link_preview_options: LinkPreviewOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_markup: Option<InlineKeyboardMarkup>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GetUpdatesParams {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerCallbackQueryParams<'a> {
    pub callback_query_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<&'a str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use gamenight_engine::messaging::Action;

    fn user(username: Option<&str>, first: &str, last: Option<&str>) -> User {
        User {
            id: 42,
            first_name: first.into(),
            last_name: last.map(String::from),
            username: username.map(String::from),
        }
    }

    #[test]
    fn display_name_prefers_username() {
        assert_eq!(user(Some("alice"), "Alice", Some("Liddell")).display_name(), "alice");
        assert_eq!(user(None, "Alice", Some("Liddell")).display_name(), "Alice Liddell");
        assert_eq!(user(None, "Alice", None).display_name(), "Alice");
        assert_eq!(user(Some(""), "", None).display_name(), "user_42");
    }

    #[test]
    fn keyboard_has_one_button_per_row() {
        let view = RenderedView {
            text: "x".into(),
            actions: vec![
                Action { label: "Join Catan".into(), kind: ActionKind::Callback("$add_player|e|1".into()) },
                Action { label: "Open".into(), kind: ActionKind::WebApp("https://night.example/events/e/".into()) },
            ],
        };

        let markup = InlineKeyboardMarkup::from_view(&view).unwrap();
        let json = serde_json::to_value(&markup).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "inline_keyboard": [
                    [{ "text": "Join Catan", "callback_data": "$add_player|e|1" }],
                    [{ "text": "Open", "web_app": { "url": "https://night.example/events/e/" } }]
                ]
            })
        );
        assert!(InlineKeyboardMarkup::from_view(&RenderedView { text: "x".into(), actions: vec![] }).is_none());
    }

    #[test]
    fn parses_reply_update() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "message_id": 5,
                "chat": {"id": -100, "type": "group"},
                "from": {"id": 7, "is_bot": false, "first_name": "Bob"},
                "text": "4",
                "reply_to_message": {"message_id": 3, "chat": {"id": -100}}
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(message.reply_to_message.unwrap().message_id, 3);
        assert_eq!(message.from.unwrap().display_name(), "Bob");
    }
}
