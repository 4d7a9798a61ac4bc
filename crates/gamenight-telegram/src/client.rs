use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use gamenight_engine::messaging::{Messenger, MessagingError, RenderedView};

use crate::types::{
    AnswerCallbackQueryParams, ApiResponse, EditMessageTextParams, GetUpdatesParams,
    InlineKeyboardMarkup, LinkPreviewOptions, Message, ReplyParameters, SendMessageParams, Update,
};

const API_BASE: &str = "https://api.telegram.org";

/// Seconds a `getUpdates` call may wait for new updates.
pub const LONG_POLL_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram API error: {0}")]
    Api(String),
}

/// Minimal Bot API client over reqwest.
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self, TelegramError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(LONG_POLL_SECS + 30))
            .build()?;
        Ok(Self {
            http,
            base: format!("{}/bot{}", API_BASE, token),
        })
    }

    async fn call<P, T>(&self, method: &str, params: &P) -> Result<T, TelegramError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        // Error responses carry a JSON body too, so the status is not checked first.
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(params)
            .send()
            .await?
            .json()
            .await?;

        match response {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api(
                description.unwrap_or_else(|| format!("{method} failed")),
            )),
        }
    }

    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        self.call(
            "getUpdates",
            &GetUpdatesParams {
                offset,
                timeout: LONG_POLL_SECS,
                allowed_updates: &["message", "callback_query"],
            },
        )
        .await
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<Message, TelegramError> {
        self.call(
            "sendMessage",
            &SendMessageParams {
                chat_id,
                text,
                parse_mode: "HTML",
                link_preview_options: LinkPreviewOptions { is_disabled: true },
                reply_parameters: reply_to.map(|message_id| ReplyParameters {
                    message_id,
                    allow_sending_without_reply: true,
                }),
                reply_markup,
            },
        )
        .await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), TelegramError> {
        // The result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageTextParams {
                    chat_id,
                    message_id,
                    text,
                    parse_mode: "HTML",
                    link_preview_options: LinkPreviewOptions { is_disabled: true },
                    reply_markup,
                },
            )
            .await?;
        Ok(())
    }

    pub async fn answer_callback_query(&self, id: &str, text: Option<&str>) -> Result<(), TelegramError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                &AnswerCallbackQueryParams {
                    callback_query_id: id,
                    text,
                },
            )
            .await?;
        Ok(())
    }
}

impl From<TelegramError> for MessagingError {
    fn from(err: TelegramError) -> Self {
        match err {
            TelegramError::Api(description) => MessagingError::from_description(&description),
            other => MessagingError::Other(other.to_string()),
        }
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send(
        &self,
        chat_id: i64,
        reply_to: Option<i64>,
        view: &RenderedView,
    ) -> Result<i64, MessagingError> {
        let message = self
            .send_message(chat_id, reply_to, &view.text, InlineKeyboardMarkup::from_view(view))
            .await?;
        debug!("Sent message {} to chat {}", message.message_id, chat_id);
        Ok(message.message_id)
    }

    async fn edit(&self, chat_id: i64, message_id: i64, view: &RenderedView) -> Result<(), MessagingError> {
        self.edit_message_text(chat_id, message_id, &view.text, InlineKeyboardMarkup::from_view(view))
            .await?;
        Ok(())
    }
}
