use std::sync::Arc;

use tracing::{debug, error, info, warn};

use gamenight_db::EventSelector;
use gamenight_engine::coordinator::{AddedGame, GameTarget, GameUpdate, NewGame};
use gamenight_engine::format::{escape_html, web_url};
use gamenight_engine::locale::FALLBACK_LANGUAGE;
use gamenight_engine::messaging::{Action, ActionKind, Messenger, RenderedView};
use gamenight_engine::{Coordinator, EngineError, MutationOutcome, PushStatus};
use gamenight_types::callback::CallbackData;

use crate::command::{Command, GameReply};
use crate::types::{CallbackQuery, Message, User};

/// Turns chat messages and button presses into coordinator calls and replies.
#[derive(Clone)]
pub struct ChatHandler {
    coordinator: Coordinator,
    messenger: Arc<dyn Messenger>,
}

impl ChatHandler {
    pub fn new(coordinator: Coordinator, messenger: Arc<dyn Messenger>) -> Self {
        Self { coordinator, messenger }
    }

    pub async fn handle_message(&self, message: &Message) {
        let (Some(text), Some(sender)) = (message.text.as_deref(), message.from.as_ref()) else {
            return;
        };

        let bot_name = &self.coordinator.settings().bot_name;
        if let Some(command) = Command::parse(text, bot_name) {
            debug!("Command {:?} in chat {}", command, message.chat.id);
            self.handle_command(message, sender, command).await;
        } else if let Some(replied) = message.reply_to_message.as_deref() {
            if let Some(reply) = GameReply::parse(text) {
                self.handle_game_reply(message, sender, replied.message_id, reply).await;
            }
        }
    }

    /// Handles a button press and returns the notification shown to the presser.
    pub async fn handle_callback(&self, query: &CallbackQuery) -> Option<String> {
        let chat_id = query.message.as_ref().map(|m| m.chat.id);
        let language = match chat_id {
            Some(chat_id) => self.language(chat_id).await,
            None => FALLBACK_LANGUAGE.to_string(),
        };

        let data = query.data.as_deref().unwrap_or_default();
        let callback = match CallbackData::parse(data) {
            Ok(callback) => callback,
            Err(e) => {
                warn!("{}", e);
                return Some(self.t(&language, "InvalidData", &[]));
            }
        };

        let user = &query.from;
        let display_name = user.display_name();
        let (result, fallback) = match &callback {
            CallbackData::Join { event_id, board_game_id } => {
                info!("User {} ({}) joins game {}", display_name, user.id, board_game_id);
                (
                    self.coordinator.join(event_id, *board_game_id, user.id, &display_name).await,
                    "FailedToAddPlayer",
                )
            }
            CallbackData::Leave { event_id } => {
                info!("User {} ({}) leaves event {}", display_name, user.id, event_id);
                (self.coordinator.leave(event_id, user.id).await, "FailedToRemovePlayer")
            }
        };

        match result {
            Ok(outcome) => push_failure_key(&outcome).map(|key| self.t(&language, key, &[])),
            Err(e) => Some(self.t(&language, failure_key(&e, fallback), &[])),
        }
    }

    async fn handle_command(&self, message: &Message, sender: &User, command: Command) {
        let chat_id = message.chat.id;
        let language = self.language(chat_id).await;

        match command {
            Command::Start(None) => self.reply(message, &language, "Welcome", &[]).await,
            Command::Help => self.reply(message, &language, "Help", &[]).await,
            Command::Start(Some(event_id)) => self.open_event(message, &language, &event_id).await,
            Command::Create(name) if name.is_empty() => self.usage(message, &language, "/create", "EventName").await,
            Command::Create(name) => {
                info!("Creating event {} by {} in chat {}", name, sender.id, chat_id);
                let created = self
                    .coordinator
                    .create_event(chat_id, sender.id, &sender.display_name(), &name, Some(message.message_id))
                    .await;
                if let Err(e) = created {
                    error!("Failed to create event: {}", e);
                    self.reply(message, &language, failure_key(&e, "FailedToCreateEvent"), &[]).await;
                }
            }
            Command::AddGame(name) if name.is_empty() => self.usage(message, &language, "/add_game", "GameName").await,
            Command::AddGame(name) => self.add_game(message, sender, &language, name).await,
            Command::Language(code) if code.is_empty() => {
                let usage = self.t(&language, "Usage", &[("Command", "/language"), ("Example", FALLBACK_LANGUAGE)]);
                self.send(chat_id, Some(message.message_id), escape_html(&usage)).await;
            }
            Command::Language(code) => self.set_language(message, &language, &code).await,
            Command::Refresh => match self.coordinator.refresh(&EventSelector::LatestInChat(chat_id)).await {
                Ok(outcome) => {
                    if let Some(key) = push_failure_key(&outcome) {
                        self.reply(message, &language, key, &[]).await;
                    }
                }
                Err(e) => self.reply(message, &language, failure_key(&e, "InvalidData"), &[]).await,
            },
        }
    }

    async fn open_event(&self, message: &Message, language: &str, event_id: &str) {
        let event = match self.coordinator.load(&EventSelector::ById(event_id.to_string())).await {
            Ok(event) if event.message_id.is_some() => event,
            Ok(_) | Err(_) => {
                self.reply(message, language, "EventNotFound", &[]).await;
                return;
            }
        };

        let view = RenderedView {
            text: escape_html(&self.t(language, "Open", &[("Name", &event.name)])),
            actions: vec![Action {
                label: "Web".into(),
                kind: ActionKind::WebApp(web_url(&self.coordinator.settings().base_url, &event.id)),
            }],
        };
        if let Err(e) = self.messenger.send(message.chat.id, None, &view).await {
            warn!("Failed to send web view link: {}", e);
        }
    }

    async fn add_game(&self, message: &Message, sender: &User, language: &str, name: String) {
        let chat_id = message.chat.id;
        info!("Adding game {} in chat {}", name, chat_id);

        let added = self
            .coordinator
            .add_game(
                &EventSelector::LatestInChat(chat_id),
                NewGame {
                    name,
                    max_players: None,
                    catalog_url: None,
                    requester_id: sender.id,
                    join_as: Some(sender.display_name()),
                },
            )
            .await;

        let added = match added {
            Ok(added) => added,
            Err(e) => {
                error!("Failed to add game: {}", e);
                self.reply(message, language, failure_key(&e, "FailedToAddGame"), &[]).await;
                return;
            }
        };
        if let Some(key) = push_failure_key(&added.outcome) {
            self.reply(message, language, key, &[]).await;
            return;
        }

        let text = self.game_added_text(language, &added);
        let Some(announcement) = self.send(chat_id, Some(message.message_id), text).await else {
            return;
        };
        if let Err(e) = self.coordinator.attach_game_message(added.board_game_id, announcement).await {
            error!("Failed to store announcement of game {}: {}", added.board_game_id, e);
            self.reply(message, language, "FailedToAddGame", &[]).await;
        }
    }

    fn game_added_text(&self, language: &str, added: &AddedGame) -> String {
        let Some(game) = added.outcome.event.board_game(added.board_game_id) else {
            return String::new();
        };
        let link = game
            .catalog
            .as_ref()
            .map(|c| format!(", <a href='{}'>{}</a>", c.url, escape_html(&c.name)))
            .unwrap_or_default();

        self.t(
            language,
            "GameAdded",
            &[
                ("Name", &escape_html(&game.name)),
                ("Link", &link),
                ("MaxPlayers", &game.max_players.to_string()),
            ],
        )
    }

    async fn handle_game_reply(&self, message: &Message, sender: &User, announcement: i64, reply: GameReply) {
        let chat_id = message.chat.id;
        let language = self.language(chat_id).await;
        let numeric = matches!(reply, GameReply::PlayerCount(_));

        let update = match reply {
            GameReply::CatalogUrl(url) => GameUpdate {
                catalog_url: Some(url),
                ..Default::default()
            },
            GameReply::PlayerCount(n) => GameUpdate {
                max_players: Some(n),
                ..Default::default()
            },
        };
        debug!("Updating game announced by {} in chat {}", announcement, chat_id);

        let target = GameTarget::ByMessage {
            chat_id,
            message_id: announcement,
        };
        match self.coordinator.update_game(target, sender.id, update).await {
            Ok(outcome) => {
                let key = push_failure_key(&outcome).unwrap_or("GameUpdated");
                self.reply(message, &language, key, &[]).await;
            }
            // A number sent to any other message is taken as a missed seat change.
            Err(EngineError::NotFound("game")) if numeric => {
                self.reply(message, &language, "GameNotFound", &[]).await;
            }
            // Other replies to messages that are not game announcements are ordinary chat.
            Err(EngineError::NotFound("game")) => {}
            Err(e) => {
                warn!("Failed to update game: {}", e);
                self.reply(message, &language, failure_key(&e, "FailedToUpdateGame"), &[]).await;
            }
        }
    }

    async fn set_language(&self, message: &Message, current: &str, code: &str) {
        match self.coordinator.set_language(message.chat.id, code).await {
            Ok(()) => {
                let language = self.language(message.chat.id).await;
                self.reply(message, &language, "LanguageSet", &[("Language", &language)]).await;
            }
            Err(EngineError::NotFound(_)) => {
                let available = self.coordinator.localizer().languages().join(", ");
                self.reply(message, current, "FailedLanguageNotAvailable", &[("AvailableLanguages", &available)])
                    .await;
            }
            Err(e) => {
                error!("Failed to set language: {}", e);
                self.reply(message, current, "FailedToSetLanguage", &[]).await;
            }
        }
    }

    async fn usage(&self, message: &Message, language: &str, command: &str, example_key: &str) {
        let example = self.t(language, example_key, &[]);
        self.reply(message, language, "Usage", &[("Command", command), ("Example", &example)])
            .await;
    }

    async fn language(&self, chat_id: i64) -> String {
        self.coordinator
            .language_for(chat_id)
            .await
            .unwrap_or_else(|_| FALLBACK_LANGUAGE.to_string())
    }

    fn t(&self, language: &str, key: &str, params: &[(&str, &str)]) -> String {
        self.coordinator.localizer().localize(language, key, params)
    }

    /// Replies with a localized plain-text message.
    async fn reply(&self, message: &Message, language: &str, key: &str, params: &[(&str, &str)]) {
        let text = escape_html(&self.t(language, key, params));
        self.send(message.chat.id, Some(message.message_id), text).await;
    }

    async fn send(&self, chat_id: i64, reply_to: Option<i64>, text: String) -> Option<i64> {
        let view = RenderedView { text, actions: vec![] };
        match self.messenger.send(chat_id, reply_to, &view).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Failed to reply in chat {}: {}", chat_id, e);
                None
            }
        }
    }
}

/// User-facing key for a failed mutation. Input and lookup errors explain
/// themselves; infrastructure errors get the operation's generic failure.
fn failure_key(err: &EngineError, fallback: &'static str) -> &'static str {
    match err {
        EngineError::Validation(_) | EngineError::NotFound(_) | EngineError::Forbidden => err.message_key(),
        EngineError::Storage(_) | EngineError::RenderPush(_) | EngineError::CatalogUnavailable(_) => fallback,
    }
}

fn push_failure_key(outcome: &MutationOutcome) -> Option<&'static str> {
    match outcome.push {
        PushStatus::Failed(_) => Some("FailedToUpdateMessageEvent"),
        _ => None,
    }
}
