use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use gamenight_db::models::NewBoardGame;
use gamenight_db::{Database, EventSelector};
use gamenight_types::links::{extract_catalog_id, validate_event_id};
use gamenight_types::models::Event;

use crate::catalog::{CatalogClient, CatalogMatch, best_effort, lookup_by_id, lookup_by_name};
use crate::error::{EngineError, Invalid, Result};
use crate::format::{FormatContext, format_event};
use crate::locale::Localizer;
use crate::messaging::{Messenger, MessagingError, RenderedView};

/// Seats given to a game when neither the caller nor the catalog says otherwise.
pub const DEFAULT_MAX_PLAYERS: i64 = 5;

#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub bot_name: String,
    pub catalog_timeout: Duration,
}

/// What happened to the rendered chat message after a mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushStatus {
    /// First message of a new event was sent.
    Sent,
    Updated,
    /// The message already showed this content.
    Unchanged,
    /// The event has no chat message yet.
    NotRendered,
    /// The write stands but the message could not be edited.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct MutationOutcome {
    pub event: Event,
    pub view: RenderedView,
    pub push: PushStatus,
}

#[derive(Debug, Clone)]
pub struct NewGame {
    pub name: String,
    pub max_players: Option<i64>,
    pub catalog_url: Option<String>,
    pub requester_id: i64,
    /// When set, the requester is signed up for the new game under this name.
    pub join_as: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AddedGame {
    pub board_game_id: i64,
    pub catalog: Option<CatalogMatch>,
    pub outcome: MutationOutcome,
}

/// How an update names the game it changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameTarget {
    InEvent { event_id: String, board_game_id: i64 },
    /// Reply to the chat message that announced the game.
    ByMessage { chat_id: i64, message_id: i64 },
}

#[derive(Debug, Clone, Default)]
pub struct GameUpdate {
    pub max_players: Option<i64>,
    pub catalog_url: Option<String>,
    /// Clears the catalog link; wins over `catalog_url`.
    pub unlink: bool,
}

/// Runs every event mutation: check, write, reload, render, push.
#[derive(Clone)]
pub struct Coordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    db: Arc<Database>,
    catalog: Arc<dyn CatalogClient>,
    messenger: Arc<dyn Messenger>,
    localizer: Arc<dyn Localizer>,
    settings: Settings,
}

impl Coordinator {
    pub fn new(
        db: Arc<Database>,
        catalog: Arc<dyn CatalogClient>,
        messenger: Arc<dyn Messenger>,
        localizer: Arc<dyn Localizer>,
        settings: Settings,
    ) -> Self {
        Self {
            inner: Arc::new(CoordinatorInner {
                db,
                catalog,
                messenger,
                localizer,
                settings,
            }),
        }
    }

    pub fn localizer(&self) -> &dyn Localizer {
        self.inner.localizer.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    // -- Reads --

    /// Loads an event; a missing event is `NotFound`.
    pub async fn load(&self, selector: &EventSelector) -> Result<Event> {
        if let EventSelector::ById(id) = selector {
            if !validate_event_id(id) {
                return Err(EngineError::Validation(Invalid::EventId));
            }
        }

        let selector = selector.clone();
        self.db(move |db| db.load_event(&selector))
            .await?
            .ok_or(EngineError::NotFound("event"))
    }

    pub async fn language_for(&self, chat_id: i64) -> Result<String> {
        self.db(move |db| db.chat_language(chat_id)).await
    }

    /// Renders `event` in its chat's language.
    pub async fn render(&self, event: &Event) -> Result<RenderedView> {
        let language = self.language_for(event.chat_id).await?;
        Ok(format_event(event, &self.format_context(&language)))
    }

    pub fn format_context<'a>(&'a self, language: &'a str) -> FormatContext<'a> {
        FormatContext {
            localizer: self.inner.localizer.as_ref(),
            language,
            base_url: &self.inner.settings.base_url,
            bot_name: &self.inner.settings.bot_name,
            now: Utc::now(),
        }
    }

    // -- Mutations --

    /// Creates an event and sends its first message, replying to `reply_to` when given.
    pub async fn create_event(
        &self,
        chat_id: i64,
        user_id: i64,
        user_name: &str,
        name: &str,
        reply_to: Option<i64>,
    ) -> Result<MutationOutcome> {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation(Invalid::EventName));
        }

        let user_name = user_name.to_string();
        let event_id = self
            .db(move |db| db.insert_event(chat_id, user_id, &user_name, &name))
            .await?;
        info!("Event {} created in chat {} by {}", event_id, chat_id, user_id);

        let mut event = self.load(&EventSelector::ById(event_id.clone())).await?;
        let view = self.render(&event).await?;

        let message_id = self
            .inner
            .messenger
            .send(chat_id, reply_to, &view)
            .await
            .map_err(|e| EngineError::RenderPush(e.to_string()))?;

        self.db(move |db| db.set_event_message_id(&event_id, message_id))
            .await?;
        event.message_id = Some(message_id);

        Ok(MutationOutcome {
            event,
            view,
            push: PushStatus::Sent,
        })
    }

    pub async fn add_game(&self, selector: &EventSelector, game: NewGame) -> Result<AddedGame> {
        let event = self.load(selector).await?;
        if !event.may_edit(game.requester_id) {
            return Err(EngineError::Forbidden);
        }

        let name = game.name.trim().to_string();
        if name.is_empty() {
            return Err(EngineError::Validation(Invalid::GameName));
        }
        validate_player_count(game.max_players)?;
        let catalog_id = parse_catalog_url(game.catalog_url.as_deref())?;

        let found = match catalog_id {
            Some(id) => self.lookup_id(id, &name).await,
            None => self.lookup_name(&name).await,
        };

        let max_players = game
            .max_players
            .or_else(|| found.as_ref().and_then(|m| m.max_players))
            .unwrap_or(DEFAULT_MAX_PLAYERS);
        let new_game = NewBoardGame {
            name: name.clone(),
            max_players,
            catalog: found.as_ref().map(|m| m.link.clone()),
        };

        let event_id = event.id.clone();
        let requester_id = game.requester_id;
        let join_as = game.join_as.clone();
        let board_game_id = self
            .db(move |db| {
                let id = db.insert_board_game(&event_id, &new_game)?;
                if let Some(display_name) = join_as {
                    db.insert_participant(&event_id, id, requester_id, &display_name)?;
                }
                Ok(id)
            })
            .await?;
        info!("Game {} ({}) added to event {}", name, board_game_id, event.id);

        let outcome = self.finish(&event.id).await?;
        Ok(AddedGame {
            board_game_id,
            catalog: found,
            outcome,
        })
    }

    pub async fn update_game(
        &self,
        target: GameTarget,
        requester_id: i64,
        update: GameUpdate,
    ) -> Result<MutationOutcome> {
        let (event_id, board_game_id) = self.resolve_target(target).await?;
        let event = self.load(&EventSelector::ById(event_id)).await?;
        if !event.may_edit(requester_id) {
            return Err(EngineError::Forbidden);
        }
        let game = event
            .board_game(board_game_id)
            .ok_or(EngineError::NotFound("game"))?;

        validate_player_count(update.max_players)?;

        let mut suggested = None;
        let catalog = if update.unlink {
            None
        } else {
            match parse_catalog_url(update.catalog_url.as_deref())? {
                Some(id) => match self.lookup_id(id, &game.name).await {
                    Some(found) => {
                        suggested = found.max_players;
                        Some(found.link)
                    }
                    None => game.catalog.clone(),
                },
                None => game.catalog.clone(),
            }
        };
        let max_players = update
            .max_players
            .or(suggested)
            .unwrap_or(game.max_players);

        let updated = self
            .db(move |db| db.update_board_game(board_game_id, max_players, catalog.as_ref()))
            .await?;
        if !updated {
            return Err(EngineError::NotFound("game"));
        }
        info!("Game {} of event {} updated", board_game_id, event.id);

        self.finish(&event.id).await
    }

    pub async fn delete_game(
        &self,
        event_id: &str,
        board_game_id: i64,
        requester_id: i64,
    ) -> Result<MutationOutcome> {
        let event = self.load(&EventSelector::ById(event_id.to_string())).await?;
        if !event.may_edit(requester_id) {
            return Err(EngineError::Forbidden);
        }
        if event.board_game(board_game_id).is_none() {
            return Err(EngineError::NotFound("game"));
        }

        self.db(move |db| db.delete_board_game(board_game_id)).await?;
        info!("Game {} removed from event {}", board_game_id, event.id);

        self.finish(&event.id).await
    }

    /// Signs a user up for a game. A seat the user holds elsewhere in the event moves here.
    pub async fn join(
        &self,
        event_id: &str,
        board_game_id: i64,
        user_id: i64,
        display_name: &str,
    ) -> Result<MutationOutcome> {
        let event = self.load(&EventSelector::ById(event_id.to_string())).await?;
        if event.board_game(board_game_id).is_none() {
            return Err(EngineError::NotFound("game"));
        }

        let id = event.id.clone();
        let display_name = display_name.to_string();
        self.db(move |db| db.insert_participant(&id, board_game_id, user_id, &display_name))
            .await
            .inspect_err(|e| error!("Failed to add player {} to game {}: {}", user_id, board_game_id, e))?;
        debug!("User {} joined game {} of event {}", user_id, board_game_id, event.id);

        self.finish(&event.id).await
    }

    /// Removes the user's seat, if any. Leaving without a seat is not an error.
    pub async fn leave(&self, event_id: &str, user_id: i64) -> Result<MutationOutcome> {
        let event = self.load(&EventSelector::ById(event_id.to_string())).await?;

        let id = event.id.clone();
        let removed = self.db(move |db| db.remove_participant(&id, user_id)).await?;
        debug!("User {} left event {} (had seat: {})", user_id, event.id, removed);

        self.finish(&event.id).await
    }

    /// Re-renders and pushes an event without writing anything.
    pub async fn refresh(&self, selector: &EventSelector) -> Result<MutationOutcome> {
        let event = self.load(selector).await?;
        self.finish(&event.id).await
    }

    pub async fn set_language(&self, chat_id: i64, language: &str) -> Result<()> {
        let language = language.trim().to_lowercase();
        if !self.inner.localizer.has_language(&language) {
            return Err(EngineError::NotFound("language"));
        }

        self.db(move |db| db.set_chat_language(chat_id, &language)).await?;
        info!("Chat {} language updated", chat_id);
        Ok(())
    }

    /// Remembers the chat message that announced a game so replies can target it.
    pub async fn attach_game_message(&self, board_game_id: i64, message_id: i64) -> Result<()> {
        self.db(move |db| db.set_board_game_message_id(board_game_id, message_id))
            .await?;
        Ok(())
    }

    // -- Helpers --

    async fn resolve_target(&self, target: GameTarget) -> Result<(String, i64)> {
        match target {
            GameTarget::InEvent { event_id, board_game_id } => Ok((event_id, board_game_id)),
            GameTarget::ByMessage { chat_id, message_id } => {
                let found = self
                    .db(move |db| db.find_game_by_message(chat_id, message_id))
                    .await?
                    .ok_or(EngineError::NotFound("game"))?;
                Ok((found.event_id, found.board_game_id))
            }
        }
    }

    async fn lookup_id(&self, id: i64, fallback_name: &str) -> Option<CatalogMatch> {
        let catalog = self.inner.catalog.as_ref();
        best_effort(
            "details",
            self.inner.settings.catalog_timeout,
            lookup_by_id(catalog, id, fallback_name),
        )
        .await
    }

    async fn lookup_name(&self, name: &str) -> Option<CatalogMatch> {
        let catalog = self.inner.catalog.as_ref();
        best_effort(
            "search",
            self.inner.settings.catalog_timeout,
            lookup_by_name(catalog, name),
        )
        .await
        .flatten()
    }

    /// Reload, render and push after a write.
    async fn finish(&self, event_id: &str) -> Result<MutationOutcome> {
        let event = self.load(&EventSelector::ById(event_id.to_string())).await?;
        let view = self.render(&event).await?;
        let push = self.push(&event, &view).await;
        Ok(MutationOutcome { event, view, push })
    }

    async fn push(&self, event: &Event, view: &RenderedView) -> PushStatus {
        let Some(message_id) = event.message_id else {
            return PushStatus::NotRendered;
        };

        match self.inner.messenger.edit(event.chat_id, message_id, view).await {
            Ok(()) => PushStatus::Updated,
            Err(MessagingError::Unchanged) => {
                debug!("Message {} of event {} already up to date", message_id, event.id);
                PushStatus::Unchanged
            }
            Err(MessagingError::Other(reason)) => {
                let err = EngineError::RenderPush(reason);
                warn!("Event {}: {}", event.id, err);
                PushStatus::Failed(err.to_string())
            }
        }
    }

    async fn db<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.inner.db.clone();
        tokio::task::spawn_blocking(move || f(&db))
            .await
            .map_err(|e| EngineError::Storage(e.to_string()))?
            .map_err(EngineError::from)
    }
}

fn validate_player_count(max_players: Option<i64>) -> Result<()> {
    match max_players {
        Some(n) if n <= 0 => Err(EngineError::Validation(Invalid::PlayerCount)),
        _ => Ok(()),
    }
}

/// Blank input means "no link"; anything else must be a valid catalog game URL.
fn parse_catalog_url(url: Option<&str>) -> Result<Option<i64>> {
    match url.map(str::trim).filter(|u| !u.is_empty()) {
        None => Ok(None),
        Some(url) => extract_catalog_id(url)
            .map(Some)
            .ok_or(EngineError::Validation(Invalid::CatalogUrl)),
    }
}
