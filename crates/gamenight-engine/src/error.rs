use std::fmt;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Shared error taxonomy for every surface driving the engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid input: {0}")]
    Validation(Invalid),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("event is locked")]
    Forbidden,
    #[error("storage error: {0}")]
    Storage(String),
    #[error("render push failed: {0}")]
    RenderPush(String),
    #[error("catalog unavailable: {0}")]
    CatalogUnavailable(String),
}

/// What part of a request failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Invalid {
    EventId,
    EventName,
    CatalogUrl,
    PlayerCount,
    GameName,
}

impl fmt::Display for Invalid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::EventId => "event id",
            Self::EventName => "event name",
            Self::CatalogUrl => "catalog url",
            Self::PlayerCount => "number of players",
            Self::GameName => "game name",
        })
    }
}

impl From<anyhow::Error> for EngineError {
    fn from(err: anyhow::Error) -> Self {
        Self::Storage(format!("{err:#}"))
    }
}

impl EngineError {
    /// Locale key of the message shown to users for this error.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::Validation(Invalid::EventId) => "InvalidEventId",
            Self::Validation(Invalid::EventName) => "InvalidEventName",
            Self::Validation(Invalid::CatalogUrl) => "InvalidCatalogUrl",
            Self::Validation(Invalid::PlayerCount) => "InvalidNumberOfPlayers",
            Self::Validation(Invalid::GameName) => "InvalidGameName",
            Self::NotFound("event") => "EventNotFound",
            Self::NotFound("language") => "FailedLanguageNotAvailable",
            Self::NotFound(_) => "GameNotFound",
            Self::Forbidden => "EventLocked",
            Self::Storage(_) | Self::CatalogUnavailable(_) => "InvalidData",
            Self::RenderPush(_) => "FailedToUpdateMessageEvent",
        }
    }
}
