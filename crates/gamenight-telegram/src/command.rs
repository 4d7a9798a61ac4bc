use gamenight_types::links::looks_like_catalog_url;

/// A bot command parsed from message text. Arguments are whitespace-joined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start(Option<String>),
    Help,
    Create(String),
    AddGame(String),
    Language(String),
    Refresh,
}

impl Command {
    /// Parses `/name[@bot] args`. Commands addressed to another bot, unknown
    /// commands and plain text yield `None`.
    pub fn parse(text: &str, bot_name: &str) -> Option<Self> {
        let mut words = text.split_whitespace();
        let head = words.next()?.strip_prefix('/')?;
        let args = words.collect::<Vec<_>>().join(" ");

        let name = match head.split_once('@') {
            Some((name, target)) if target.eq_ignore_ascii_case(bot_name) => name,
            Some(_) => return None,
            None => head,
        };

        Some(match name {
            "start" => Self::Start(args.split_whitespace().next().map(String::from)),
            "help" => Self::Help,
            "create" => Self::Create(args),
            "add_game" => Self::AddGame(args),
            "language" => Self::Language(args),
            "refresh" => Self::Refresh,
            _ => return None,
        })
    }
}

/// What a reply to a game announcement asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameReply {
    CatalogUrl(String),
    PlayerCount(i64),
}

impl GameReply {
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        if looks_like_catalog_url(text) {
            return Some(Self::CatalogUrl(text.to_string()));
        }
        text.parse().ok().map(Self::PlayerCount)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOT: &str = "game_night_bot";

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            Command::parse("/create   Friday  Night", BOT),
            Some(Command::Create("Friday Night".into()))
        );
        assert_eq!(Command::parse("/add_game@Game_Night_Bot Catan", BOT), Some(Command::AddGame("Catan".into())));
        assert_eq!(Command::parse("/create", BOT), Some(Command::Create(String::new())));
        assert_eq!(Command::parse("/start", BOT), Some(Command::Start(None)));
        assert_eq!(Command::parse("/start abc def", BOT), Some(Command::Start(Some("abc".into()))));
        assert_eq!(Command::parse("/refresh now", BOT), Some(Command::Refresh));
    }

    #[test]
    fn ignores_other_bots_and_text() {
        assert_eq!(Command::parse("/create@other_bot Party", BOT), None);
        assert_eq!(Command::parse("/unknown", BOT), None);
        assert_eq!(Command::parse("hello /create", BOT), None);
        assert_eq!(Command::parse("", BOT), None);
    }

    #[test]
    fn classifies_game_replies() {
        assert_eq!(GameReply::parse(" 6 "), Some(GameReply::PlayerCount(6)));
        assert_eq!(GameReply::parse("-1"), Some(GameReply::PlayerCount(-1)));
        assert_eq!(
            GameReply::parse("https://boardgamegeek.com/boardgame/13/catan"),
            Some(GameReply::CatalogUrl("https://boardgamegeek.com/boardgame/13/catan".into()))
        );
        assert_eq!(GameReply::parse("see you there"), None);
    }
}
