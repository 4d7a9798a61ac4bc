use std::fmt::Write;

use chrono::{DateTime, Utc};

use gamenight_types::callback::CallbackData;
use gamenight_types::models::{BoardGame, Event};

use crate::locale::Localizer;
use crate::messaging::{Action, ActionKind, RenderedView};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Everything besides the event that shapes its rendering.
pub struct FormatContext<'a> {
    pub localizer: &'a dyn Localizer,
    pub language: &'a str,
    pub base_url: &'a str,
    pub bot_name: &'a str,
    pub now: DateTime<Utc>,
}

impl FormatContext<'_> {
    fn t(&self, key: &str, params: &[(&str, &str)]) -> String {
        self.localizer.localize(self.language, key, params)
    }
}

/// Renders the event as chat HTML plus its buttons.
pub fn format_event(event: &Event, ctx: &FormatContext<'_>) -> RenderedView {
    let mut text = format!("📆 <b>{}</b>\n\n", escape_html(&event.name));

    for game in &event.board_games {
        write_game(&mut text, game);
        text.push('\n');
    }

    text.push_str(&updated_at_line(ctx));

    let mut actions: Vec<Action> = event
        .board_games
        .iter()
        .map(|game| Action {
            label: ctx.t("Join", &[("Name", &game.name)]),
            kind: ActionKind::Callback(
                CallbackData::Join {
                    event_id: event.id.clone(),
                    board_game_id: game.id,
                }
                .encode(),
            ),
        })
        .collect();

    actions.push(Action {
        label: ctx.t("NotComing", &[]),
        kind: ActionKind::Callback(CallbackData::Leave { event_id: event.id.clone() }.encode()),
    });
    actions.push(Action {
        label: ctx.t("AddGame", &[]),
        kind: open_view(event, ctx),
    });

    RenderedView { text, actions }
}

/// Localized "last updated" line for `ctx.now`.
pub fn updated_at_line(ctx: &FormatContext<'_>) -> String {
    let time = ctx.now.format(TIMESTAMP_FORMAT).to_string();
    ctx.t("UpdatedAt", &[("Time", &time)])
}

/// Web view of the event: a mini-app inside direct chats, a deep link elsewhere.
pub fn open_view(event: &Event, ctx: &FormatContext<'_>) -> ActionKind {
    if event.is_direct_chat() {
        ActionKind::WebApp(web_url(ctx.base_url, &event.id))
    } else {
        ActionKind::Url(deep_link(ctx.bot_name, &event.id))
    }
}

/// Path of the event view on the web surface.
pub fn event_path(event_id: &str) -> String {
    format!("/events/{}", event_id)
}

pub fn web_url(base_url: &str, event_id: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), event_path(event_id))
}

pub fn deep_link(bot_name: &str, event_id: &str) -> String {
    format!("https://t.me/{}/home?startapp={}", bot_name, event_id)
}

fn write_game(text: &mut String, game: &BoardGame) {
    let _ = write!(
        text,
        "🎲 <b>{}</b> ({}/{})",
        escape_html(&game.name),
        game.participants.len(),
        game.max_players
    );
    if let Some(link) = &game.catalog {
        let _ = write!(text, " - <a href='{}'>{}</a>", link.url, escape_html(&link.name));
    }
    if game.is_full() {
        text.push_str(" 🚫");
    }
    text.push('\n');

    for participant in &game.participants {
        let _ = writeln!(text, " - {}", escape_html(&participant.display_name));
    }
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locale::Locales;
    use chrono::TimeZone;
    use gamenight_types::models::{CatalogLink, Participant};

    const EVENT_ID: &str = "0b7e1a3c-5d2f-4e8a-9c61-2f3b4a5d6e7f";

    fn ctx(locales: &Locales) -> FormatContext<'_> {
        FormatContext {
            localizer: locales,
            language: "en",
            base_url: "https://night.example/",
            bot_name: "game_night_bot",
            now: Utc.with_ymd_and_hms(2024, 3, 1, 20, 30, 0).unwrap(),
        }
    }

    fn participant(id: i64, name: &str) -> Participant {
        Participant { id, user_id: id, display_name: name.into() }
    }

    fn event(chat_id: i64) -> Event {
        let mut event = Event::new(
            EVENT_ID.into(),
            chat_id,
            42,
            "alice".into(),
            "Friday <Night>".into(),
            Some(10),
            Utc::now(),
        );
        event.board_games = vec![
            BoardGame {
                id: 1,
                name: "Catan".into(),
                max_players: 2,
                message_id: None,
                catalog: Some(CatalogLink {
                    id: 13,
                    name: "CATAN".into(),
                    url: "https://boardgamegeek.com/boardgame/13".into(),
                    image_url: String::new(),
                }),
                participants: vec![participant(7, "bob"), participant(8, "carol")],
            },
            BoardGame {
                id: 2,
                name: "Azul & friends".into(),
                max_players: 4,
                message_id: None,
                catalog: None,
                participants: vec![],
            },
        ];
        event
    }

    #[test]
    fn renders_games_and_participants() {
        let locales = Locales::builtin().unwrap();
        let view = format_event(&event(-100), &ctx(&locales));

        assert_eq!(
            view.text,
            "📆 <b>Friday &lt;Night&gt;</b>\n\n\
             🎲 <b>Catan</b> (2/2) - <a href='https://boardgamegeek.com/boardgame/13'>CATAN</a> 🚫\n\
             \x20- bob\n\
             \x20- carol\n\
             \n\
             🎲 <b>Azul &amp; friends</b> (0/4)\n\
             \n\
             Last updated: 2024-03-01 20:30:00"
        );
    }

    #[test]
    fn actions_follow_game_order() {
        let locales = Locales::builtin().unwrap();
        let view = format_event(&event(-100), &ctx(&locales));

        let labels: Vec<&str> = view.actions.iter().map(|a| a.label.as_str()).collect();
        assert_eq!(labels, vec!["Join Catan", "Join Azul & friends", "I'm not coming", "Add a game"]);
        assert_eq!(view.actions[0].kind, ActionKind::Callback(format!("$add_player|{EVENT_ID}|1")));
        assert_eq!(view.actions[2].kind, ActionKind::Callback(format!("$cancel|{EVENT_ID}")));
        assert_eq!(
            view.actions[3].kind,
            ActionKind::Url(format!("https://t.me/game_night_bot/home?startapp={EVENT_ID}"))
        );
    }

    #[test]
    fn direct_chat_opens_web_app() {
        let locales = Locales::builtin().unwrap();
        let view = format_event(&event(5), &ctx(&locales));
        assert_eq!(
            view.actions.last().unwrap().kind,
            ActionKind::WebApp(format!("https://night.example/events/{EVENT_ID}"))
        );
    }

    #[test]
    fn web_url_matches_event_route() {
        assert_eq!(web_url("https://night.example/", "abc"), "https://night.example/events/abc");
        assert_eq!(web_url("https://night.example", "abc"), format!("https://night.example{}", event_path("abc")));
    }

    #[test]
    fn rendering_is_deterministic() {
        let locales = Locales::builtin().unwrap();
        let e = event(-100);
        assert_eq!(format_event(&e, &ctx(&locales)), format_event(&e, &ctx(&locales)));
    }

    #[test]
    fn empty_event_has_leave_and_open_only() {
        let locales = Locales::builtin().unwrap();
        let mut e = event(-100);
        e.board_games.clear();
        let view = format_event(&e, &ctx(&locales));
        assert_eq!(view.actions.len(), 2);
        assert!(view.text.starts_with("📆 <b>Friday &lt;Night&gt;</b>\n\nLast updated"));
    }
}
