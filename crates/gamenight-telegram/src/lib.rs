pub mod client;
pub mod command;
pub mod handlers;
pub mod poller;
pub mod types;

pub use client::TelegramClient;
pub use handlers::ChatHandler;
