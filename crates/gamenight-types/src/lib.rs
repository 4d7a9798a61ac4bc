pub mod api;
pub mod callback;
pub mod links;
pub mod lock;
pub mod models;
