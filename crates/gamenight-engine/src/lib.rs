pub mod catalog;
pub mod coordinator;
pub mod error;
pub mod format;
pub mod locale;
pub mod messaging;

pub use coordinator::{Coordinator, MutationOutcome, PushStatus, Settings};
pub use error::{EngineError, Invalid, Result};
