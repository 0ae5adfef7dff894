//! Price lookup bot: approved chat users send a 3-digit footwear code and
//! get back a price, with special-tier users seeing selling and cost price.

pub mod domain;
pub mod application;
pub mod infrastructure;

pub use application::errors::{BotError, CommandError, ConfigError, StorageError};
pub use application::messaging::MessageDispatcher;
pub use application::services::{AccessControl, CommandService, LookupService};
pub use domain::entities::{BotCommand, Code, OutputMapping, Quote, Tier, User};
pub use domain::traits::{Bot, Store};
pub use infrastructure::config::Config;
pub use infrastructure::database::SqliteStore;
pub use infrastructure::storage::MemoryStore;
