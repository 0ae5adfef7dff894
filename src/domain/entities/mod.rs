//! Domain entities - Core business objects

pub mod user;
pub mod message;
pub mod command;
pub mod quote;

pub use user::{User, Tier};
pub use message::{Message, Content};
pub use command::{BotCommand, CommandSpec, COMMANDS};
pub use quote::{Code, OutputMapping, Quote};
