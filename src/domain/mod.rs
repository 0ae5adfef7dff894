//! Domain layer - Core business types
//! 
//! This layer contains:
//! - Entities: Core business objects (User, Message, Code, OutputMapping, BotCommand)
//! - Traits: Abstractions for infrastructure (Bot, Store)

pub mod entities;
pub mod traits;
