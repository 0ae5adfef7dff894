//! Application layer errors

use thiserror::Error;
use crate::domain::entities::COMMANDS;

/// Messaging transport errors
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Command execution errors
#[derive(Error, Debug)]
pub enum CommandError {
    #[error("Requester is not on the allow-list")]
    Unauthorized,

    #[error("Requester is not an administrator")]
    Forbidden,

    #[error("Invalid input format: {0}")]
    InvalidInputFormat(String),

    #[error("No mapping found for code {0}")]
    NoMappingFound(String),

    #[error("Mapping for code {0} already exists")]
    AlreadyExists(String),

    #[error("Command not found: {0}")]
    UnknownCommand(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl CommandError {
    pub fn invalid_lookup_code() -> Self {
        CommandError::InvalidInputFormat("Please enter a valid 3-digit number.".to_string())
    }

    pub fn invalid_admin_code() -> Self {
        CommandError::InvalidInputFormat("Please enter a valid 3-digit input number.".to_string())
    }

    pub fn wrong_arg_count(command: &str) -> Self {
        let usage = COMMANDS
            .iter()
            .find(|c| c.name == command)
            .map(|c| c.usage.to_string())
            .unwrap_or_else(|| format!("/{}", command));
        CommandError::InvalidInputFormat(format!("Invalid number of arguments. Usage: {}", usage))
    }

    /// Text sent back to the requester
    pub fn reply_text(&self) -> String {
        match self {
            CommandError::Unauthorized => "Sorry, you're not authorized to use this bot.".to_string(),
            CommandError::Forbidden => "Sorry, only administrators can change prices.".to_string(),
            CommandError::InvalidInputFormat(msg) => msg.clone(),
            CommandError::NoMappingFound(_) => "No output defined for this input.".to_string(),
            CommandError::AlreadyExists(code) => {
                format!("An output for {} already exists. Use /update_output to change it.", code)
            }
            CommandError::UnknownCommand(name) => {
                format!("Unknown command: /{}. Use /help to see available commands.", name)
            }
            CommandError::Storage(_) => "Something went wrong. Please try again later.".to_string(),
        }
    }
}

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Already exists: {0}")]
    AlreadyExists(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Parse error: {0}")]
    Parse(String),
}
