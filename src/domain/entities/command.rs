use super::{Code, Content, OutputMapping};
use crate::application::errors::CommandError;

/// Static description of a chat command
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub usage: &'static str,
    pub description: &'static str,
}

/// Commands understood by the bot, in help order
pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec {
        name: "start",
        usage: "/start",
        description: "Start the bot and get instructions",
    },
    CommandSpec {
        name: "help",
        usage: "/help",
        description: "Show this help message",
    },
    CommandSpec {
        name: "add_output",
        usage: "/add_output <input> <normal_output> <special_output1> <special_output2>",
        description: "Add a new output for a specific input",
    },
    CommandSpec {
        name: "delete_output",
        usage: "/delete_output <input>",
        description: "Delete the output for a specific input",
    },
    CommandSpec {
        name: "update_output",
        usage: "/update_output <input> <normal_output> <special_output1> <special_output2>",
        description: "Update the output for a specific input",
    },
];

/// A parsed, validated request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotCommand {
    Start,
    Help,
    Lookup { code: Code },
    AddOutput(OutputMapping),
    UpdateOutput(OutputMapping),
    DeleteOutput { code: Code },
}

impl BotCommand {
    /// Parse message content into a command. Argument count is checked
    /// before the code format.
    pub fn from_content(content: &Content) -> Result<Self, CommandError> {
        match content {
            Content::Text(text) => Code::parse(text)
                .map(|code| BotCommand::Lookup { code })
                .ok_or_else(CommandError::invalid_lookup_code),
            Content::Command { name, args } => Self::from_command(name, args),
            Content::Empty => Err(CommandError::invalid_lookup_code()),
        }
    }

    fn from_command(name: &str, args: &[String]) -> Result<Self, CommandError> {
        match name.to_lowercase().as_str() {
            "start" => Ok(BotCommand::Start),
            "help" => Ok(BotCommand::Help),
            "add_output" => Self::parse_mapping("add_output", args).map(BotCommand::AddOutput),
            "update_output" => Self::parse_mapping("update_output", args).map(BotCommand::UpdateOutput),
            "delete_output" => {
                let [code] = args else {
                    return Err(CommandError::wrong_arg_count("delete_output"));
                };
                Ok(BotCommand::DeleteOutput { code: Self::parse_admin_code(code)? })
            }
            _ => Err(CommandError::UnknownCommand(name.to_string())),
        }
    }

    fn parse_mapping(command: &str, args: &[String]) -> Result<OutputMapping, CommandError> {
        let [code, normal, special1, special2] = args else {
            return Err(CommandError::wrong_arg_count(command));
        };
        let code = Self::parse_admin_code(code)?;
        Ok(OutputMapping::new(code, normal.as_str(), special1.as_str(), special2.as_str()))
    }

    fn parse_admin_code(raw: &str) -> Result<Code, CommandError> {
        Code::parse(raw).ok_or_else(CommandError::invalid_admin_code)
    }

    /// Whether the command changes stored prices
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            BotCommand::AddOutput(_) | BotCommand::UpdateOutput(_) | BotCommand::DeleteOutput { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            BotCommand::Start => "start",
            BotCommand::Help => "help",
            BotCommand::Lookup { .. } => "lookup",
            BotCommand::AddOutput(_) => "add_output",
            BotCommand::UpdateOutput(_) => "update_output",
            BotCommand::DeleteOutput { .. } => "delete_output",
        }
    }
}
