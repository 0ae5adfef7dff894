//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Message, Content, User};

/// Parses incoming messages into structured Message objects
pub struct MessageParser {
    command_prefix: String,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
        }
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();
        // Trimming only decides blank vs command; lookup text is kept as sent
        let trimmed = text.trim();

        if trimmed.is_empty() {
            return Message::new(chat_id, Content::Empty).with_sender_opt(sender);
        }

        // Check if it's a command
        if trimmed.starts_with('/') || (!self.command_prefix.is_empty() && trimmed.starts_with(&self.command_prefix)) {
            return self.parse_command(chat_id, trimmed, sender);
        }

        // Regular text message
        Message::new(chat_id, Content::Text(text))
            .with_sender_opt(sender)
    }

    /// Parse a command message
    fn parse_command(&self, chat_id: String, text: &str, sender: Option<User>) -> Message {
        // Remove the command prefix (either / or custom prefix)
        let cmd_text = if let Some(rest) = text.strip_prefix('/') {
            rest
        } else {
            text.strip_prefix(self.command_prefix.as_str()).unwrap_or(text)
        };

        // Split command and arguments
        let mut parts = cmd_text.split_whitespace();
        let name = parts.next().unwrap_or("");
        // Group chats address commands as /name@botname
        let name = name.split('@').next().unwrap_or(name).to_string();
        let args = parts.map(|s| s.to_string()).collect();

        Message::new(chat_id, Content::Command { name, args })
            .with_sender_opt(sender)
    }
}
