//! Message dispatcher - Routes messages to handlers

use std::sync::Arc;
use crate::domain::entities::{BotCommand, Content, Message, User};
use crate::application::errors::CommandError;
use crate::application::services::CommandService;
use super::parser::MessageParser;
use super::middleware::{AccessMiddleware, Context, LoggingMiddleware, Middleware, MiddlewareChain, MiddlewareError, Next};

/// Message dispatcher - routes messages through middleware to handlers
pub struct MessageDispatcher {
    parser: MessageParser,
    middleware: Vec<Arc<dyn Middleware>>,
    commands: CommandService,
}

impl MessageDispatcher {
    /// Build a dispatcher with the default logging and access middleware
    pub fn new(commands: CommandService) -> Self {
        let middleware = MiddlewareChain::new()
            .add(LoggingMiddleware)
            .add(AccessMiddleware::new(commands.access().clone()))
            .build();

        Self {
            parser: MessageParser::new(commands.prefix()),
            middleware,
            commands,
        }
    }

    /// Process a raw text message
    pub async fn process_text(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Option<String> {
        let message = self.parser.parse(chat_id, text, sender);
        self.process(message).await
    }

    /// Process a message and produce the reply, if any
    pub async fn process(&self, message: Message) -> Option<String> {
        let ctx = match Next::new(self.middleware.clone()).run(Context::new(message)) {
            Ok(ctx) => ctx,
            Err(MiddlewareError::Unauthorized) => return Some(CommandError::Unauthorized.reply_text()),
        };

        // Approved senders get no reply to blank messages
        if ctx.message.content == Content::Empty {
            return None;
        }

        let result = match BotCommand::from_content(&ctx.message.content) {
            Ok(command) => self.commands.execute(command, ctx.username.as_deref()).await,
            Err(e) => Err(e),
        };

        let elapsed = chrono::Utc::now() - ctx.message.timestamp;
        tracing::debug!(chat_id = %ctx.chat_id, elapsed_ms = elapsed.num_milliseconds(), "Handled message");

        match result {
            Ok(reply) => Some(reply),
            Err(CommandError::Storage(e)) => {
                tracing::error!(chat_id = %ctx.chat_id, error = %e, "Store failure while handling message");
                Some(CommandError::Storage(e).reply_text())
            }
            Err(e) => {
                tracing::debug!(chat_id = %ctx.chat_id, error = %e, "Request rejected");
                Some(e.reply_text())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use crate::application::errors::StorageError;
    use crate::application::services::AccessControl;
    use crate::domain::entities::{Code, OutputMapping, Tier};
    use crate::domain::traits::Store;
    use crate::infrastructure::storage::MemoryStore;

    /// Store whose every call fails like a locked or missing database file
    struct BrokenStore;

    fn broken() -> StorageError {
        StorageError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk unavailable"))
    }

    #[async_trait]
    impl Store for BrokenStore {
        async fn add_output_mapping(&self, _mapping: &OutputMapping) -> Result<(), StorageError> {
            Err(broken())
        }
        async fn update_output_mapping(&self, _mapping: &OutputMapping) -> Result<bool, StorageError> {
            Err(broken())
        }
        async fn delete_output_mapping(&self, _code: &Code) -> Result<bool, StorageError> {
            Err(broken())
        }
        async fn get_output_mapping(&self, _code: &Code) -> Result<Option<OutputMapping>, StorageError> {
            Err(broken())
        }
        async fn list_output_mappings(&self) -> Result<Vec<OutputMapping>, StorageError> {
            Err(broken())
        }
        async fn get_user_tier(&self, _username: &str) -> Result<Option<Tier>, StorageError> {
            Err(broken())
        }
        async fn add_user(&self, _username: &str, _tier: Tier) -> Result<(), StorageError> {
            Err(broken())
        }
        async fn update_user(&self, _username: &str, _tier: Tier) -> Result<bool, StorageError> {
            Err(broken())
        }
        async fn delete_user(&self, _username: &str) -> Result<bool, StorageError> {
            Err(broken())
        }
        async fn list_users(&self) -> Result<Vec<(String, Tier)>, StorageError> {
            Err(broken())
        }
    }

    fn dispatcher() -> (MessageDispatcher, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let access = AccessControl::new(["alice", "vip"]);
        let commands = CommandService::new(store.clone(), access, "/");
        (MessageDispatcher::new(commands), store)
    }

    fn user(name: &str) -> Option<User> {
        Some(User::new("1").with_username(name))
    }

    #[tokio::test]
    async fn test_unauthorized_user_cannot_mutate() {
        let (dispatcher, store) = dispatcher();
        for text in ["/start", "/help", "042", "/add_output 042 a b c", "/delete_output 042", "/update_output 042 a b c"] {
            let reply = dispatcher.process_text("1", text, user("eve")).await;
            assert_eq!(reply.as_deref(), Some("Sorry, you're not authorized to use this bot."));
        }
        assert!(store.get_output_mapping(&Code::parse("042").unwrap()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_missing_username_is_unauthorized() {
        let (dispatcher, _) = dispatcher();
        let reply = dispatcher.process_text("1", "/start", Some(User::new("1"))).await;
        assert_eq!(reply.as_deref(), Some("Sorry, you're not authorized to use this bot."));
    }

    #[tokio::test]
    async fn test_lookup_by_tier() {
        let (dispatcher, store) = dispatcher();
        store.add_user("vip", Tier::Special).await.unwrap();

        let added = dispatcher.process_text("1", "/add_output 042 $50 $60 $40", user("alice")).await;
        assert_eq!(added.as_deref(), Some("Output added successfully!"));

        let plain = dispatcher.process_text("1", "042", user("alice")).await;
        assert_eq!(plain.as_deref(), Some("$50"));

        let special = dispatcher.process_text("1", "042", user("vip")).await.unwrap();
        assert!(special.contains("$60"));
        assert!(special.contains("$40"));
    }

    #[tokio::test]
    async fn test_validation_replies() {
        let (dispatcher, _) = dispatcher();
        let reply = dispatcher.process_text("1", "42", user("alice")).await;
        assert_eq!(reply.as_deref(), Some("Please enter a valid 3-digit number."));

        let reply = dispatcher.process_text("1", "777", user("alice")).await;
        assert_eq!(reply.as_deref(), Some("No output defined for this input."));

        let reply = dispatcher.process_text("1", "/add_output 042 $50", user("alice")).await.unwrap();
        assert!(reply.starts_with("Invalid number of arguments."));

        let reply = dispatcher.process_text("1", "/frobnicate", user("alice")).await.unwrap();
        assert!(reply.contains("/help"));
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let (dispatcher, _) = dispatcher();
        assert!(dispatcher.process_text("1", "  ", user("alice")).await.is_none());
    }

    #[tokio::test]
    async fn test_blank_message_from_stranger_is_refused() {
        let (dispatcher, _) = dispatcher();
        let reply = dispatcher.process_text("1", "  ", user("eve")).await;
        assert_eq!(reply.as_deref(), Some("Sorry, you're not authorized to use this bot."));
    }

    #[tokio::test]
    async fn test_padded_code_is_rejected() {
        let (dispatcher, store) = dispatcher();
        store
            .add_output_mapping(&OutputMapping::new(Code::parse("042").unwrap(), "$50", "$60", "$40"))
            .await
            .unwrap();

        for text in [" 042", "042 ", "\t042\n"] {
            let reply = dispatcher.process_text("1", text, user("alice")).await;
            assert_eq!(reply.as_deref(), Some("Please enter a valid 3-digit number."), "{:?}", text);
        }
        assert_eq!(dispatcher.process_text("1", "042", user("alice")).await.as_deref(), Some("$50"));
    }

    #[tokio::test]
    async fn test_store_failure_gets_generic_reply() {
        let commands = CommandService::new(Arc::new(BrokenStore), AccessControl::new(["alice"]), "/");
        let dispatcher = MessageDispatcher::new(commands);
        let generic = "Something went wrong. Please try again later.";

        for text in ["042", "/add_output 042 a b c", "/update_output 042 a b c", "/delete_output 042"] {
            let reply = dispatcher.process_text("1", text, user("alice")).await;
            assert_eq!(reply.as_deref(), Some(generic), "for {:?}", text);
        }

        // validation still answers before the store is reached
        let reply = dispatcher.process_text("1", "42", user("alice")).await;
        assert_eq!(reply.as_deref(), Some("Please enter a valid 3-digit number."));
    }
}
