use std::sync::Arc;

use crate::application::errors::{CommandError, StorageError};
use crate::domain::entities::{BotCommand, COMMANDS};
use crate::domain::traits::Store;
use super::{AccessControl, LookupService};

const WELCOME: &str = "Hi! I'm a Giriraj Footwear bot that provides prices of different footwear. \
Please enter a 3-digit number to get its corresponding Price. \
Use /help to see available commands.";

/// Service for executing parsed commands against the store
pub struct CommandService {
    store: Arc<dyn Store>,
    lookup: LookupService,
    access: AccessControl,
    prefix: String,
}

impl CommandService {
    pub fn new(store: Arc<dyn Store>, access: AccessControl, prefix: impl Into<String>) -> Self {
        Self {
            lookup: LookupService::new(store.clone()),
            store,
            access,
            prefix: prefix.into(),
        }
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Execute a command for an already approved requester
    pub async fn execute(&self, command: BotCommand, username: Option<&str>) -> Result<String, CommandError> {
        if command.is_mutation() && !self.access.can_administer(username) {
            tracing::warn!(user = ?username, command = command.name(), "Price change refused for non-admin");
            return Err(CommandError::Forbidden);
        }

        match command {
            BotCommand::Start => Ok(WELCOME.to_string()),
            BotCommand::Help => Ok(self.get_help()),
            BotCommand::Lookup { code } => {
                let quote = self.lookup.resolve_code(&code, username).await?;
                Ok(quote.to_string())
            }
            BotCommand::AddOutput(mapping) => {
                match self.store.add_output_mapping(&mapping).await {
                    Ok(()) => {}
                    Err(StorageError::AlreadyExists(_)) => {
                        return Err(CommandError::AlreadyExists(mapping.code.to_string()));
                    }
                    Err(e) => return Err(e.into()),
                }
                tracing::info!(code = %mapping.code, user = ?username, "Output added");
                Ok("Output added successfully!".to_string())
            }
            BotCommand::UpdateOutput(mapping) => {
                if !self.store.update_output_mapping(&mapping).await? {
                    return Err(CommandError::NoMappingFound(mapping.code.to_string()));
                }
                tracing::info!(code = %mapping.code, user = ?username, "Output updated");
                Ok("Output updated successfully!".to_string())
            }
            BotCommand::DeleteOutput { code } => {
                let removed = self.store.delete_output_mapping(&code).await?;
                tracing::info!(code = %code, removed, user = ?username, "Output deleted");
                Ok("Output deleted successfully!".to_string())
            }
        }
    }

    pub fn get_help(&self) -> String {
        let mut help = "Available commands:\n".to_string();
        for cmd in COMMANDS {
            let usage = cmd.usage.replacen('/', &self.prefix, 1);
            help.push_str(&format!("{} - {}\n", usage, cmd.description));
        }
        help
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Code, OutputMapping};
    use crate::infrastructure::storage::MemoryStore;

    fn code(raw: &str) -> Code {
        Code::parse(raw).unwrap()
    }

    fn service(access: AccessControl) -> (CommandService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CommandService::new(store.clone(), access, "/"), store)
    }

    #[tokio::test]
    async fn test_add_then_duplicate_add() {
        let (commands, store) = service(AccessControl::new(["alice"]));
        let mapping = OutputMapping::new(code("042"), "$50", "$60", "$40");

        let reply = commands.execute(BotCommand::AddOutput(mapping), Some("alice")).await.unwrap();
        assert_eq!(reply, "Output added successfully!");

        let again = OutputMapping::new(code("042"), "$1", "$2", "$3");
        let err = commands.execute(BotCommand::AddOutput(again), Some("alice")).await.unwrap_err();
        assert!(matches!(err, CommandError::AlreadyExists(_)));

        let stored = store.get_output_mapping(&code("042")).await.unwrap().unwrap();
        assert_eq!(stored.normal_output, "$50");
    }

    #[tokio::test]
    async fn test_update_missing_code() {
        let (commands, store) = service(AccessControl::new(["alice"]));
        let mapping = OutputMapping::new(code("007"), "a", "b", "c");
        let err = commands.execute(BotCommand::UpdateOutput(mapping), Some("alice")).await.unwrap_err();
        assert_eq!(err.reply_text(), "No output defined for this input.");
        assert!(store.get_output_mapping(&code("007")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let (commands, _) = service(AccessControl::new(["alice"]));
        for _ in 0..2 {
            let reply = commands
                .execute(BotCommand::DeleteOutput { code: code("123") }, Some("alice"))
                .await
                .unwrap();
            assert_eq!(reply, "Output deleted successfully!");
        }
    }

    #[tokio::test]
    async fn test_admin_gate_blocks_mutations_only() {
        let access = AccessControl::new(["alice", "root"]).with_admins(["root"], true);
        let (commands, store) = service(access);
        let mapping = OutputMapping::new(code("042"), "$50", "$60", "$40");

        let err = commands
            .execute(BotCommand::AddOutput(mapping.clone()), Some("alice"))
            .await
            .unwrap_err();
        assert!(matches!(err, CommandError::Forbidden));
        assert!(store.get_output_mapping(&code("042")).await.unwrap().is_none());

        commands.execute(BotCommand::AddOutput(mapping), Some("root")).await.unwrap();
        let reply = commands
            .execute(BotCommand::Lookup { code: code("042") }, Some("alice"))
            .await
            .unwrap();
        assert_eq!(reply, "$50");
    }

    #[test]
    fn test_help_lists_every_command() {
        let (commands, _) = service(AccessControl::default());
        let help = commands.get_help();
        for cmd in COMMANDS {
            assert!(help.contains(cmd.name), "help is missing {}", cmd.name);
        }
    }
}
