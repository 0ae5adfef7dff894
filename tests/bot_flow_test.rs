//! End-to-end message flow tests against a real SQLite file
//! Run with: cargo test --test bot_flow_test

use std::sync::{Arc, Once};

use pricebot::{
    AccessControl, CommandService, Config, MessageDispatcher, SqliteStore, Store, Tier, User,
};
use tempfile::TempDir;

static INIT: Once = Once::new();

fn ensure_init() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

struct Harness {
    _dir: TempDir,
    store: Arc<SqliteStore>,
    dispatcher: MessageDispatcher,
}

impl Harness {
    fn new(config_yaml: &str) -> Self {
        ensure_init();
        let dir = TempDir::new().unwrap();
        let config = Config::from_yaml(config_yaml).unwrap();
        let store = Arc::new(SqliteStore::open(dir.path().join("bot_database.db")).unwrap());
        let commands = CommandService::new(
            store.clone(),
            AccessControl::from_config(&config.access),
            &config.bot.prefix,
        );
        Self {
            _dir: dir,
            store,
            dispatcher: MessageDispatcher::new(commands),
        }
    }

    async fn send(&self, username: &str, text: &str) -> String {
        let sender = User::new("100").with_username(username);
        self.dispatcher
            .process_text("100", text, Some(sender))
            .await
            .expect("message should produce a reply")
    }
}

const CONFIG: &str = "
access:
  approved-users: [shopkeeper, owner]
  special-users: [owner]
";

/// Normal users see the normal output, special users see both prices
#[tokio::test]
async fn test_lookup_reply_depends_on_tier() {
    let h = Harness::new(CONFIG);
    h.store.add_user("owner", Tier::Special).await.unwrap();

    assert_eq!(h.send("shopkeeper", "/add_output 042 $50 $60 $40").await, "Output added successfully!");

    assert_eq!(h.send("shopkeeper", "042").await, "$50");

    let special = h.send("owner", "042").await;
    assert!(special.contains("$60"), "selling price missing: {}", special);
    assert!(special.contains("$40"), "cost price missing: {}", special);
    assert_eq!(special, "Selling Price: $60\nCost Price: $40");
}

/// Add, update, then look up
#[tokio::test]
async fn test_update_changes_lookup() {
    let h = Harness::new(CONFIG);

    assert_eq!(h.send("shopkeeper", "/add_output 042 $50 $60 $40").await, "Output added successfully!");
    assert_eq!(h.send("shopkeeper", "/update_output 042 $55 $65 $45").await, "Output updated successfully!");
    assert_eq!(h.send("shopkeeper", "042").await, "$55");
}

/// Delete twice, then the code is gone
#[tokio::test]
async fn test_delete_flow() {
    let h = Harness::new(CONFIG);

    h.send("shopkeeper", "/add_output 777 a b c").await;
    assert_eq!(h.send("shopkeeper", "/delete_output 777").await, "Output deleted successfully!");
    assert_eq!(h.send("shopkeeper", "/delete_output 777").await, "Output deleted successfully!");
    assert_eq!(h.send("shopkeeper", "777").await, "No output defined for this input.");
}

/// Strangers get the refusal for every command and nothing is written
#[tokio::test]
async fn test_stranger_is_refused_everywhere() {
    let h = Harness::new(CONFIG);
    let refusal = "Sorry, you're not authorized to use this bot.";

    for text in [
        "/start",
        "/help",
        "123",
        "/add_output 123 a b c",
        "/update_output 123 a b c",
        "/delete_output 123",
    ] {
        assert_eq!(h.send("stranger", text).await, refusal, "for {:?}", text);
    }
    assert!(h.store.list_output_mappings().await.unwrap().is_empty());
}

/// Bad input never touches the store
#[tokio::test]
async fn test_validation_prevents_mutation() {
    let h = Harness::new(CONFIG);

    let reply = h.send("shopkeeper", "/add_output 42 a b c").await;
    assert_eq!(reply, "Please enter a valid 3-digit input number.");

    let reply = h.send("shopkeeper", "/add_output 042 a b").await;
    assert!(reply.starts_with("Invalid number of arguments. Usage: /add_output"), "{}", reply);

    let reply = h.send("shopkeeper", "/add_output 042 a b c d").await;
    assert!(reply.starts_with("Invalid number of arguments."), "{}", reply);

    assert_eq!(h.send("shopkeeper", "4x2").await, "Please enter a valid 3-digit number.");
    assert!(h.store.list_output_mappings().await.unwrap().is_empty());
}

/// Duplicate add is refused and keeps the first row
#[tokio::test]
async fn test_duplicate_add_is_refused() {
    let h = Harness::new(CONFIG);

    h.send("shopkeeper", "/add_output 042 $50 $60 $40").await;
    let reply = h.send("shopkeeper", "/add_output 042 $1 $2 $3").await;
    assert!(reply.contains("already exists"), "{}", reply);
    assert_eq!(h.send("shopkeeper", "042").await, "$50");
}

/// With admin-only writes, approved non-admins can only read
#[tokio::test]
async fn test_admin_only_writes() {
    let h = Harness::new(
        "
access:
  approved-users: [shopkeeper, owner]
  admin-users: [owner]
  admin-only-writes: true
",
    );

    let reply = h.send("shopkeeper", "/add_output 042 $50 $60 $40").await;
    assert_eq!(reply, "Sorry, only administrators can change prices.");

    assert_eq!(h.send("owner", "/add_output 042 $50 $60 $40").await, "Output added successfully!");
    assert_eq!(h.send("shopkeeper", "042").await, "$50");
}

/// Greeting and help for approved users
#[tokio::test]
async fn test_start_and_help() {
    let h = Harness::new(CONFIG);

    let welcome = h.send("shopkeeper", "/start").await;
    assert!(welcome.contains("3-digit number"));

    let help = h.send("shopkeeper", "/help").await;
    for command in ["/start", "/help", "/add_output", "/delete_output", "/update_output"] {
        assert!(help.contains(command), "help is missing {}", command);
    }
}
