use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use pricebot::infrastructure::adapters::{ConsoleAdapter, TelegramAdapter};
use pricebot::infrastructure::config::TOKEN_ENV;
use pricebot::{
    AccessControl, Bot, CommandService, Config, MemoryStore, MessageDispatcher, SqliteStore,
    StorageError, Store, Tier, User,
};

#[derive(Parser)]
#[command(name = "pricebot")]
#[command(about = "Footwear price lookup bot", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Database file (overrides config)
    #[arg(short, long)]
    database: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the Telegram bot
    Run {
        /// Bot token (overrides config and environment)
        #[arg(short, long)]
        token: Option<String>,
    },
    /// Talk to the bot from the terminal
    Console {
        /// Username to act as
        #[arg(short, long)]
        user: String,
        /// Use a throwaway in-memory store
        #[arg(long)]
        ephemeral: bool,
    },
    /// Manage user tiers
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

#[derive(Subcommand)]
enum UserAction {
    /// List users with a stored tier
    List,
    /// Show the tier of one user
    Get { username: String },
    /// Add a user with a tier
    Add { username: String, tier: Tier },
    /// Change the tier of an existing user
    Update { username: String, tier: Tier },
    /// Remove a user record (the user falls back to normal)
    Remove { username: String },
    /// Store the special tier for configured special users
    Seed,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Version => {
            println!("pricebot v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            init_config();
        }
        Commands::Run { token } => {
            let config = load_config(&cli.config, cli.database);
            block_on(run_bot(config, token));
        }
        Commands::Console { user, ephemeral } => {
            let config = load_config(&cli.config, cli.database);
            block_on(run_console(config, user, ephemeral));
        }
        Commands::Users { action } => {
            let config = load_config(&cli.config, cli.database);
            block_on(manage_users(config, action));
        }
    }
}

/// Print a diagnostic and exit with a failure code
fn fail(message: impl std::fmt::Display) -> ! {
    tracing::error!("{}", message);
    eprintln!("{}", message);
    std::process::exit(1);
}

fn block_on<F: std::future::Future<Output = ()>>(future: F) {
    match tokio::runtime::Runtime::new() {
        Ok(rt) => rt.block_on(future),
        Err(e) => fail(format!("Failed to start async runtime: {}", e)),
    }
}

fn load_config(path: &str, database: Option<PathBuf>) -> Config {
    let mut config = Config::load_or_default(path)
        .unwrap_or_else(|e| fail(e))
        .apply_env();

    if let Some(database) = database {
        config.database.path = database;
    }
    config
}

fn open_store(config: &Config) -> SqliteStore {
    match SqliteStore::open(&config.database.path) {
        Ok(store) => {
            tracing::info!("Database initialized at {}", config.database.path.display());
            store
        }
        Err(e) => fail(format!("Failed to initialize database: {}", e)),
    }
}

fn build_dispatcher(config: &Config, store: Arc<dyn Store>) -> MessageDispatcher {
    let access = AccessControl::from_config(&config.access);
    if access.approved_count() == 0 {
        tracing::warn!("No approved users configured; every request will be refused");
    }
    if access.writes_open_to_all() {
        tracing::warn!("Price changes are open to every approved user (access.admin-only-writes is off)");
    }

    MessageDispatcher::new(CommandService::new(store, access, &config.bot.prefix))
}

async fn run_bot(config: Config, token_override: Option<String>) {
    let token = match token_override.filter(|t| !t.trim().is_empty()) {
        Some(token) => token,
        None => config.telegram_token().unwrap_or_else(|_| {
            fail(format!(
                "No {} found in environment variables. Please set the token and try again.",
                TOKEN_ENV
            ))
        }),
    };

    tracing::info!("Starting {}", config.bot.name);

    let store = open_store(&config);
    let dispatcher = build_dispatcher(&config, Arc::new(store));

    let poll_timeout = config.telegram.poll_timeout_secs;
    let mut bot = TelegramAdapter::new(token, Duration::from_secs(poll_timeout))
        .unwrap_or_else(|e| fail(e));

    if let Err(e) = bot.start().await {
        fail(format!("Failed to start bot: {}", e));
    }

    // Fetch bot info
    if let Err(e) = bot.fetch_bot_info().await {
        fail(format!("Failed to fetch bot info: {}", e));
    }

    // Register bot commands with Telegram
    if let Err(e) = bot.register_commands().await {
        tracing::warn!("Failed to register commands: {}", e);
    }

    tracing::info!("Bot started: @{}", bot.bot_info().username);

    tokio::select! {
        _ = run_telegram_bot(&bot, &dispatcher, poll_timeout) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down");
        }
    }
}

async fn run_telegram_bot(bot: &TelegramAdapter, dispatcher: &MessageDispatcher, timeout_seconds: u64) {
    let mut offset: i64 = 0;

    tracing::info!("Starting message loop...");

    loop {
        match bot.get_updates(offset, timeout_seconds).await {
            Ok(updates) => {
                if !updates.is_empty() {
                    tracing::debug!("Received {} updates", updates.len());
                }
                for update in &updates {
                    let Some(msg) = &update.message else {
                        continue;
                    };
                    let Some(text) = msg.text.as_deref() else {
                        continue;
                    };

                    let chat_id = msg.chat.id.to_string();
                    let Some(response) = dispatcher.process_text(&chat_id, text, msg.sender()).await else {
                        continue;
                    };

                    tracing::info!("Sending response to chat_id {}", chat_id);
                    if let Err(e) = bot.send_message(&chat_id, &response).await {
                        tracing::error!("Failed to send message: {}", e);
                    }
                }

                // Update offset
                offset = TelegramAdapter::get_next_offset(&updates, offset);
            }
            Err(e) => {
                tracing::error!("Failed to get updates: {}", e);
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
        }
    }
}

async fn run_console(config: Config, username: String, ephemeral: bool) {
    let store: Arc<dyn Store> = if ephemeral {
        tracing::info!("Using in-memory store; nothing will be saved");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(open_store(&config))
    };
    let dispatcher = build_dispatcher(&config, store);

    let bot = ConsoleAdapter::new();
    if let Err(e) = bot.start().await {
        fail(format!("Failed to start bot: {}", e));
    }

    let sender = User::new("console").with_username(username.as_str());

    // Main loop (for console mode)
    while let Some(input) = bot.read_line("> ").await {
        if input.is_empty() {
            continue;
        }

        if let Some(response) = dispatcher.process_text("console", input, Some(sender.clone())).await {
            let _ = bot.send_message("console", &response).await;
        }
    }
}

async fn manage_users(config: Config, action: UserAction) {
    let store = open_store(&config);

    let result: Result<String, StorageError> = match action {
        UserAction::List => store.list_users().await.map(|users| {
            if users.is_empty() {
                "No users stored; everyone is normal tier.".to_string()
            } else {
                users
                    .iter()
                    .map(|(name, tier)| format!("{}\t{}", name, tier))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }),
        UserAction::Get { username } => store.get_user_tier(&username).await.map(|tier| match tier {
            Some(tier) => format!("{}\t{}", username, tier),
            None => format!("{}\t{} (default)", username, Tier::default()),
        }),
        UserAction::Add { username, tier } => store
            .add_user(&username, tier)
            .await
            .map(|()| format!("Added {} as {}", username, tier)),
        UserAction::Update { username, tier } => store.update_user(&username, tier).await.map(|found| {
            if found {
                format!("Updated {} to {}", username, tier)
            } else {
                format!("No stored user named {}", username)
            }
        }),
        UserAction::Remove { username } => store.delete_user(&username).await.map(|found| {
            if found {
                format!("Removed {}", username)
            } else {
                format!("No stored user named {}", username)
            }
        }),
        UserAction::Seed => seed_special_users(&store, &config.access.special_users).await,
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => fail(e),
    }
}

async fn seed_special_users(store: &SqliteStore, special_users: &[String]) -> Result<String, StorageError> {
    let mut added = 0;
    for username in special_users {
        match store.add_user(username, Tier::Special).await {
            Ok(()) => added += 1,
            Err(StorageError::AlreadyExists(_)) => {
                tracing::info!("{} already has a stored tier, leaving it", username);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(format!("Seeded {} of {} special users", added, special_users.len()))
}

fn init_config() {
    let config = Config::default();
    match serde_yaml::to_string(&config) {
        Ok(yaml) => {
            println!("{}", yaml);
            println!("\nSave this to config.yaml and adjust as needed.");
        }
        Err(e) => fail(format!("Failed to render config: {}", e)),
    }
}
