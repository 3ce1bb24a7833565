use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use friday_agent::pipeline;
use friday_agent::AssistantSlot;
use friday_core::config::FridayConfig;
use friday_store::{AdminDirectory, ContentStore, MessageStore, PolicyStore, SharedConn};
use tokio::sync::watch;
use tracing::{info, warn};

mod app;
mod http;
#[cfg(test)]
mod testing;

#[derive(Parser)]
#[command(name = "friday-gateway", about = "Yellow Friday live chat gateway")]
struct Cli {
    /// Config file. Falls back to FRIDAY_CONFIG, then ~/.friday/friday.toml.
    #[arg(long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Make a user an administrator and print a fresh bearer token for them.
    GrantAdmin {
        #[arg(long)]
        user: String,
        /// Token lifetime; omit for a token that never expires.
        #[arg(long)]
        ttl_hours: Option<i64>,
    },
    /// Remove a user from the administrators table. Their tokens stay valid
    /// for login but no longer open the admin API.
    RevokeAdmin {
        #[arg(long)]
        user: String,
    },
    /// Queue a seed question for the auto-poster.
    AddSeed {
        #[arg(long)]
        question: String,
        #[arg(long)]
        user_name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "friday_gateway=info,tower_http=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    // load config: --config > FRIDAY_CONFIG env > ~/.friday/friday.toml
    let config_path = cli.config.or_else(|| std::env::var("FRIDAY_CONFIG").ok());
    let mut config = FridayConfig::load(config_path.as_deref()).unwrap_or_else(|e| {
        warn!("Config load failed ({}), using defaults", e);
        FridayConfig::default()
    });
    apply_env_fallbacks(&mut config);

    // single SQLite file for every store
    let db_path = config.database.path.clone();
    ensure_parent_dir(&db_path);
    info!(path = %db_path, "opening SQLite database");

    let db = rusqlite::Connection::open(&db_path)?;
    db.execute_batch("PRAGMA journal_mode=WAL;")?;
    friday_store::init_db(&db)?;
    drop(db);
    info!("database schema ready");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, &db_path).await,
        Command::GrantAdmin { user, ttl_hours } => {
            let admins = AdminDirectory::new(open_shared(&db_path)?);
            admins.grant_admin(&user)?;
            let token = admins.issue_token(&user, ttl_hours.map(chrono::Duration::hours))?;
            info!(user = %user, "administrator granted");
            println!("{token}");
            Ok(())
        }
        Command::RevokeAdmin { user } => {
            let admins = AdminDirectory::new(open_shared(&db_path)?);
            if admins.revoke_admin(&user)? {
                info!(user = %user, "administrator revoked");
            } else {
                warn!(user = %user, "user was not an administrator");
            }
            Ok(())
        }
        Command::AddSeed {
            question,
            user_name,
        } => {
            let content = ContentStore::new(open_shared(&db_path)?);
            let seed = content.add_seed(&question, &user_name)?;
            info!(id = seed.id, unsent = content.count_unsent()?, "seed question queued");
            Ok(())
        }
    }
}

async fn serve(config: FridayConfig, db_path: &str) -> anyhow::Result<()> {
    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let autopost_every = config.autopost.interval_secs.filter(|s| *s > 0);

    // each store gets its own connection for thread safety
    let assistant = AssistantSlot::from_config(&config.assistant);
    let state = Arc::new(app::AppState::new(
        config,
        MessageStore::new(open_shared(db_path)?),
        PolicyStore::new(open_shared(db_path)?),
        ContentStore::new(open_shared(db_path)?),
        AdminDirectory::new(open_shared(db_path)?),
        assistant,
    ));
    let router = app::build_router(state.clone());

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    if let Some(secs) = autopost_every {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            run_autopost(state, Duration::from_secs(secs), shutdown_rx).await;
        });
        info!(every_secs = secs, "in-process auto-post enabled");
    }

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Yellow Friday gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    // signal the auto-poster to stop
    let _ = shutdown_tx.send(true);
    Ok(())
}

/// Post one seed question every `every` until shutdown.
async fn run_autopost(
    state: Arc<app::AppState>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut interval = tokio::time::interval(every);
    // the first tick completes immediately; wait a full period instead
    interval.tick().await;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                match pipeline::auto_post(state.as_ref()).await {
                    Ok(outcome) => info!(?outcome, "scheduled auto-post"),
                    Err(e) => warn!(error = %e, "scheduled auto-post failed"),
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("auto-poster shutting down");
                    break;
                }
            }
        }
    }
}

/// Environment names the hosted deployment used, honoured when the config
/// file leaves the assistant credentials out.
fn apply_env_fallbacks(config: &mut FridayConfig) {
    if config.assistant.api_key.is_none() {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            info!("assistant API key taken from OPENAI_API_KEY");
            config.assistant.api_key = Some(key);
        }
    }
    if config.assistant.assistant_id.is_none() {
        if let Ok(id) = std::env::var("ASSISTANT_ID") {
            config.assistant.assistant_id = Some(id);
        }
    }
}

fn open_shared(path: &str) -> anyhow::Result<SharedConn> {
    Ok(friday_store::shared(rusqlite::Connection::open(path)?))
}

/// Ensure the parent directory for a file path exists.
fn ensure_parent_dir(path: &str) {
    if let Some(parent) = std::path::Path::new(path).parent() {
        let _ = std::fs::create_dir_all(parent);
    }
}
