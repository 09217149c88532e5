//! # Helpdesk server
//!
//! Assembles the adapters selected at compile time and serves the HTTP API.

use std::sync::Arc;

use anyhow::Context;
use api_adapters::{router, AppState};
use auth_adapters::{Argon2PasswordHasher, JwtTokenService};
use chrono::Duration;
use configs::Settings;
use domains::{CommentRepository, TicketRepository, UserRepository};
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[cfg(feature = "db-postgres")]
use storage_adapters::PgStore;
use storage_adapters::InMemoryStore;

struct Stores {
    tickets: Arc<dyn TicketRepository>,
    comments: Arc<dyn CommentRepository>,
    users: Arc<dyn UserRepository>,
}

impl Stores {
    fn shared<S>(store: Arc<S>) -> Self
    where
        S: TicketRepository + CommentRepository + UserRepository + 'static,
    {
        Self {
            tickets: store.clone(),
            comments: store.clone(),
            users: store,
        }
    }
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log.filter));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

#[cfg(feature = "db-postgres")]
async fn open_postgres(settings: &Settings) -> anyhow::Result<Option<Stores>> {
    let Some(url) = &settings.database.url else {
        return Ok(None);
    };
    let store = PgStore::connect(url.expose_secret(), settings.database.max_connections)
        .await
        .context("connecting to postgres")?;
    store.migrate().await.context("running migrations")?;
    info!("using postgres store");
    Ok(Some(Stores::shared(Arc::new(store))))
}

#[cfg(not(feature = "db-postgres"))]
async fn open_postgres(settings: &Settings) -> anyhow::Result<Option<Stores>> {
    if settings.database.url.is_some() {
        warn!("database.url is set but this build has no postgres support");
    }
    Ok(None)
}

async fn open_stores(settings: &Settings) -> anyhow::Result<Stores> {
    if let Some(stores) = open_postgres(settings).await? {
        return Ok(stores);
    }
    warn!("no database configured, records live in memory only");
    Ok(Stores::shared(Arc::new(InMemoryStore::new())))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(error = %err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    init_tracing(&settings);

    let signing_key = settings.signing_key()?;
    let tokens = Arc::new(JwtTokenService::new(
        signing_key.expose_secret().as_bytes(),
        settings.auth.issuer.clone(),
        Duration::hours(settings.auth.token_ttl_hours),
    ));
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let stores = open_stores(&settings).await?;

    let state = AppState::new(stores.tickets, stores.comments, stores.users, hasher, tokens);
    let app = router(state);

    let addr = settings.server.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "helpdesk listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;
    Ok(())
}
