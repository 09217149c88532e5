//! Creates the first Admin account. Registration only ever yields Customers,
//! so a fresh database needs one Admin inserted out of band.
//!
//! Reads `DATABASE_URL`, `ADMIN_EMAIL`, `ADMIN_PASSWORD` and optionally
//! `ADMIN_NAME` from the environment (or `.env`).

use anyhow::{bail, Context};
use auth_adapters::Argon2PasswordHasher;
use chrono::Utc;
use domains::{NewUser, PasswordHasher, Role, UserRepository};
use storage_adapters::PgStore;
use tracing::info;

fn required(name: &str) -> anyhow::Result<String> {
    std::env::var(name).with_context(|| format!("{name} must be set"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_env_filter("info").init();

    let url = required("DATABASE_URL")?;
    let email = required("ADMIN_EMAIL")?.trim().to_lowercase();
    let password = required("ADMIN_PASSWORD")?;
    let name = std::env::var("ADMIN_NAME").unwrap_or_else(|_| "Administrator".into());
    if password.is_empty() {
        bail!("ADMIN_PASSWORD must not be empty");
    }

    let store = PgStore::connect(&url, 1).await?;
    store.migrate().await?;

    if let Some(existing) = store.get_by_email(&email).await? {
        info!(id = existing.id.value(), "account already exists, nothing to do");
        return Ok(());
    }

    let password_hash = Argon2PasswordHasher::new().hash(&password)?;
    let admin = store
        .insert(NewUser {
            name,
            email,
            password_hash,
            role: Role::Admin,
            created_at: Utc::now(),
        })
        .await?;
    info!(id = admin.id.value(), email = %admin.email, "admin created");
    Ok(())
}
