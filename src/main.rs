//! Mi Salud command-line client
//!
//! 1. Loads configuration (`MI_SALUD_CONFIG`, default `config.yaml`)
//! 2. Reuses the stored session or logs in with `MI_SALUD_CORREO` /
//!    `MI_SALUD_PASSWORD`
//! 3. Prints balance, points history and upcoming events ranked by the
//!    user's tags
//!
//! `mi-salud sign-out` ends the stored session instead.

use std::path::PathBuf;

use anyhow::Context;
use tracing::{info, warn};

use mi_salud::api::types::format_timestamp;
use mi_salud::api::{ApiError, JsonFileStore, MiSaludClient, SessionContext, SessionStore};
use mi_salud::config::{self, AppConfig};
use mi_salud::core::{most_recent_first, rank_events, ExactTagOracle, LocalWallet};

fn load_app_config() -> anyhow::Result<AppConfig> {
    let path = PathBuf::from(
        std::env::var("MI_SALUD_CONFIG").unwrap_or_else(|_| "config.yaml".to_string()),
    );
    if path.exists() {
        return Ok(config::load_config(&path)?);
    }
    warn!(path = %path.display(), "Configuration file not found, using defaults");
    let mut cfg = AppConfig::default();
    config::apply_env_overrides(&mut cfg);
    cfg.validate()?;
    Ok(cfg)
}

async fn ensure_session(
    client: &MiSaludClient,
    sessions: &mut SessionStore<JsonFileStore>,
) -> anyhow::Result<SessionContext> {
    match sessions.get_session() {
        Ok(session) => {
            info!(user_id = session.user_id(), "Reusing stored session");
            Ok(session)
        }
        Err(ApiError::MissingSession) => {
            let correo = std::env::var("MI_SALUD_CORREO")
                .context("No stored session and MI_SALUD_CORREO is not set")?;
            let password = std::env::var("MI_SALUD_PASSWORD")
                .context("No stored session and MI_SALUD_PASSWORD is not set")?;
            let outcome = client.login_and_store(&correo, &password, sessions).await?;
            Ok(outcome.session)
        }
        Err(e) => Err(e.into()),
    }
}

fn display_date(raw: &str) -> String {
    format_timestamp(raw).unwrap_or_else(|_| raw.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::init_logging();
    config::constants::log_configuration();

    let app_config = load_app_config().context("Configuration failed")?;
    let client = MiSaludClient::new(&app_config.api)?;
    let store = JsonFileStore::open(&app_config.store.path)
        .with_context(|| format!("Cannot open session file {}", app_config.store.path.display()))?;
    let mut sessions = SessionStore::new(store);

    if std::env::args().nth(1).as_deref() == Some("sign-out") {
        client.sign_out_and_clear(&mut sessions).await?;
        println!("Sesión cerrada");
        return Ok(());
    }

    let session = ensure_session(&client, &mut sessions).await?;
    let user_id = session.user_id();

    let mut wallet = LocalWallet::new();
    match wallet.refresh_from(&client, user_id, &session).await {
        Ok(balance) => match &balance.display_name {
            Some(name) => println!("{}: {} puntos", name, balance.points),
            None => println!("Puntos: {}", balance.points),
        },
        Err(ApiError::Unauthorized(message)) => {
            anyhow::bail!("Session rejected by the server: {}", message);
        }
        Err(e) => return Err(e.into()),
    }

    let history = client.fetch_points_history(user_id, &session).await?;
    println!("\nHistorial:");
    for tx in most_recent_first(history) {
        println!(
            "  {}  {:>+6}  {}",
            display_date(&tx.date),
            tx.signed_points(),
            tx.source_name
        );
    }

    let events = client.fetch_events(&session).await?;
    let tags = sessions.tag_profile()?;
    println!("\nEventos recomendados:");
    for ranked in rank_events(tags.entries(), &events, &ExactTagOracle) {
        let score = ranked
            .score
            .map(|s| format!("{:.0}%", s * 100.0))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{:>4}] {}  {}  {}",
            score,
            ranked.event.title,
            display_date(&ranked.event.date),
            ranked.event.location
        );
    }

    Ok(())
}
