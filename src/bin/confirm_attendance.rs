//! Attendance kiosk
//!
//! Usage: `confirm-attendance <qr-payload> <event-id>`
//!
//! Confirms that the attendee whose QR code was scanned is present at the
//! given event. Needs no session.

use std::path::Path;

use anyhow::Context;
use tracing::error;

use mi_salud::api::{ApiError, MiSaludClient};
use mi_salud::config::{self, AppConfig};
use mi_salud::core::AttendanceScan;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::init_logging();

    let mut args = std::env::args().skip(1);
    let (Some(payload), Some(event_id)) = (args.next(), args.next()) else {
        anyhow::bail!("Usage: confirm-attendance <qr-payload> <event-id>");
    };

    let app_config = match std::env::var("MI_SALUD_CONFIG") {
        Ok(path) => config::load_config(Path::new(&path))?,
        Err(_) => {
            let mut cfg = AppConfig::default();
            config::apply_env_overrides(&mut cfg);
            cfg.validate()?;
            cfg
        }
    };

    let scan = AttendanceScan::parse(&payload, &event_id).context("Invalid scan")?;
    let client = MiSaludClient::new(&app_config.api)?;

    match client.confirm_attendance(&scan).await {
        Ok(message) => {
            println!("{}", message);
            Ok(())
        }
        Err(ApiError::HttpStatus { status, message }) => {
            error!(status, "Attendance not confirmed");
            println!("{}", message);
            std::process::exit(1);
        }
        Err(e) => Err(e.into()),
    }
}
