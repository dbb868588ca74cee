//! Application-wide constants and configuration defaults
//!
//! Values that deployments commonly change can be overridden via environment
//! variables; the overrides are applied on top of the YAML file by the loader.

// =============================================================================
// API Defaults
// =============================================================================

/// Request timeout applied when the config file does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Header carrying the session token
pub const DEFAULT_SESSION_HEADER: &str = "key";

/// Base URL used when nothing else is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Session file used when the config file does not set one
pub const DEFAULT_STORE_PATH: &str = ".mi_salud/session.json";

/// Exact server message that confirms a benefit purchase
pub const PURCHASE_SUCCESS_MESSAGE: &str = "Beneficio comprado exitosamente";

// =============================================================================
// Environment Overrides
// =============================================================================

/// Backend base URL override
///
/// Environment variable: `MI_SALUD_BASE_URL`
pub fn base_url_override() -> Option<String> {
    std::env::var("MI_SALUD_BASE_URL")
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Request timeout override in seconds
///
/// Environment variable: `MI_SALUD_TIMEOUT_SECS`
pub fn timeout_override() -> Option<u64> {
    std::env::var("MI_SALUD_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.trim().parse().ok())
}

/// Print the effective overrides (for startup logs)
pub fn log_configuration() {
    tracing::info!(
        base_url_override = ?base_url_override(),
        timeout_override = ?timeout_override(),
        "Environment overrides"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial(env)]
    fn test_no_overrides_by_default() {
        std::env::remove_var("MI_SALUD_BASE_URL");
        std::env::remove_var("MI_SALUD_TIMEOUT_SECS");
        assert_eq!(base_url_override(), None);
        assert_eq!(timeout_override(), None);
    }

    #[test]
    #[serial(env)]
    fn test_env_override() {
        std::env::set_var("MI_SALUD_BASE_URL", " https://salud.example.org ");
        std::env::set_var("MI_SALUD_TIMEOUT_SECS", "12");

        assert_eq!(base_url_override().as_deref(), Some("https://salud.example.org"));
        assert_eq!(timeout_override(), Some(12));

        std::env::remove_var("MI_SALUD_BASE_URL");
        std::env::remove_var("MI_SALUD_TIMEOUT_SECS");
    }

    #[test]
    #[serial(env)]
    fn test_unparseable_timeout_is_ignored() {
        std::env::set_var("MI_SALUD_TIMEOUT_SECS", "soon");
        assert_eq!(timeout_override(), None);
        std::env::remove_var("MI_SALUD_TIMEOUT_SECS");
    }
}
