use serde::Deserialize;
use tracker_core::config::Config;

/// Tracker service configuration loaded from environment variables.
#[derive(Debug, Deserialize)]
pub struct TrackerConfig {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Redis connection URL (WebAuthn ceremony state).
    pub redis_url: String,
    /// Server secret. Signs two-factor tickets and derives the TOTP encryption key.
    pub auth_secret: String,
    /// Cookie domain attribute (e.g. "example.com").
    pub cookie_domain: String,
    /// WebAuthn relying-party ID (e.g. "example.com").
    pub webauthn_rp_id: String,
    /// WebAuthn relying-party origin URL (e.g. "https://example.com").
    pub webauthn_origin: String,
    /// Shown as TOTP issuer and WebAuthn RP name. Env var: `APP_NAME`.
    #[serde(default = "default_app_name")]
    pub app_name: String,
    /// TCP port to listen on. Env var: `TRACKER_PORT`.
    #[serde(default = "default_port")]
    pub tracker_port: u16,
}

fn default_app_name() -> String {
    "Tracker".to_owned()
}

fn default_port() -> u16 {
    3000
}

impl Config for TrackerConfig {}
