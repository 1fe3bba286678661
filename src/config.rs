use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Molaire";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> String {
    "molaire=info,tower_http=info".to_string()
}

/// Get the application data directory
/// ~/Molaire/ on all platforms (user-visible)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("Molaire")
}

/// Runtime settings, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Address the HTTP server binds to.
    pub bind_addr: SocketAddr,
    /// SQLite database file.
    pub database_path: PathBuf,
    /// Root directory for uploaded files.
    pub upload_dir: PathBuf,
    /// HS256 signing secret for bearer tokens.
    pub jwt_secret: String,
    /// Bearer token lifetime in hours.
    pub token_ttl_hours: i64,
    /// The single origin allowed by CORS.
    pub cors_origin: String,
    /// Optional HTTP endpoint for outbound mail delivery.
    /// When unset, activation codes are only logged.
    pub mail_webhook_url: Option<String>,
}

impl Settings {
    pub fn from_env() -> Self {
        let data_dir = app_data_dir();
        Self {
            bind_addr: env::var("MOLAIRE_BIND")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_else(|| "127.0.0.1:8088".parse().unwrap()),
            database_path: env::var("MOLAIRE_DB")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("molaire.db")),
            upload_dir: env::var("MOLAIRE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| data_dir.join("uploads")),
            jwt_secret: env::var("MOLAIRE_JWT_SECRET")
                .unwrap_or_else(|_| "change-me-in-production".to_string()),
            token_ttl_hours: env::var("MOLAIRE_TOKEN_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(24),
            cors_origin: env::var("MOLAIRE_CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:4200".to_string()),
            mail_webhook_url: env::var("MOLAIRE_MAIL_WEBHOOK").ok(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("Molaire"));
    }

    #[test]
    fn settings_have_sane_defaults() {
        let settings = Settings::from_env();
        assert!(settings.token_ttl_hours > 0);
        assert!(!settings.jwt_secret.is_empty());
        assert!(!settings.cors_origin.is_empty());
    }

    #[test]
    fn app_name_is_molaire() {
        assert_eq!(APP_NAME, "Molaire");
    }
}
