//! Runtime configuration
//!
//! Defaults are overridden by `SIGNUP_*` environment variables (a `.env` file
//! is honoured by the binary).

use std::path::PathBuf;

/// Configuration for the signup driver and its HTTP resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupConfig {
    /// Origin the resolver endpoints live under
    pub resolver_url: String,
    /// Path of the bases-for-squadron endpoint
    pub bases_path: String,
    /// Path of the aircraft-for-squadron endpoint
    pub aircraft_path: String,
    /// Page bootstrap document (campaign, lookup tables, anchors)
    pub bootstrap_file: PathBuf,
    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset
    pub log_filter: String,
    pub user_agent: String,
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            resolver_url: "http://localhost:5000".to_string(),
            bases_path: "/bases-for-squadron".to_string(),
            aircraft_path: "/aircraft-for-squadron".to_string(),
            bootstrap_file: PathBuf::from("bootstrap.json"),
            log_filter: "sortie_signup=info".to_string(),
            user_agent: concat!("sortie-signup/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl SignupConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(url) = get("SIGNUP_RESOLVER_URL") {
            config.resolver_url = url;
        }
        if let Some(path) = get("SIGNUP_BASES_PATH") {
            config.bases_path = path;
        }
        if let Some(path) = get("SIGNUP_AIRCRAFT_PATH") {
            config.aircraft_path = path;
        }
        if let Some(file) = get("SIGNUP_BOOTSTRAP_FILE") {
            config.bootstrap_file = PathBuf::from(file);
        }
        if let Some(filter) = get("SIGNUP_LOG") {
            config.log_filter = filter;
        }
        config
    }
}
