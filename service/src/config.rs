//! Service configuration.

use serde::Deserialize;
use std::path::Path;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// Path to `RocksDB` data directory (default: "/data/nocta-ledger").
    pub data_dir: String,

    /// Payment gateway API base URL (optional).
    pub gateway_api_url: Option<String>,

    /// Payment gateway API key (optional).
    pub gateway_api_key: Option<String>,

    /// Payment gateway webhook signing secret (optional).
    pub gateway_webhook_secret: Option<String>,

    /// Shared key required on the admin surface (optional).
    pub admin_api_key: Option<String>,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,
}

/// Gateway secrets file structure.
#[derive(Debug, Deserialize)]
struct GatewaySecrets {
    api_url: String,
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let (gateway_api_url, gateway_api_key, gateway_webhook_secret) = load_gateway_secrets();

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir: std::env::var("DATA_DIR").unwrap_or_else(|_| "/data/nocta-ledger".into()),
            gateway_api_url,
            gateway_api_key,
            gateway_webhook_secret,
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            cors_origins: std::env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".into())
                .split(',')
                .map(|s| s.trim().to_string())
                .collect(),
            max_body_bytes: std::env::var("MAX_BODY_BYTES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024), // 1MB
            request_timeout_seconds: std::env::var("REQUEST_TIMEOUT_SECONDS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(30),
        }
    }
}

/// Load gateway secrets from file or environment.
fn load_gateway_secrets() -> (Option<String>, Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/gateway.json",
        "nocta/.secrets/gateway.json",
        "../.secrets/gateway.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<GatewaySecrets>(path) {
            tracing::info!(path = %path, "Loaded gateway secrets from file");
            return (
                Some(secrets.api_url),
                Some(secrets.api_key),
                secrets.webhook_secret,
            );
        }
    }

    tracing::debug!("Gateway secrets file not found, using environment variables");
    (
        std::env::var("GATEWAY_API_URL").ok(),
        std::env::var("GATEWAY_API_KEY").ok(),
        std::env::var("GATEWAY_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            data_dir: "/data/nocta-ledger".into(),
            gateway_api_url: None,
            gateway_api_key: None,
            gateway_webhook_secret: None,
            admin_api_key: None,
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
        }
    }
}
