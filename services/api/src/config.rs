//! Service configuration from environment variables

use std::env;
use std::path::PathBuf;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind_addr: String,
    /// Directory uploaded photos and documents are stored under
    pub upload_dir: PathBuf,
    /// Session lifetime in seconds
    pub session_ttl_secs: i64,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let session_ttl_secs = env::var("SESSION_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(60 * 60 * 24);

        Self {
            bind_addr,
            upload_dir,
            session_ttl_secs,
        }
    }
}
