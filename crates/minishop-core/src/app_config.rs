use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// Settings shared by the server and the terminal client.
///
/// The server reads `bind_addr`, `catalog_path` and `public_dir`; the client
/// reads `api_url`, `client_state_path` and `http_timeout_secs`.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// JSON document holding the catalog, rewritten on every purchase.
    pub catalog_path: PathBuf,
    /// Static assets served as a fallback route, if configured.
    pub public_dir: Option<PathBuf>,
    pub api_url: String,
    /// File backing the client's local storage (cart, profile, history, theme).
    pub client_state_path: PathBuf,
    pub http_timeout_secs: u64,
}
