use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Every variable has a default, so an empty environment yields a usable
/// development config.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("MINISHOP_ENV", "development"))?;

    // MINISHOP_BIND_ADDR wins; a bare PORT (as set by most hosting platforms)
    // binds every interface on that port.
    let bind_addr = match lookup("MINISHOP_BIND_ADDR") {
        Ok(raw) => raw
            .parse::<SocketAddr>()
            .map_err(|e| invalid("MINISHOP_BIND_ADDR", e.to_string()))?,
        Err(_) => match lookup("PORT") {
            Ok(port) => {
                let port = port
                    .trim()
                    .parse::<u16>()
                    .map_err(|e| invalid("PORT", e.to_string()))?;
                SocketAddr::from(([0, 0, 0, 0], port))
            }
            Err(_) => SocketAddr::from(([0, 0, 0, 0], 3000)),
        },
    };

    let log_level = or_default("MINISHOP_LOG_LEVEL", "info");
    let catalog_path = PathBuf::from(or_default("MINISHOP_CATALOG_PATH", "./data/products.json"));
    let public_dir = lookup("MINISHOP_PUBLIC_DIR")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(PathBuf::from);

    let api_url = or_default("MINISHOP_API_URL", "http://localhost:3000");
    if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
        return Err(invalid(
            "MINISHOP_API_URL",
            format!("expected an http(s) URL, got '{api_url}'"),
        ));
    }
    let api_url = api_url.trim_end_matches('/').to_string();

    let client_state_path = PathBuf::from(or_default(
        "MINISHOP_CLIENT_STATE_PATH",
        "./.minishop/local-storage.json",
    ));
    let http_timeout_secs = parse_u64("MINISHOP_HTTP_TIMEOUT_SECS", "10")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        catalog_path,
        public_dir,
        api_url,
        client_state_path,
        http_timeout_secs,
    })
}

fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "MINISHOP_ENV".to_string(),
            reason: format!("expected development, test, or production; got '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
