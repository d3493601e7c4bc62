//! Configuration management

use secrecy::{ExposeSecret, SecretString};
use std::str::FromStr;
use std::time::Duration;

// ============================================================================
// Server Configuration Constants
// ============================================================================

/// Default server host binding.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default server port.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default shutdown timeout in seconds.
pub const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 30;

/// Default request body limit for template uploads (10 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Default database URL for local development.
pub const DEFAULT_DATABASE_URL: &str = "postgresql://localhost/docmint";

/// Default maximum database connections in the pool.
pub const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;

/// Default minimum database connections in the pool.
pub const DEFAULT_DATABASE_MIN_CONNECTIONS: u32 = 2;

/// Default database connection timeout in seconds.
pub const DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Default database idle timeout in seconds (10 minutes).
pub const DEFAULT_DATABASE_IDLE_TIMEOUT_SECS: u64 = 600;

/// Default CORS allowed origin for local development.
pub const DEFAULT_CORS_ALLOWED_ORIGIN: &str = "http://localhost:3000";

// ============================================================================
// External Service Constants
// ============================================================================

/// Document build endpoint used to render template previews.
pub const DEFAULT_RENDER_API_URL: &str = "https://api.pspdfkit.com/build";

/// Preview JPEG quality factor.
pub const DEFAULT_RENDER_QUALITY: u8 = 70;

/// Preview resolution in dots per inch.
pub const DEFAULT_RENDER_DPI: u32 = 250;

/// Default timeout for a single render request.
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 60;

/// PDF Services API base URL used for document merge.
pub const DEFAULT_MERGE_API_URL: &str = "https://pdf-services.adobe.io";

/// Interval between merge job status polls.
pub const DEFAULT_MERGE_POLL_INTERVAL_MS: u64 = 1_000;

/// Maximum number of merge job status polls before giving up.
pub const DEFAULT_MERGE_MAX_POLLS: u32 = 60;

/// Default timeout for a single merge service HTTP request.
pub const DEFAULT_MERGE_TIMEOUT_SECS: u64 = 60;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub cors: CorsConfig,
    pub render: RenderConfig,
    pub merge: MergeConfig,
}

/// Server-specific configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub shutdown_timeout_secs: u64,
    pub max_upload_bytes: usize,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

/// CORS configuration
#[derive(Debug, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub allow_credentials: bool,
}

/// Preview rendering service configuration
#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub api_url: String,
    pub api_key: SecretString,
    pub quality: u8,
    pub dpi: u32,
    pub timeout_secs: u64,
}

/// Document merge service configuration
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub api_url: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub poll_interval_ms: u64,
    pub max_polls: u32,
    pub timeout_secs: u64,
}

impl RenderConfig {
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: SecretString::new(api_key.into()),
            quality: DEFAULT_RENDER_QUALITY,
            dpi: DEFAULT_RENDER_DPI,
            timeout_secs: DEFAULT_RENDER_TIMEOUT_SECS,
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl MergeConfig {
    pub fn new(
        api_url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
            poll_interval_ms: DEFAULT_MERGE_POLL_INTERVAL_MS,
            max_polls: DEFAULT_MERGE_MAX_POLLS,
            timeout_secs: DEFAULT_MERGE_TIMEOUT_SECS,
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

impl Config {
    /// Load configuration from `.env`, environment and defaults
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Config {
            server: ServerConfig {
                host: env_string("DOCMINT_HOST", DEFAULT_SERVER_HOST),
                port: env_or("DOCMINT_PORT", DEFAULT_SERVER_PORT),
                shutdown_timeout_secs: env_or(
                    "DOCMINT_SHUTDOWN_TIMEOUT",
                    DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                ),
                max_upload_bytes: env_or("DOCMINT_MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES),
            },
            database: DatabaseConfig {
                url: env_string("DATABASE_URL", DEFAULT_DATABASE_URL),
                max_connections: env_or(
                    "DATABASE_MAX_CONNECTIONS",
                    DEFAULT_DATABASE_MAX_CONNECTIONS,
                ),
                min_connections: env_or(
                    "DATABASE_MIN_CONNECTIONS",
                    DEFAULT_DATABASE_MIN_CONNECTIONS,
                ),
                connect_timeout_secs: env_or(
                    "DATABASE_CONNECT_TIMEOUT",
                    DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                ),
                idle_timeout_secs: env_or(
                    "DATABASE_IDLE_TIMEOUT",
                    DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
                ),
            },
            cors: CorsConfig {
                allowed_origins: env_string("CORS_ALLOWED_ORIGINS", DEFAULT_CORS_ALLOWED_ORIGIN)
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                allow_credentials: env_or("CORS_ALLOW_CREDENTIALS", true),
            },
            render: RenderConfig {
                api_url: env_string("RENDER_API_URL", DEFAULT_RENDER_API_URL),
                api_key: SecretString::new(env_string("RENDER_API_KEY", "")),
                quality: env_or("RENDER_QUALITY", DEFAULT_RENDER_QUALITY),
                dpi: env_or("RENDER_DPI", DEFAULT_RENDER_DPI),
                timeout_secs: env_or("RENDER_TIMEOUT", DEFAULT_RENDER_TIMEOUT_SECS),
            },
            merge: MergeConfig {
                api_url: env_string("MERGE_API_URL", DEFAULT_MERGE_API_URL),
                client_id: env_string("MERGE_CLIENT_ID", ""),
                client_secret: SecretString::new(env_string("MERGE_CLIENT_SECRET", "")),
                poll_interval_ms: env_or("MERGE_POLL_INTERVAL_MS", DEFAULT_MERGE_POLL_INTERVAL_MS),
                max_polls: env_or("MERGE_MAX_POLLS", DEFAULT_MERGE_MAX_POLLS),
                timeout_secs: env_or("MERGE_TIMEOUT", DEFAULT_MERGE_TIMEOUT_SECS),
            },
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            anyhow::bail!("Server port must be greater than 0");
        }

        if self.server.max_upload_bytes == 0 {
            anyhow::bail!("DOCMINT_MAX_UPLOAD_BYTES must be greater than 0");
        }

        if self.database.url.is_empty() {
            anyhow::bail!("Database URL cannot be empty");
        }

        if self.database.max_connections == 0 {
            anyhow::bail!("Database max_connections must be greater than 0");
        }

        if self.database.min_connections > self.database.max_connections {
            anyhow::bail!(
                "Database min_connections ({}) cannot be greater than max_connections ({})",
                self.database.min_connections,
                self.database.max_connections
            );
        }

        if self.render.api_key.expose_secret().is_empty() {
            anyhow::bail!("RENDER_API_KEY must be set");
        }

        if self.render.quality == 0 || self.render.quality > 100 {
            anyhow::bail!("RENDER_QUALITY must be between 1 and 100");
        }

        if self.merge.client_id.is_empty() {
            anyhow::bail!("MERGE_CLIENT_ID must be set");
        }

        if self.merge.client_secret.expose_secret().is_empty() {
            anyhow::bail!("MERGE_CLIENT_SECRET must be set");
        }

        if self.merge.max_polls == 0 {
            anyhow::bail!("MERGE_MAX_POLLS must be greater than 0");
        }

        if self.cors.allowed_origins.is_empty() {
            tracing::warn!("No CORS origins configured - all origins will be allowed");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: DEFAULT_SERVER_HOST.to_string(),
                port: DEFAULT_SERVER_PORT,
                shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            database: DatabaseConfig {
                url: DEFAULT_DATABASE_URL.to_string(),
                max_connections: DEFAULT_DATABASE_MAX_CONNECTIONS,
                min_connections: DEFAULT_DATABASE_MIN_CONNECTIONS,
                connect_timeout_secs: DEFAULT_DATABASE_CONNECT_TIMEOUT_SECS,
                idle_timeout_secs: DEFAULT_DATABASE_IDLE_TIMEOUT_SECS,
            },
            cors: CorsConfig {
                allowed_origins: vec![DEFAULT_CORS_ALLOWED_ORIGIN.to_string()],
                allow_credentials: true,
            },
            render: RenderConfig::new(DEFAULT_RENDER_API_URL, ""),
            merge: MergeConfig::new(DEFAULT_MERGE_API_URL, "", ""),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn configured() -> Config {
        let mut config = Config::default();
        config.render = RenderConfig::new(DEFAULT_RENDER_API_URL, "render-key");
        config.merge = MergeConfig::new(DEFAULT_MERGE_API_URL, "client", "secret");
        config
    }

    #[test]
    fn test_defaults_match_preview_settings() {
        let config = Config::default();
        assert_eq!(config.render.quality, 70);
        assert_eq!(config.render.dpi, 250);
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_configured_validates() {
        assert!(configured().validate().is_ok());
    }

    #[test]
    fn test_missing_credentials_rejected() {
        let err = Config::default().validate().unwrap_err();
        assert!(err.to_string().contains("RENDER_API_KEY"));

        let mut config = configured();
        config.merge.client_secret = SecretString::new(String::new());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MERGE_CLIENT_SECRET"));
    }

    #[test]
    fn test_pool_bounds_rejected() {
        let mut config = configured();
        config.database.min_connections = 20;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secrets_are_redacted_in_debug() {
        let config = configured();
        let debug = format!("{:?}", config.render);
        assert!(!debug.contains("render-key"));
    }

    #[test]
    #[serial]
    fn test_load_from_env() {
        std::env::set_var("DOCMINT_PORT", "9191");
        std::env::set_var("RENDER_API_KEY", "render-key");
        std::env::set_var("MERGE_CLIENT_ID", "client");
        std::env::set_var("MERGE_CLIENT_SECRET", "secret");
        std::env::set_var("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test");

        let config = Config::load().unwrap();
        assert_eq!(config.server.port, 9191);
        assert_eq!(config.merge.client_id, "client");
        assert_eq!(
            config.cors.allowed_origins,
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );

        for key in [
            "DOCMINT_PORT",
            "RENDER_API_KEY",
            "MERGE_CLIENT_ID",
            "MERGE_CLIENT_SECRET",
            "CORS_ALLOWED_ORIGINS",
        ] {
            std::env::remove_var(key);
        }
    }
}
