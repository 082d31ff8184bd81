use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Coordination store URL (default: `redis://127.0.0.1:6379`).
    pub redis_url: String,
    /// Cache entry TTL in seconds (default: one hour).
    pub cache_ttl_secs: u64,
    /// Minimum card count for the readiness probe to report UP.
    pub min_healthy_card_count: i64,
    /// Upstream catalog API used for seeding and reloads.
    pub card_source_url: String,
    /// JWT key paths and token lifetimes.
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                                        |
    /// |--------------------------|------------------------------------------------|
    /// | `HOST`                   | `0.0.0.0`                                      |
    /// | `PORT`                   | `3000`                                         |
    /// | `CORS_ORIGINS`           | `http://localhost:5173`                        |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                                           |
    /// | `REDIS_URL`              | `redis://127.0.0.1:6379`                       |
    /// | `CACHE_TTL_SECS`         | `3600`                                         |
    /// | `MIN_HEALTHY_CARD_COUNT` | `1`                                            |
    /// | `CARD_SOURCE_URL`        | `https://db.ygoprodeck.com/api/v7/cardinfo.php`|
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let redis_url =
            std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://127.0.0.1:6379".into());

        let cache_ttl_secs: u64 = std::env::var("CACHE_TTL_SECS")
            .unwrap_or_else(|_| "3600".into())
            .parse()
            .expect("CACHE_TTL_SECS must be a valid u64");

        let min_healthy_card_count: i64 = std::env::var("MIN_HEALTHY_CARD_COUNT")
            .unwrap_or_else(|_| "1".into())
            .parse()
            .expect("MIN_HEALTHY_CARD_COUNT must be a valid i64");

        let card_source_url = std::env::var("CARD_SOURCE_URL")
            .unwrap_or_else(|_| "https://db.ygoprodeck.com/api/v7/cardinfo.php".into());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            redis_url,
            cache_ttl_secs,
            min_healthy_card_count,
            card_source_url,
            jwt,
        }
    }
}
