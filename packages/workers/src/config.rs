use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Poll interval used when the `*_LOOP_MS` variable is unset or invalid.
pub const DEFAULT_LOOP_MS: u64 = 15_000;

/// Exporter claims the single oldest job per iteration.
pub const DEFAULT_EXPORT_BATCH_SIZE: i64 = 1;

/// Parser looks at up to five queued documents per iteration.
pub const DEFAULT_PARSER_BATCH_SIZE: i64 = 5;

/// Worker configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub affinda_api_key: Option<String>,
    pub export_loop_interval: Duration,
    pub export_batch_size: i64,
    pub parser_loop_interval: Duration,
    pub parser_batch_size: i64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .context("DATABASE_MAX_CONNECTIONS must be a valid number")?,
            supabase_url: env::var("SUPABASE_URL").context("SUPABASE_URL must be set")?,
            supabase_service_role_key: env::var("SUPABASE_SERVICE_ROLE_KEY")
                .context("SUPABASE_SERVICE_ROLE_KEY must be set")?,
            affinda_api_key: env::var("AFFINDA_API_KEY").ok(),
            export_loop_interval: loop_interval(
                env::var("EXPORT_LOOP_MS").ok().as_deref(),
                DEFAULT_LOOP_MS,
            ),
            export_batch_size: batch_size(
                env::var("EXPORT_BATCH_SIZE").ok().as_deref(),
                DEFAULT_EXPORT_BATCH_SIZE,
            ),
            parser_loop_interval: loop_interval(
                env::var("PARSER_LOOP_MS").ok().as_deref(),
                DEFAULT_LOOP_MS,
            ),
            parser_batch_size: batch_size(
                env::var("PARSER_BATCH_SIZE").ok().as_deref(),
                DEFAULT_PARSER_BATCH_SIZE,
            ),
        })
    }
}

/// Parse a poll interval in milliseconds, falling back when the value is
/// missing, non-numeric, or not positive.
pub fn loop_interval(raw: Option<&str>, fallback_ms: u64) -> Duration {
    let ms = raw
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .unwrap_or(fallback_ms);
    Duration::from_millis(ms)
}

fn batch_size(raw: Option<&str>, fallback: i64) -> i64 {
    raw.and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(fallback)
}
