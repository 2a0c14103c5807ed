use anyhow::{Context, Result};
use std::{path::PathBuf, str::FromStr};
use url::Url;

use super::config_model::{
    Analyzer, Auth, BackendServer, Database, DotEnvyConfig, Processing, Storage,
};

const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ANALYZER_TIMEOUT_SECS: u64 = 900;
const DEFAULT_MEDIA_ROOT: &str = "./media";
const DEFAULT_MAX_CONCURRENT_JOBS: usize = 4;

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let backend_server = BackendServer {
        port: required_parsed("SERVER_PORT_BACKEND")?,
        body_limit: required_parsed("SERVER_BODY_LIMIT")?,
        timeout: required_parsed("SERVER_TIMEOUT")?,
    };

    let database = Database {
        url: required("DATABASE_URL")?,
        max_connections: optional_parsed(
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_DATABASE_MAX_CONNECTIONS,
        )?,
    };

    let analyzer = Analyzer {
        base_url: analyzer_base_url(&required("ANALYZER_BASE_URL")?)?,
        timeout_secs: optional_parsed("ANALYZER_TIMEOUT_SECS", DEFAULT_ANALYZER_TIMEOUT_SECS)?,
    };

    let storage = Storage {
        media_root: std::env::var("MEDIA_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MEDIA_ROOT)),
    };

    let processing = Processing {
        max_concurrent_jobs: optional_parsed(
            "PROCESSING_MAX_CONCURRENT_JOBS",
            DEFAULT_MAX_CONCURRENT_JOBS,
        )?
        .max(1),
    };

    let auth = Auth {
        jwt_secret: required("JWT_SECRET")?,
    };

    Ok(DotEnvyConfig {
        backend_server,
        database,
        analyzer,
        storage,
        processing,
        auth,
    })
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("{key} is invalid"))
}

fn required_parsed<T>(key: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    required(key)?
        .parse()
        .with_context(|| format!("{key} could not be parsed"))
}

fn optional_parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} could not be parsed")),
        _ => Ok(default),
    }
}

/// Endpoints are joined onto the base, which therefore needs a trailing slash.
fn analyzer_base_url(raw: &str) -> Result<Url> {
    let normalized = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    Url::parse(&normalized).context("ANALYZER_BASE_URL is not a valid URL")
}
