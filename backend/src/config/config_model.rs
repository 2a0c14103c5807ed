use std::path::PathBuf;

use url::Url;

#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub backend_server: BackendServer,
    pub database: Database,
    pub analyzer: Analyzer,
    pub storage: Storage,
    pub processing: Processing,
    pub auth: Auth,
}

#[derive(Debug, Clone)]
pub struct BackendServer {
    pub port: u16,
    pub body_limit: u64,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct Analyzer {
    pub base_url: Url,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone)]
pub struct Storage {
    pub media_root: PathBuf,
}

#[derive(Debug, Clone)]
pub struct Processing {
    pub max_concurrent_jobs: usize,
}

#[derive(Debug, Clone)]
pub struct Auth {
    pub jwt_secret: String,
}
