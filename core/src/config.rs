//! Typed configuration for backend connection and pool tuning (spec §4.C).
//! The engine never reads files or environment variables itself — callers
//! build these structs however they like (TOML, env, hardcoded) and hand
//! them to `Engine::open`.

use serde::{Deserialize, Serialize};

/// Embedded file backend tuning. Field names are semantic, not tied to any
/// one driver's pragma names.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileBackendConfig {
    pub path: String,
    /// Non-empty enables page-level encryption.
    #[serde(default)]
    pub encryption_key: Option<String>,
    #[serde(default = "default_kdf_iterations")]
    pub kdf_iterations: u32,
    #[serde(default = "default_cipher_page_size")]
    pub cipher_page_size: u32,
    #[serde(default = "default_true")]
    pub cipher_use_hmac: bool,
    #[serde(default = "default_true")]
    pub enable_wal: bool,
    /// Negative values mean bytes, per spec convention.
    #[serde(default = "default_cache_size")]
    pub cache_size: i64,
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    #[serde(default = "default_journal_mode")]
    pub journal_mode: String,
    #[serde(default = "default_synchronous")]
    pub synchronous: String,
    #[serde(default = "default_temp_store")]
    pub temp_store: String,
    #[serde(default = "default_mmap_size")]
    pub mmap_size: i64,
}

fn default_kdf_iterations() -> u32 {
    256_000
}
fn default_cipher_page_size() -> u32 {
    4096
}
fn default_true() -> bool {
    true
}
fn default_cache_size() -> i64 {
    -64_000
}
fn default_busy_timeout_ms() -> u64 {
    5_000
}
fn default_journal_mode() -> String {
    "WAL".to_string()
}
fn default_synchronous() -> String {
    "NORMAL".to_string()
}
fn default_temp_store() -> String {
    "MEMORY".to_string()
}
fn default_mmap_size() -> i64 {
    268_435_456
}

impl Default for FileBackendConfig {
    fn default() -> Self {
        Self {
            path: ":memory:".to_string(),
            encryption_key: None,
            kdf_iterations: default_kdf_iterations(),
            cipher_page_size: default_cipher_page_size(),
            cipher_use_hmac: default_true(),
            enable_wal: default_true(),
            cache_size: default_cache_size(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: default_journal_mode(),
            synchronous: default_synchronous(),
            temp_store: default_temp_store(),
            mmap_size: default_mmap_size(),
        }
    }
}

/// Networked backend (client/server relational database) connection info.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkBackendConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    pub database: String,
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,
    #[serde(default = "default_idle_in_tx_timeout_ms")]
    pub idle_in_tx_timeout_ms: u64,
    #[serde(default)]
    pub enable_jit: bool,
}

fn default_statement_timeout_ms() -> u64 {
    30_000
}
fn default_idle_in_tx_timeout_ms() -> u64 {
    60_000
}

/// Which backend to open, and its backend-specific settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackendConfig {
    File(FileBackendConfig),
    Network(NetworkBackendConfig),
}

/// Pool-level limits, shared by both backends (spec §4.C).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    #[serde(default = "default_max_open")]
    pub max_open: usize,
    #[serde(default = "default_max_idle")]
    pub max_idle: usize,
    #[serde(default = "default_conn_max_lifetime_secs")]
    pub conn_max_lifetime_secs: u64,
    #[serde(default = "default_conn_max_idle_time_secs")]
    pub conn_max_idle_time_secs: u64,
}

fn default_max_open() -> usize {
    10
}
fn default_max_idle() -> usize {
    5
}
fn default_conn_max_lifetime_secs() -> u64 {
    3600
}
fn default_conn_max_idle_time_secs() -> u64 {
    600
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_open: default_max_open(),
            max_idle: default_max_idle(),
            conn_max_lifetime_secs: default_conn_max_lifetime_secs(),
            conn_max_idle_time_secs: default_conn_max_idle_time_secs(),
        }
    }
}
