//! Session pragma / connection-string construction for both backends
//! (spec §4.C, steps 1–3 and 5).

use helixtrack_core::{EngineResult, FileBackendConfig, NetworkBackendConfig};

/// Apply encryption parameters, then durability/performance pragmas, to a
/// freshly opened file-backend connection. Encryption parameters must be
/// applied before any data-accessing pragma, per spec step 1.
pub fn apply_file_pragmas(
    conn: &rusqlite::Connection,
    config: &FileBackendConfig,
) -> EngineResult<()> {
    if let Some(key) = &config.encryption_key {
        if !key.is_empty() {
            // `PRAGMA key` must run before anything touches page data.
            conn.pragma_update(None, "key", key)
                .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;
            conn.pragma_update(None, "kdf_iter", config.kdf_iterations)
                .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;
            conn.pragma_update(None, "cipher_page_size", config.cipher_page_size)
                .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;
            conn.pragma_update(
                None,
                "cipher_use_hmac",
                if config.cipher_use_hmac { "ON" } else { "OFF" },
            )
            .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;
        }
    }

    let journal_mode = if config.enable_wal {
        "WAL"
    } else {
        config.journal_mode.as_str()
    };

    let batch = format!(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = {journal_mode};
        PRAGMA synchronous = {synchronous};
        PRAGMA cache_size = {cache_size};
        PRAGMA temp_store = {temp_store};
        PRAGMA mmap_size = {mmap_size};
        PRAGMA busy_timeout = {busy_timeout};
        PRAGMA auto_vacuum = INCREMENTAL;
        ",
        synchronous = config.synchronous,
        cache_size = config.cache_size,
        temp_store = config.temp_store,
        mmap_size = config.mmap_size,
        busy_timeout = config.busy_timeout_ms,
    );
    conn.execute_batch(&batch)
        .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;

    if !config.enable_wal {
        conn.pragma_update(None, "locking_mode", "EXCLUSIVE")
            .map_err(|e| helixtrack_core::EngineError::init(e.to_string()))?;
    }

    Ok(())
}

/// Apply `verify_wal_mode`-style confirmation, used by pool tests and by
/// operators who want to know WAL actually took effect.
pub fn verify_wal_mode(conn: &rusqlite::Connection) -> EngineResult<bool> {
    let mode: String = conn
        .pragma_query_value(None, "journal_mode", |row| row.get(0))
        .map_err(|e| helixtrack_core::EngineError::backend(e.to_string()))?;
    Ok(mode.eq_ignore_ascii_case("wal"))
}

/// Best-effort session-level `SET` statements for the networked backend
/// (spec §4.C step 5). Failure here is logged but never fatal.
pub fn apply_network_session_settings(client: &mut postgres::Client, config: &NetworkBackendConfig) {
    let statements = [
        format!("SET statement_timeout = {}", config.statement_timeout_ms),
        format!(
            "SET idle_in_transaction_session_timeout = {}",
            config.idle_in_tx_timeout_ms
        ),
        format!(
            "SET jit = {}",
            if config.enable_jit { "on" } else { "off" }
        ),
    ];
    for statement in statements {
        if let Err(e) = client.batch_execute(&statement) {
            tracing::warn!(statement = %statement, error = %e, "best-effort session setting failed");
        }
    }
}

/// Build a libpq-style connection string for the networked backend.
pub fn network_connection_string(config: &NetworkBackendConfig) -> String {
    let mut s = format!(
        "host={} port={} user={} dbname={}",
        config.host, config.port, config.user, config.database
    );
    if let Some(password) = &config.password {
        s.push_str(&format!(" password={password}"));
    }
    s
}
