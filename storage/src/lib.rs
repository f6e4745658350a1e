//! # helixtrack-storage
//!
//! The Optimized Database Layer: backend driver abstraction, connection
//! pool and pragma configurator, prepared-statement cache, and metrics
//! collector (spec §4.A–§4.D). Exposes a single [`Engine`] type as the
//! library's entry point.

pub mod backend;
pub mod engine;
pub mod metrics;
pub mod pool;
pub mod pragma;
pub mod statement_cache;
pub mod transaction;

pub use backend::{BackendKind, Connection};
pub use engine::Engine;
pub use metrics::MetricsSnapshot;
pub use pool::{ConnectionPool, PoolStats};
pub use transaction::Transaction;
