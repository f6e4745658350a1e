//! # helixtrack-core
//!
//! Foundation crate for the HelixTrack storage and collaboration engine.
//! Defines error kinds, the deadline token, backend-neutral row values,
//! typed filters, configuration shapes, and the entity traits that let the
//! repository and optimistic-lock write path stay generic over table
//! shape. Every other crate in the workspace depends on this one.

pub mod config;
pub mod deadline;
pub mod entity;
pub mod error;
pub mod filter;
pub mod value;

pub use config::{BackendConfig, FileBackendConfig, NetworkBackendConfig, PoolConfig};
pub use deadline::Deadline;
pub use entity::{Entity, VersionedEntity};
pub use error::{EngineError, EngineResult, ErrorKind};
pub use filter::{FilterValue, Filters};
pub use value::{Row, Value};
