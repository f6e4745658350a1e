//! # helixtrack-collab
//!
//! The parallel-edit engine: a generic repository over [`helixtrack_core::Entity`],
//! the optimistic-lock write path, the history recorder, and the entity-lock
//! registry (spec components E-H). Also ships the `Ticket` entity used to
//! exercise and test the generic machinery.

pub mod history;
pub mod locks;
pub mod repository;
pub mod schema;
pub mod special_ops;
pub mod ticket;

pub use history::{HistoryAction, HistoryRow};
pub use locks::{EntityLock, EntityLockRegistry, LockType};
pub use repository::Repository;
pub use ticket::Ticket;
