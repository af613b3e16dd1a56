//! Transactional document storage.
//!
//! Aggregates are persisted as JSON documents grouped into collections.
//! Mutations are staged in a [`UnitOfWork`] and applied atomically by
//! [`DocumentStore::commit`], with optimistic version checks guarding
//! concurrent writers.

pub mod document;
pub mod error;
pub mod memory;
pub mod postgres;
pub mod store;
pub mod unit_of_work;

pub use common::EntityId;
pub use document::{Change, CommitReceipt, Document, Version};
pub use error::{Result, StorageError, StorageErrorKind};
pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use store::DocumentStore;
pub use unit_of_work::UnitOfWork;
