//! Shared types for the student roster system.

pub mod types;

pub use types::EntityId;
