//! Command and query contracts.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::ServiceError;

/// Trait for commands: immutable requests describing an intended mutation.
///
/// Commands are serializable so decorators can record them.
pub trait Command: Serialize + Send + Sync + 'static {
    /// Returns the command type name used in logs, metrics and audit records.
    fn command_type() -> &'static str;
}

/// Trait for queries: immutable requests describing a read.
pub trait Query: Send + Sync + 'static {
    /// The value the query produces.
    type Output: Send;

    /// Returns the query type name used in logs and metrics.
    fn query_type() -> &'static str;
}

/// Handles one command type.
///
/// Decorators implement this trait too, so a decorated chain is
/// indistinguishable from a bare handler.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Executes the command.
    async fn handle(&self, command: &C) -> Result<(), ServiceError>;
}

/// Handles one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// Executes the query.
    async fn handle(&self, query: &Q) -> Result<Q::Output, ServiceError>;
}

#[async_trait]
impl<C, H> CommandHandler<C> for Arc<H>
where
    C: Command,
    H: CommandHandler<C> + ?Sized,
{
    async fn handle(&self, command: &C) -> Result<(), ServiceError> {
        (**self).handle(command).await
    }
}

#[async_trait]
impl<Q, H> QueryHandler<Q> for Arc<H>
where
    Q: Query,
    H: QueryHandler<Q> + ?Sized,
{
    async fn handle(&self, query: &Q) -> Result<Q::Output, ServiceError> {
        (**self).handle(query).await
    }
}
