//! Routing of commands and queries to their registered handlers.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::command::{Command, CommandHandler, Query, QueryHandler};
use crate::error::ServiceError;

type Registry = HashMap<TypeId, Box<dyn Any + Send + Sync>>;

/// Resolves requests to handlers by their concrete type.
///
/// The handler table is fixed once built, so a dispatcher can be shared
/// freely between tasks. Dispatching a request type that was never
/// registered yields [`ServiceError::NotRegistered`].
pub struct Dispatcher {
    commands: Registry,
    queries: Registry,
}

impl Dispatcher {
    /// Starts an empty registration table.
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// Returns true if a handler is registered for `C`.
    pub fn handles<C: Command>(&self) -> bool {
        self.commands.contains_key(&TypeId::of::<C>())
    }

    /// Executes a command through its handler chain.
    pub async fn dispatch<C: Command>(&self, command: C) -> Result<(), ServiceError> {
        let command_type = C::command_type();
        let handler = self
            .commands
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn CommandHandler<C>>>())
            .ok_or(ServiceError::NotRegistered {
                request: command_type,
            });

        let result = match handler {
            Ok(handler) => {
                metrics::counter!("commands_dispatched_total", "command" => command_type)
                    .increment(1);
                handler.handle(&command).await
            }
            Err(err) => Err(err),
        };

        if let Err(err) = &result {
            metrics::counter!("commands_failed_total", "command" => command_type).increment(1);
            if err.is_fatal() {
                tracing::error!(command = command_type, error = %err, "command failed");
            } else {
                tracing::info!(command = command_type, reason = %err, "command rejected");
            }
        }

        result
    }

    /// Executes a query through its handler.
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Q::Output, ServiceError> {
        let query_type = Q::query_type();
        let handler = self
            .queries
            .get(&TypeId::of::<Q>())
            .and_then(|entry| entry.downcast_ref::<Arc<dyn QueryHandler<Q>>>())
            .ok_or(ServiceError::NotRegistered {
                request: query_type,
            })
            .inspect_err(|err| tracing::error!(query = query_type, error = %err, "query failed"))?;

        metrics::counter!("queries_dispatched_total", "query" => query_type).increment(1);

        handler
            .handle(&query)
            .await
            .inspect_err(|err| tracing::error!(query = query_type, error = %err, "query failed"))
    }
}

/// Collects handler registrations for a [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    commands: Registry,
    queries: Registry,
}

impl DispatcherBuilder {
    /// Binds `C` to a handler chain, replacing any earlier binding.
    pub fn command<C: Command>(mut self, handler: Arc<dyn CommandHandler<C>>) -> Self {
        if self
            .commands
            .insert(TypeId::of::<C>(), Box::new(handler))
            .is_some()
        {
            tracing::warn!(command = C::command_type(), "command handler replaced");
        }
        self
    }

    /// Binds `Q` to a handler, replacing any earlier binding.
    pub fn query<Q: Query>(mut self, handler: Arc<dyn QueryHandler<Q>>) -> Self {
        if self
            .queries
            .insert(TypeId::of::<Q>(), Box::new(handler))
            .is_some()
        {
            tracing::warn!(query = Q::query_type(), "query handler replaced");
        }
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            commands: self.commands,
            queries: self.queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use common::EntityId;

    use super::*;
    use crate::student::{GetList, StudentError, StudentRow, Unregister};

    #[derive(Default)]
    struct Counting {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CommandHandler<Unregister> for Counting {
        async fn handle(&self, command: &Unregister) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if command.id.as_i64() == 0 {
                Err(StudentError::StudentNotFound(command.id).into())
            } else {
                Ok(())
            }
        }
    }

    struct EmptyList;

    #[async_trait]
    impl QueryHandler<GetList> for EmptyList {
        async fn handle(&self, _: &GetList) -> Result<Vec<StudentRow>, ServiceError> {
            Ok(Vec::new())
        }
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_type() {
        let handler = Arc::new(Counting::default());
        let dispatcher = Dispatcher::builder()
            .command::<Unregister>(handler.clone())
            .build();

        assert!(dispatcher.handles::<Unregister>());
        dispatcher
            .dispatch(Unregister::new(EntityId::new(1)))
            .await
            .unwrap();
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_domain_failure_passes_through() {
        let dispatcher = Dispatcher::builder()
            .command::<Unregister>(Arc::new(Counting::default()))
            .build();

        let err = dispatcher
            .dispatch(Unregister::new(EntityId::new(0)))
            .await
            .unwrap_err();

        assert!(!err.is_fatal());
        assert_eq!(err.to_string(), "No student found for Id 0");
    }

    #[tokio::test]
    async fn test_missing_registration_is_fatal() {
        let dispatcher = Dispatcher::builder().build();

        let err = dispatcher
            .dispatch(Unregister::new(EntityId::new(1)))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::NotRegistered {
                request: "Unregister"
            }
        ));
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_query_dispatch() {
        let dispatcher = Dispatcher::builder()
            .query::<GetList>(Arc::new(EmptyList))
            .build();

        assert!(dispatcher.query(GetList::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_query_is_fatal() {
        let dispatcher = Dispatcher::builder().build();

        let err = dispatcher.query(GetList::all()).await.unwrap_err();
        assert!(err.is_fatal());
    }

    #[tokio::test]
    async fn test_dispatcher_is_shareable_across_tasks() {
        let handler = Arc::new(Counting::default());
        let dispatcher = Arc::new(
            Dispatcher::builder()
                .command::<Unregister>(handler.clone())
                .build(),
        );

        let tasks: Vec<_> = (1..=8)
            .map(|id| {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.dispatch(Unregister::new(EntityId::new(id))).await })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }
        assert_eq!(handler.calls.load(Ordering::SeqCst), 8);
    }
}
