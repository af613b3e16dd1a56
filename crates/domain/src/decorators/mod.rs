//! Cross-cutting wrappers around command handlers.
//!
//! Decorators implement [`CommandHandler`] themselves, so a chain of any depth
//! looks like a single handler to the dispatcher. Chains are assembled inside
//! out with [`HandlerChain`]: each `with_*` call wraps everything added so far.

mod audit;
mod retry;

pub use audit::{AuditEntry, AuditLoggingDecorator, AuditSink, InMemoryAuditSink, TracingAuditSink};
pub use retry::RetryDecorator;

use std::marker::PhantomData;
use std::sync::Arc;

use crate::command::{Command, CommandHandler};

/// Builder for a decorated command handler.
///
/// ```ignore
/// // audit(retry(base))
/// let handler = HandlerChain::new(base).with_retry(3).with_audit(sink).build();
/// ```
pub struct HandlerChain<C, H> {
    handler: H,
    _command: PhantomData<fn(&C)>,
}

impl<C, H> HandlerChain<C, H>
where
    C: Command,
    H: CommandHandler<C> + 'static,
{
    /// Starts a chain from the business handler.
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            _command: PhantomData,
        }
    }

    /// Wraps the chain in a [`RetryDecorator`].
    pub fn with_retry(self, max_attempts: u32) -> HandlerChain<C, RetryDecorator<C, H>> {
        HandlerChain::new(RetryDecorator::new(self.handler, max_attempts))
    }

    /// Wraps the chain in an [`AuditLoggingDecorator`].
    pub fn with_audit<A>(self, sink: A) -> HandlerChain<C, AuditLoggingDecorator<C, H, A>>
    where
        A: AuditSink + 'static,
    {
        HandlerChain::new(AuditLoggingDecorator::new(self.handler, sink))
    }

    /// Finishes the chain.
    pub fn build(self) -> Arc<dyn CommandHandler<C>> {
        Arc::new(self.handler)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use common::EntityId;
    use document_store::{StorageError, Version};

    use super::*;
    use crate::error::ServiceError;
    use crate::student::Register;

    #[derive(Default)]
    struct AlwaysTransient {
        calls: AtomicU32,
    }

    #[async_trait]
    impl CommandHandler<Register> for AlwaysTransient {
        async fn handle(&self, _: &Register) -> Result<(), ServiceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::ConcurrencyConflict {
                collection: "students".to_string(),
                id: EntityId::new(1),
                expected: Version::new(1),
                actual: Version::new(2),
            }
            .into())
        }
    }

    #[tokio::test]
    async fn test_audit_outside_retry_records_once() {
        let base = Arc::new(AlwaysTransient::default());
        let sink = Arc::new(InMemoryAuditSink::new());

        let handler = HandlerChain::<Register, _>::new(base.clone())
            .with_retry(3)
            .with_audit(sink.clone())
            .build();

        let result = handler.handle(&Register::new("Ann", "a@x.com")).await;

        assert!(matches!(result, Err(ServiceError::Unavailable { attempts: 3 })));
        assert_eq!(base.calls.load(Ordering::SeqCst), 3);
        assert_eq!(sink.len(), 1);
    }
}
