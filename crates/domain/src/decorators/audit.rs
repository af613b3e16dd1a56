//! Audit logging of dispatched commands.

use std::marker::PhantomData;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::command::{Command, CommandHandler};
use crate::error::ServiceError;

/// Receives one record per audited command.
///
/// Recording is fire-and-forget: sinks must not block and cannot fail the
/// command they observe.
pub trait AuditSink: Send + Sync {
    fn record(&self, command_type: &'static str, payload: &Value);
}

/// Writes audit records as `tracing` events under the `audit` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, command_type: &'static str, payload: &Value) {
        tracing::info!(target: "audit", command_type, payload = %payload, "command received");
    }
}

/// A recorded audit entry.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditEntry {
    pub command_type: &'static str,
    pub payload: Value,
}

/// Keeps audit records in memory.
#[derive(Debug, Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every entry recorded so far.
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the number of entries recorded so far.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl AuditSink for InMemoryAuditSink {
    fn record(&self, command_type: &'static str, payload: &Value) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(AuditEntry {
                command_type,
                payload: payload.clone(),
            });
    }
}

impl<T: AuditSink + ?Sized> AuditSink for std::sync::Arc<T> {
    fn record(&self, command_type: &'static str, payload: &Value) {
        (**self).record(command_type, payload);
    }
}

/// Records every command with an [`AuditSink`] before delegating.
///
/// The inner result is returned untouched, success or failure.
pub struct AuditLoggingDecorator<C, H, A> {
    inner: H,
    sink: A,
    _command: PhantomData<fn(&C)>,
}

impl<C, H, A> AuditLoggingDecorator<C, H, A> {
    pub fn new(inner: H, sink: A) -> Self {
        Self {
            inner,
            sink,
            _command: PhantomData,
        }
    }
}

#[async_trait]
impl<C, H, A> CommandHandler<C> for AuditLoggingDecorator<C, H, A>
where
    C: Command,
    H: CommandHandler<C>,
    A: AuditSink,
{
    async fn handle(&self, command: &C) -> Result<(), ServiceError> {
        match serde_json::to_value(command) {
            Ok(payload) => self.sink.record(C::command_type(), &payload),
            Err(err) => tracing::warn!(
                command = C::command_type(),
                error = %err,
                "command could not be serialized for audit"
            ),
        }

        self.inner.handle(command).await
    }
}
