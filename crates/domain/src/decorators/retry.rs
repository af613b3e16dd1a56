//! Retrying commands on transient storage failures.

use std::marker::PhantomData;

use async_trait::async_trait;

use crate::command::{Command, CommandHandler};
use crate::error::ServiceError;

/// Re-runs the inner handler while it fails with a transient storage error.
///
/// Every attempt is a complete invocation of the inner handler, with its own
/// unit of work. When all attempts fail transiently the last error is replaced
/// by [`ServiceError::Unavailable`], which callers treat as an ordinary
/// failure. Domain rejections and permanent storage errors are returned from
/// the first attempt that produces them.
pub struct RetryDecorator<C, H> {
    inner: H,
    max_attempts: u32,
    _command: PhantomData<fn(&C)>,
}

impl<C, H> RetryDecorator<C, H> {
    /// Wraps `inner`, allowing up to `max_attempts` invocations (at least one).
    pub fn new(inner: H, max_attempts: u32) -> Self {
        Self {
            inner,
            max_attempts: max_attempts.max(1),
            _command: PhantomData,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

#[async_trait]
impl<C, H> CommandHandler<C> for RetryDecorator<C, H>
where
    C: Command,
    H: CommandHandler<C>,
{
    async fn handle(&self, command: &C) -> Result<(), ServiceError> {
        let mut attempt = 1;

        loop {
            match self.inner.handle(command).await {
                Err(err) if err.is_transient() => {
                    if attempt >= self.max_attempts {
                        tracing::warn!(
                            command = C::command_type(),
                            attempts = attempt,
                            error = %err,
                            "giving up after transient failures"
                        );
                        return Err(ServiceError::Unavailable { attempts: attempt });
                    }

                    tracing::warn!(
                        command = C::command_type(),
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %err,
                        "transient failure, retrying"
                    );
                    metrics::counter!("command_retries_total", "command" => C::command_type())
                        .increment(1);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
