//! Reference wiring of handlers, decorators and reference data.

use std::sync::Arc;

use document_store::{DocumentStore, UnitOfWork};

use crate::config::DispatcherConfig;
use crate::decorators::{AuditSink, HandlerChain};
use crate::dispatcher::Dispatcher;
use crate::error::ServiceError;
use crate::student::{
    Course, CourseRepository, Disenroll, DisenrollHandler, EditPersonalInfo,
    EditPersonalInfoHandler, Enroll, EnrollHandler, GetList, GetListHandler, Register,
    RegisterHandler, Transfer, TransferHandler, Unregister, UnregisterHandler,
};

/// Builds the dispatcher for every student command and query.
///
/// Register and EditPersonalInfo are audited; every command is retried on
/// transient storage failures, with audit outermost; GetList is undecorated.
pub fn default_dispatcher<S>(
    store: S,
    config: DispatcherConfig,
    audit_sink: Arc<dyn AuditSink>,
) -> Dispatcher
where
    S: DocumentStore + Clone + 'static,
{
    let retries = config.max_retries;

    Dispatcher::builder()
        .command::<Register>(
            HandlerChain::<Register, _>::new(RegisterHandler::new(store.clone()))
                .with_retry(retries)
                .with_audit(audit_sink.clone())
                .build(),
        )
        .command::<EditPersonalInfo>(
            HandlerChain::<EditPersonalInfo, _>::new(EditPersonalInfoHandler::new(store.clone()))
                .with_retry(retries)
                .with_audit(audit_sink)
                .build(),
        )
        .command::<Unregister>(
            HandlerChain::<Unregister, _>::new(UnregisterHandler::new(store.clone()))
                .with_retry(retries)
                .build(),
        )
        .command::<Enroll>(
            HandlerChain::<Enroll, _>::new(EnrollHandler::new(store.clone()))
                .with_retry(retries)
                .build(),
        )
        .command::<Transfer>(
            HandlerChain::<Transfer, _>::new(TransferHandler::new(store.clone()))
                .with_retry(retries)
                .build(),
        )
        .command::<Disenroll>(
            HandlerChain::<Disenroll, _>::new(DisenrollHandler::new(store.clone()))
                .with_retry(retries)
                .build(),
        )
        .query::<GetList>(Arc::new(GetListHandler::new(store)))
        .build()
}

/// Adds catalog courses that are not in the store yet.
///
/// Returns the number of courses inserted.
#[tracing::instrument(skip(store, courses))]
pub async fn seed_courses<S>(store: S, courses: &[Course]) -> Result<usize, ServiceError>
where
    S: DocumentStore + Clone,
{
    let mut uow = UnitOfWork::begin(store);
    for course in courses {
        if CourseRepository::get_by_name(&uow, course.name()).await?.is_none() {
            CourseRepository::add(&mut uow, course)?;
        }
    }

    let inserted = uow.pending();
    uow.commit().await?;
    tracing::info!(inserted, "course catalog seeded");
    Ok(inserted)
}
