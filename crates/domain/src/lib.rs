//! Domain layer for the student roster.
//!
//! This crate provides:
//! - the Student aggregate with its Course and Grade value objects
//! - command and query contracts with one handler per request type
//! - audit and retry decorators composed around handlers
//! - a dispatcher routing requests to their handler chains
//! - the reference composition wiring all of the above

pub mod command;
pub mod config;
pub mod decorators;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod student;

pub use command::{Command, CommandHandler, Query, QueryHandler};
pub use config::{DEFAULT_MAX_RETRIES, DispatcherConfig};
pub use decorators::{
    AuditEntry, AuditLoggingDecorator, AuditSink, HandlerChain, InMemoryAuditSink,
    RetryDecorator, TracingAuditSink,
};
pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use error::ServiceError;
pub use registry::{default_dispatcher, seed_courses};
pub use student::{
    Course, Disenroll, Disenrollment, EditPersonalInfo, Enroll, Enrollment, GetList, Grade,
    MAX_ENROLLMENTS, Register, Student, StudentError, StudentRow, Transfer, Unregister,
};
