//! Integration tests for the student roster.
//!
//! These tests drive the reference dispatcher against the in-memory store,
//! covering the enrollment rules, retry and audit composition, and concurrent
//! writers.

use std::sync::Arc;

use common::EntityId;
use document_store::{InMemoryStore, StorageErrorKind, UnitOfWork};
use domain::student::StudentRepository;
use domain::{
    Course, Disenroll, DispatcherConfig, EditPersonalInfo, Enroll, GetList, Grade,
    InMemoryAuditSink, MAX_ENROLLMENTS, Register, ServiceError, Student, StudentError,
    Transfer, Unregister, default_dispatcher, seed_courses,
};
use futures_util::future::join_all;

struct Harness {
    store: InMemoryStore,
    audit: Arc<InMemoryAuditSink>,
    dispatcher: domain::Dispatcher,
}

/// Helper to create a dispatcher over a store seeded with the default catalog
/// plus Physics.
async fn harness(max_retries: u32) -> Harness {
    let store = InMemoryStore::new();
    let mut catalog = Course::default_catalog();
    catalog.push(Course::new("Physics", 4));
    seed_courses(store.clone(), &catalog).await.unwrap();

    let audit = Arc::new(InMemoryAuditSink::new());
    let dispatcher = default_dispatcher(
        store.clone(),
        DispatcherConfig::new(max_retries),
        audit.clone(),
    );

    Harness {
        store,
        audit,
        dispatcher,
    }
}

async fn load(store: &InMemoryStore, id: i64) -> Option<Student> {
    let uow = UnitOfWork::begin(store.clone());
    StudentRepository::get_by_id(&uow, EntityId::new(id))
        .await
        .unwrap()
}

fn rejection(result: Result<(), ServiceError>) -> StudentError {
    match result {
        Err(ServiceError::Rejected(err)) => err,
        other => panic!("expected a rejection, got {other:?}"),
    }
}

mod scenarios {
    use super::*;

    #[tokio::test]
    async fn register_then_list() {
        let h = harness(3).await;

        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com").with_course1("Physics", "A"))
            .await
            .unwrap();

        let rows = h.dispatcher.query(GetList::all()).await.unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.name, "Ann");
        assert_eq!(row.email, "a@x.com");
        assert_eq!(row.course1.as_deref(), Some("Physics"));
        assert_eq!(row.course1_grade.as_deref(), Some("A"));
        assert_eq!(row.course1_credits, Some(4));
        assert_eq!(row.course2, None);
        assert_eq!(row.course2_grade, None);
    }

    #[tokio::test]
    async fn enroll_with_invalid_grade_changes_nothing() {
        let h = harness(3).await;
        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com").with_course1("Calculus", "B"))
            .await
            .unwrap();

        let result = h
            .dispatcher
            .dispatch(Enroll::new(EntityId::new(1), "Literature", "Z"))
            .await;

        assert_eq!(result.unwrap_err().to_string(), "Grade is incorrect: 'Z'");
        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.enrollment_count(), 1);
        assert_eq!(student.get_enrollment(1).unwrap().course().name(), "Calculus");
    }

    #[tokio::test]
    async fn enroll_with_unknown_course() {
        let h = harness(3).await;
        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap();

        let err = rejection(
            h.dispatcher
                .dispatch(Enroll::new(EntityId::new(1), "History", "A"))
                .await,
        );

        assert_eq!(err.to_string(), "Course is incorrect: 'History'");
    }

    #[tokio::test]
    async fn full_lifecycle() {
        let h = harness(3).await;
        let id = EntityId::new(1);

        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com").with_course1("Calculus", "A"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch(Enroll::new(id, "Chemistry", "B"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch(Transfer::new(id, 2, "Literature", "C"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch(EditPersonalInfo::new(id, "Ann Lee", "ann@x.com"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch(Disenroll::new(id, 1, "schedule clash"))
            .await
            .unwrap();

        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.name(), "Ann Lee");
        assert_eq!(student.email(), "ann@x.com");
        assert!(student.get_enrollment(1).is_none());
        let second = student.get_enrollment(2).unwrap();
        assert_eq!(second.course().name(), "Literature");
        assert_eq!(second.grade(), Grade::C);
        assert_eq!(student.disenrollments().len(), 1);
        assert_eq!(student.disenrollments()[0].course.name(), "Calculus");

        h.dispatcher.dispatch(Unregister::new(id)).await.unwrap();
        assert!(load(&h.store, 1).await.is_none());
        assert!(h.dispatcher.query(GetList::all()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_filters() {
        let h = harness(3).await;
        for cmd in [
            Register::new("Ann", "a@x.com").with_course1("Calculus", "A"),
            Register::new("Bob", "b@x.com")
                .with_course1("Calculus", "B")
                .with_course2("Chemistry", "C"),
            Register::new("Cid", "c@x.com"),
        ] {
            h.dispatcher.dispatch(cmd).await.unwrap();
        }

        let names = |rows: Vec<domain::StudentRow>| -> Vec<String> {
            rows.into_iter().map(|row| row.name).collect()
        };

        let all = h.dispatcher.query(GetList::all()).await.unwrap();
        assert_eq!(names(all), ["Ann", "Bob", "Cid"]);

        let calculus = h
            .dispatcher
            .query(GetList {
                enrolled_in: Some("Calculus".to_string()),
                number_of_courses: None,
            })
            .await
            .unwrap();
        assert_eq!(names(calculus), ["Ann", "Bob"]);

        let two = h
            .dispatcher
            .query(GetList {
                enrolled_in: None,
                number_of_courses: Some(2),
            })
            .await
            .unwrap();
        assert_eq!(names(two), ["Bob"]);

        let none = h
            .dispatcher
            .query(GetList {
                enrolled_in: Some("Physics".to_string()),
                number_of_courses: None,
            })
            .await
            .unwrap();
        assert!(none.is_empty());
    }
}

mod enrollment_rules {
    use super::*;

    async fn full_student(h: &Harness) -> EntityId {
        h.dispatcher
            .dispatch(
                Register::new("Ann", "a@x.com")
                    .with_course1("Calculus", "A")
                    .with_course2("Chemistry", "B"),
            )
            .await
            .unwrap();
        EntityId::new(1)
    }

    #[tokio::test]
    async fn enroll_on_full_student_is_rejected() {
        let h = harness(3).await;
        let id = full_student(&h).await;

        let err = rejection(h.dispatcher.dispatch(Enroll::new(id, "Physics", "A")).await);

        assert_eq!(err, StudentError::CapacityExceeded);
        assert_eq!(err.to_string(), "Cannot have more than 2 enrollments");
        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.get_enrollment(1).unwrap().course().name(), "Calculus");
        assert_eq!(student.get_enrollment(2).unwrap().course().name(), "Chemistry");
    }

    #[tokio::test]
    async fn blank_disenroll_comment_is_rejected() {
        let h = harness(3).await;
        let id = full_student(&h).await;

        let err = rejection(h.dispatcher.dispatch(Disenroll::new(id, 1, "   ")).await);

        assert_eq!(err.to_string(), "Disenrollment comment is required");
        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.enrollment_count(), 2);
        assert!(student.disenrollments().is_empty());
    }

    #[tokio::test]
    async fn transfer_to_missing_enrollment_is_rejected() {
        let h = harness(3).await;
        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com").with_course1("Calculus", "A"))
            .await
            .unwrap();
        let id = EntityId::new(1);

        for number in [2, 3] {
            let err = rejection(
                h.dispatcher
                    .dispatch(Transfer::new(id, number, "Physics", "B"))
                    .await,
            );
            assert_eq!(
                err.to_string(),
                format!("No enrollment found with number '{number}'")
            );
        }

        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.enrollment_count(), 1);
        assert_eq!(student.get_enrollment(1).unwrap().grade(), Grade::A);
    }

    #[tokio::test]
    async fn register_skips_half_specified_enrollment() {
        let h = harness(3).await;
        h.dispatcher
            .dispatch(Register {
                course1: Some("Calculus".to_string()),
                ..Register::new("Ann", "a@x.com")
            })
            .await
            .unwrap();

        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.enrollment_count(), 0);
    }

    #[tokio::test]
    async fn unknown_student_is_rejected_for_every_command() {
        let h = harness(3).await;
        let id = EntityId::new(77);

        let results = [
            h.dispatcher.dispatch(Unregister::new(id)).await,
            h.dispatcher
                .dispatch(EditPersonalInfo::new(id, "Ann", "a@x.com"))
                .await,
            h.dispatcher.dispatch(Enroll::new(id, "Calculus", "A")).await,
            h.dispatcher
                .dispatch(Transfer::new(id, 1, "Calculus", "A"))
                .await,
            h.dispatcher.dispatch(Disenroll::new(id, 1, "gone")).await,
        ];

        for result in results {
            assert_eq!(rejection(result), StudentError::StudentNotFound(id));
        }
    }
}

mod retry_and_audit {
    use super::*;

    #[tokio::test]
    async fn transient_failures_are_retried_until_success() {
        let h = harness(3).await;
        h.store.fail_next_commits(2, StorageErrorKind::Transient).await;
        let before = h.store.commit_attempts().await;

        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap();

        assert_eq!(h.store.commit_attempts().await - before, 3);
        assert!(load(&h.store, 1).await.is_some());
        assert_eq!(h.audit.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_become_a_normal_failure() {
        let h = harness(3).await;
        h.store.fail_next_commits(3, StorageErrorKind::Transient).await;
        let before = h.store.commit_attempts().await;

        let err = h
            .dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap_err();

        assert!(!err.is_fatal());
        assert_eq!(
            err.to_string(),
            "Storage is unavailable after 3 attempts, please try again later"
        );
        assert_eq!(h.store.commit_attempts().await - before, 3);
        assert_eq!(h.audit.len(), 1);
        assert!(load(&h.store, 1).await.is_none());
    }

    #[tokio::test]
    async fn permanent_failures_are_fatal_and_not_retried() {
        let h = harness(3).await;
        h.store.fail_next_commits(3, StorageErrorKind::Permanent).await;
        let before = h.store.commit_attempts().await;

        let err = h
            .dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap_err();

        assert!(err.is_fatal());
        assert!(matches!(err, ServiceError::Storage(_)));
        assert_eq!(h.store.commit_attempts().await - before, 1);
    }

    #[tokio::test]
    async fn audit_covers_register_and_edit_only() {
        let h = harness(3).await;
        let id = EntityId::new(1);

        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap();
        h.dispatcher
            .dispatch(Enroll::new(id, "Calculus", "A"))
            .await
            .unwrap();
        let _ = h.dispatcher.dispatch(EditPersonalInfo::new(id, "", "x")).await;

        let types: Vec<_> = h
            .audit
            .entries()
            .into_iter()
            .map(|entry| entry.command_type)
            .collect();
        assert_eq!(types, ["Register", "EditPersonalInfo"]);
        assert_eq!(h.audit.entries()[0].payload["name"], "Ann");
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_enrolls_never_exceed_capacity() {
        let h = harness(10).await;
        h.dispatcher
            .dispatch(Register::new("Ann", "a@x.com"))
            .await
            .unwrap();
        let id = EntityId::new(1);

        let courses = ["Calculus", "Chemistry", "Literature", "Physics", "Composition"];
        let results = join_all(
            courses
                .iter()
                .map(|course| h.dispatcher.dispatch(Enroll::new(id, *course, "B"))),
        )
        .await;

        let succeeded = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(succeeded, MAX_ENROLLMENTS);
        for result in results.into_iter().filter(Result::is_err) {
            assert_eq!(rejection(result), StudentError::CapacityExceeded);
        }

        let student = load(&h.store, 1).await.unwrap();
        assert_eq!(student.enrollment_count(), MAX_ENROLLMENTS);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn parallel_registrations_get_distinct_ids() {
        let h = Arc::new(harness(3).await);

        let tasks: Vec<_> = (0..20)
            .map(|n| {
                let h = h.clone();
                tokio::spawn(async move {
                    h.dispatcher
                        .dispatch(Register::new(format!("Student {n}"), "s@x.com"))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let rows = h.dispatcher.query(GetList::all()).await.unwrap();
        assert_eq!(rows.len(), 20);
        let ids: Vec<i64> = rows.iter().map(|row| row.id.as_i64()).collect();
        assert_eq!(ids, (1..=20).collect::<Vec<_>>());
        assert_eq!(h.audit.len(), 20);
    }
}
