//! Shared fixtures for portal integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use ecole_database::{encode, MemoryStore, Row, Table};
use ecole_portal::entities::{ClassGroup, Exam, Poll, PollOption, PollType, Role, User};
use ecole_portal::test_support::ManualClock;
use ecole_portal::Portal;

pub const ADMIN_EMAIL: &str = "admin@ecole.fr";
pub const RESPONSIBLE_EMAIL: &str = "claire@ecole.fr";
pub const STUDENT_EMAIL: &str = "jean@ecole.fr";

pub struct Harness {
    pub portal: Portal,
    pub store: MemoryStore,
    pub clock: Arc<ManualClock>,
}

pub fn user(id: &str, name: &str, role: Role, email: &str, class_id: Option<&str>) -> User {
    User {
        id: id.into(),
        name: name.into(),
        role,
        email: email.into(),
        class_id: class_id.map(str::to_string),
        avatar: None,
    }
}

pub fn class(id: &str, name: &str) -> ClassGroup {
    ClassGroup {
        id: id.into(),
        name: name.into(),
        description: None,
        contact_email: None,
    }
}

pub fn exam(id: &str, class_id: &str, room: &str) -> Exam {
    Exam {
        id: id.into(),
        subject: "Histoire".into(),
        date: Utc.with_ymd_and_hms(2025, 2, 3, 9, 0, 0).unwrap(),
        duration_minutes: 60,
        room: room.into(),
        notes: None,
        author_id: "r1".into(),
        class_id: class_id.into(),
    }
}

pub fn poll(id: &str, class_id: &str, active: bool) -> Poll {
    Poll {
        id: id.into(),
        question: "Sortie au musée ?".into(),
        poll_type: PollType::Single,
        options: vec![
            PollOption {
                id: "yes".into(),
                label: "Oui".into(),
                voter_ids: vec![],
            },
            PollOption {
                id: "no".into(),
                label: "Non".into(),
                voter_ids: vec![],
            },
        ],
        active,
        created_at: Utc.with_ymd_and_hms(2025, 1, 2, 10, 0, 0).unwrap(),
        is_anonymous: false,
        class_id: class_id.into(),
    }
}

pub fn rows<T: serde::Serialize>(values: &[T]) -> Vec<Row> {
    values.iter().map(|value| encode(value).unwrap()).collect()
}

/// Two classes, an admin, a responsible and two students of ClassA, one
/// student of ClassB, an exam and two polls.
pub async fn seeded_store() -> MemoryStore {
    let store = MemoryStore::new();
    store
        .seed(
            Table::Classes,
            rows(&[class("c1", "ClassA"), class("c2", "ClassB")]),
        )
        .await;
    store
        .seed(
            Table::Users,
            rows(&[
                user("a1", "Alice Admin", Role::Admin, ADMIN_EMAIL, None),
                user("r1", "Claire Martin", Role::Responsible, RESPONSIBLE_EMAIL, Some("c1")),
                user("s1", "Jean Petit", Role::Student, STUDENT_EMAIL, Some("c1")),
                user("s2", "Lina Moreau", Role::Student, "lina@ecole.fr", Some("c1")),
                user("s3", "Hugo Blanc", Role::Student, "hugo@ecole.fr", Some("c2")),
            ]),
        )
        .await;
    store.seed(Table::Exams, rows(&[exam("e1", "c1", "S1")])).await;
    store
        .seed(
            Table::Polls,
            rows(&[poll("p1", "c1", true), poll("p2", "c1", false)]),
        )
        .await;
    store
}

pub async fn harness() -> Harness {
    let store = seeded_store().await;
    let clock = Arc::new(ManualClock::at_school_start());
    let portal = Portal::builder(Arc::new(store.clone()))
        .clock(clock.clone())
        .build();
    Harness {
        portal,
        store,
        clock,
    }
}

/// Harness with `email` signed in and the sign-in toast already expired.
pub async fn signed_in(email: &str) -> Harness {
    let harness = harness().await;
    harness.portal.sign_in(email).await.unwrap();
    harness.clock.advance(Duration::seconds(10));
    harness
}
