//! In-memory mirror of the portal's entity collections.

use std::cmp::Ordering;
use std::collections::HashMap;

use ecole_database::Record;

use crate::entities::{
    AiConversation, Announcement, AuditLogEntry, ClassGroup, Exam, Meet, Poll, SentEmailRecord,
    User,
};
use crate::notifications::Notifier;
use crate::pending::PendingQueue;

/// One entity collection: keyed by id, or kept as a sorted sequence.
#[derive(Clone)]
pub enum Collection<T> {
    Keyed(HashMap<String, T>),
    Ordered {
        items: Vec<T>,
        order: fn(&T, &T) -> Ordering,
    },
}

impl<T: Record> Collection<T> {
    pub fn keyed() -> Self {
        Collection::Keyed(HashMap::new())
    }

    pub fn ordered(order: fn(&T, &T) -> Ordering) -> Self {
        Collection::Ordered {
            items: Vec::new(),
            order,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Collection::Keyed(map) => map.len(),
            Collection::Ordered { items, .. } => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: &str) -> Option<&T> {
        match self {
            Collection::Keyed(map) => map.get(id),
            Collection::Ordered { items, .. } => items.iter().find(|item| item.id() == id),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Display-ordered copy; keyed collections come back sorted by id.
    pub fn to_vec(&self) -> Vec<T> {
        match self {
            Collection::Keyed(map) => {
                let mut items: Vec<T> = map.values().cloned().collect();
                items.sort_by(|a, b| a.id().cmp(b.id()));
                items
            }
            Collection::Ordered { items, .. } => items.clone(),
        }
    }

    pub fn replace_all(&mut self, values: Vec<T>) {
        match self {
            Collection::Keyed(map) => {
                *map = values
                    .into_iter()
                    .map(|value| (value.id().to_string(), value))
                    .collect();
            }
            Collection::Ordered { items, order } => {
                *items = values;
                items.sort_by(*order);
            }
        }
    }

    /// Insert, or replace the item with the same id.
    pub fn upsert(&mut self, value: T) {
        match self {
            Collection::Keyed(map) => {
                map.insert(value.id().to_string(), value);
            }
            Collection::Ordered { items, order } => {
                items.retain(|item| item.id() != value.id());
                items.push(value);
                items.sort_by(*order);
            }
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<T> {
        match self {
            Collection::Keyed(map) => map.remove(id),
            Collection::Ordered { items, .. } => {
                let index = items.iter().position(|item| item.id() == id)?;
                Some(items.remove(index))
            }
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Collection::Keyed(map) => f.debug_tuple("Keyed").field(map).finish(),
            Collection::Ordered { items, .. } => f.debug_tuple("Ordered").field(items).finish(),
        }
    }
}

/// Local mutation of one collection.
#[derive(Debug, Clone)]
pub enum Mutation<T> {
    Insert(T),
    Update(T),
    Delete(String),
}

/// Entity types that live in a [`DomainState`] collection.
pub trait Entity: Record {
    /// Human label used in messages.
    const LABEL: &'static str;

    fn collection(state: &DomainState) -> &Collection<Self>;

    fn collection_mut(state: &mut DomainState) -> &mut Collection<Self>;
}

macro_rules! entity_collection {
    ($ty:ty, $field:ident, $label:expr) => {
        impl Entity for $ty {
            const LABEL: &'static str = $label;

            fn collection(state: &DomainState) -> &Collection<Self> {
                &state.$field
            }

            fn collection_mut(state: &mut DomainState) -> &mut Collection<Self> {
                &mut state.$field
            }
        }
    };
}

entity_collection!(ClassGroup, classes, "Classe");
entity_collection!(User, users, "Utilisateur");
entity_collection!(Announcement, announcements, "Annonce");
entity_collection!(Exam, exams, "Examen");
entity_collection!(Meet, meets, "Visio");
entity_collection!(Poll, polls, "Sondage");
entity_collection!(AuditLogEntry, audit_logs, "Journal");
entity_collection!(SentEmailRecord, sent_emails, "E-mail");

/// Every persisted collection the session mirrors.
#[derive(Debug, Clone)]
pub struct DomainState {
    pub classes: Collection<ClassGroup>,
    pub users: Collection<User>,
    pub announcements: Collection<Announcement>,
    pub exams: Collection<Exam>,
    pub meets: Collection<Meet>,
    pub polls: Collection<Poll>,
    pub audit_logs: Collection<AuditLogEntry>,
    pub sent_emails: Collection<SentEmailRecord>,
}

impl Default for DomainState {
    fn default() -> Self {
        Self {
            classes: Collection::keyed(),
            users: Collection::keyed(),
            announcements: Collection::ordered(|a: &Announcement, b| b.date.cmp(&a.date)),
            exams: Collection::ordered(|a: &Exam, b| a.date.cmp(&b.date)),
            meets: Collection::ordered(|a: &Meet, b| a.date.cmp(&b.date)),
            polls: Collection::ordered(|a: &Poll, b| b.created_at.cmp(&a.created_at)),
            audit_logs: Collection::ordered(|a: &AuditLogEntry, b| b.timestamp.cmp(&a.timestamp)),
            sent_emails: Collection::ordered(|a: &SentEmailRecord, b| {
                b.created_at.cmp(&a.created_at)
            }),
        }
    }
}

impl DomainState {
    pub fn get<T: Entity>(&self, id: &str) -> Option<&T> {
        T::collection(self).get(id)
    }

    pub fn all<T: Entity>(&self) -> Vec<T> {
        T::collection(self).to_vec()
    }

    /// Replace a whole collection with freshly loaded values.
    pub fn replace<T: Entity>(&mut self, values: Vec<T>) {
        T::collection_mut(self).replace_all(values);
    }

    /// Apply one local mutation. Updates of unknown ids are ignored.
    pub fn apply<T: Entity>(&mut self, mutation: Mutation<T>) {
        let collection = T::collection_mut(self);
        match mutation {
            Mutation::Insert(value) => collection.upsert(value),
            Mutation::Update(value) => {
                if collection.contains(value.id()) {
                    collection.upsert(value);
                }
            }
            Mutation::Delete(id) => {
                collection.remove(&id);
            }
        }
    }

    pub fn class_name(&self, class_id: &str) -> Option<String> {
        self.classes.get(class_id).map(|class| class.name.clone())
    }

    /// Members of a class, sorted by id.
    pub fn class_members(&self, class_id: &str) -> Vec<User> {
        self.users
            .to_vec()
            .into_iter()
            .filter(|user| user.class_id.as_deref() == Some(class_id))
            .collect()
    }
}

/// Everything the session holds. Guarded by one lock inside the portal.
#[derive(Debug, Clone)]
pub struct AppState {
    pub current_user: Option<User>,
    pub school_name: String,
    pub domain: DomainState,
    pub notifier: Notifier,
    pub pending: PendingQueue,
    pub conversation: Option<AiConversation>,
}

impl AppState {
    pub fn new(school_name: String, notifier: Notifier) -> Self {
        Self {
            current_user: None,
            school_name,
            domain: DomainState::default(),
            notifier,
            pending: PendingQueue::default(),
            conversation: None,
        }
    }
}
