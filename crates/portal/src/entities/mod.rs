//! Domain entities mirrored from the store.

pub mod announcement;
pub mod audit;
pub mod class_group;
pub mod conversation;
pub mod email;
pub mod exam;
pub mod meet;
pub mod notification;
pub mod poll;
pub mod settings;
pub mod user;

pub use announcement::{Announcement, Urgency};
pub use audit::{AuditLogEntry, Severity};
pub use class_group::ClassGroup;
pub use conversation::{AiConversation, ConversationTurn, TurnRole};
pub use email::{ResourceType, SentEmailRecord};
pub use exam::Exam;
pub use meet::Meet;
pub use notification::{Notification, NotificationType, Page};
pub use poll::{Poll, PollOption, PollType};
pub use settings::{AppSetting, SCHOOL_NAME_KEY};
pub use user::{Role, User};

/// Content published into a single class.
pub trait ClassScoped {
    /// Page the content is shown on.
    const PAGE: Page;

    fn class_id(&self) -> &str;
}

impl ClassScoped for Announcement {
    const PAGE: Page = Page::Announcements;

    fn class_id(&self) -> &str {
        &self.class_id
    }
}

impl ClassScoped for Meet {
    const PAGE: Page = Page::Meets;

    fn class_id(&self) -> &str {
        &self.class_id
    }
}

impl ClassScoped for Exam {
    const PAGE: Page = Page::Exams;

    fn class_id(&self) -> &str {
        &self.class_id
    }
}

impl ClassScoped for Poll {
    const PAGE: Page = Page::Polls;

    fn class_id(&self) -> &str {
        &self.class_id
    }
}
