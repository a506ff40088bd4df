//! Shared types for the portal crate.

pub mod errors;
pub mod requests;

pub use errors::PortalError;
pub use requests::{
    AnnouncementUpdate, ClassUpdate, ExamUpdate, ImportReport, MeetUpdate, NewAnnouncement,
    NewClass, NewExam, NewMeet, NewPoll, NewUser, PollUpdate, ShareRequest, UserUpdate,
};

pub type PortalResult<T> = Result<T, PortalError>;
