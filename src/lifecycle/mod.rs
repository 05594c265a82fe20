//! Collaboration lifecycle
//!
//! Everything with behavioural rules lives here: the status and due-date
//! validator, the history log, the invitation dispatcher and the service
//! that ties them to the repository. Other records are plain CRUD.

pub mod collaborations;
pub mod history;
pub mod invitation;
pub mod status;
pub mod validator;

pub use collaborations::{CollaborationService, ManualHistoryRequest};
pub use history::HistoryLog;
pub use invitation::{
    DeliveryReport, InvitationDispatcher, InvitationSummary, InviteOutcome, RespondRequest,
    ScheduleRequest,
};
pub use status::{ActionParty, CollaborationStatus, CollaborationType, HistoryAction};
pub use validator::{
    validate_new, validate_patch, CollaborationKind, CollaborationPatch, NewCollaborationRequest,
    ValidatedCollaboration,
};
