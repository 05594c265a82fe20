//! Scholarship tracker API
//!
//! REST backend for students tracking scholarship applications, their
//! essays, and the teachers, counselors and mentors who write
//! recommendations or review essays.
//!
//! ## Services
//!
//! - **Records**: owner-scoped CRUD for collaborators, applications and essays
//! - **Collaborations**: lifecycle rules, history log and invitations
//! - **Invitations**: email links the collaborator can open, accept or decline

pub mod auth;
pub mod config;
pub mod db;
pub mod lifecycle;
pub mod mailer;
pub mod model;
pub mod routes;
pub mod server;
pub mod store;
pub mod types;
pub mod util;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, TrackerError};
