//! Job postings, accounts, and the applicant lifecycle that connects them.
//!
//! Every mutation runs through the [`AuthorizationGate`] before it reaches a store, and every
//! change to a posting's applicant sets goes through a single lifecycle transition.

pub mod authorization;
pub mod credentials;
pub mod domain;
pub mod lifecycle;
pub mod repository;
pub mod router;
pub mod service;
pub mod session;
pub mod views;

#[cfg(test)]
mod tests;

pub use authorization::{
    Actor, Authorization, AuthorizationGate, ForbiddenReason, Identity, Permission,
};
pub use domain::{
    Account, AccountId, AccountView, JobDraft, JobId, JobPosting, Role, SignupForm,
    ValidationFailure,
};
pub use lifecycle::{
    ApplicantRoster, LifecycleAction, LifecycleError, LifecycleState, ReferenceSet, Transition,
};
pub use repository::{
    AccountRepository, JobRepository, Notification, NotificationSink, NotifyError,
    RepositoryError,
};
pub use router::board_router;
pub use service::{BoardError, JobBoardService, LifecycleChange, LoginSession, Missing};
pub use session::{SessionStore, SessionToken};
pub use views::{JobView, ProfileView};
