use serde::{Deserialize, Serialize};

use super::domain::{Account, AccountId, JobId, JobPosting};
use super::lifecycle::{LifecycleAction, LifecycleError, Transition};

/// Storage abstraction for job postings.
///
/// `transition` must apply the lifecycle step and persist the resulting roster as one update so
/// concurrent callers never observe or write a half-swapped roster.
pub trait JobRepository: Send + Sync {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError>;
    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError>;
    fn delete(&self, id: &JobId) -> Result<(), RepositoryError>;
    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError>;
    fn posted_by(&self, employer: &AccountId) -> Result<Vec<JobPosting>, RepositoryError>;
    fn accepted_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError>;
    fn rejected_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError>;

    /// Returns `Ok(None)` when the job no longer exists. A refused step leaves the job untouched
    /// and surfaces as [`RepositoryError::Lifecycle`].
    fn transition(
        &self,
        id: &JobId,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<Option<Transition>, RepositoryError>;
}

/// Storage abstraction for accounts. Mobile numbers are unique across all accounts.
pub trait AccountRepository: Send + Sync {
    fn insert(&self, account: Account) -> Result<Account, RepositoryError>;
    fn fetch(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError>;
    fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepositoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Outbound SMS hook. Delivery is best effort.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub to: String,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("notification channel not configured: {0}")]
    NotConfigured(&'static str),
    #[error("notification transport unavailable: {0}")]
    Transport(String),
}
