use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::authorization::{
    Actor, Authorization, AuthorizationGate, ForbiddenReason, Identity, Permission,
};
use super::credentials::{hash_secret, verify_secret, CredentialError};
use super::domain::{
    Account, AccountId, AccountView, JobDraft, JobId, JobPosting, Role, SignupForm,
    ValidationFailure,
};
use super::lifecycle::{LifecycleAction, LifecycleError, LifecycleState, Transition};
use super::repository::{
    AccountRepository, JobRepository, Notification, NotificationSink, RepositoryError,
};
use super::session::{SessionStore, SessionToken};
use super::views::{JobView, ProfileView};

/// Facade composing the authorization gate, stores, notification sink and sessions.
pub struct JobBoardService<J, A, N> {
    gate: AuthorizationGate,
    jobs: Arc<J>,
    accounts: Arc<A>,
    notifier: Arc<N>,
    sessions: Arc<SessionStore>,
}

/// Outcome of a lifecycle action on one (job, worker) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LifecycleChange {
    pub job_id: JobId,
    pub worker: AccountId,
    pub transition: Transition,
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: SessionToken,
    pub account: AccountView,
}

impl<J, A, N> JobBoardService<J, A, N>
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    pub fn new(
        jobs: Arc<J>,
        accounts: Arc<A>,
        notifier: Arc<N>,
        sessions: Arc<SessionStore>,
    ) -> Self {
        Self {
            gate: AuthorizationGate::new(),
            jobs,
            accounts,
            notifier,
            sessions,
        }
    }

    /// Register a new account. Duplicate mobile numbers re-present the form.
    pub fn signup(&self, form: SignupForm) -> Result<AccountView, BoardError> {
        let validated = form.validate()?;

        if self.accounts.find_by_mobile(&validated.mobile)?.is_some() {
            return Err(ValidationFailure::duplicate_mobile(form.preserved_input()).into());
        }

        let credential = hash_secret(&form.password)?;
        let account = match self.accounts.insert(Account::new(validated, credential)) {
            Ok(account) => account,
            Err(RepositoryError::Conflict) => {
                return Err(ValidationFailure::duplicate_mobile(form.preserved_input()).into())
            }
            Err(err) => return Err(err.into()),
        };

        info!(account_id = %account.id(), role = %account.role(), "account registered");
        Ok(account.view())
    }

    pub fn login(&self, mobile: &str, password: &str) -> Result<LoginSession, BoardError> {
        let account = self
            .accounts
            .find_by_mobile(mobile.trim())?
            .ok_or(BoardError::InvalidCredentials)?;

        if !verify_secret(password, account.credential())? {
            debug!(account_id = %account.id(), "login rejected");
            return Err(BoardError::InvalidCredentials);
        }

        let token = self.sessions.issue(&account);
        info!(account_id = %account.id(), "session opened");
        Ok(LoginSession {
            token,
            account: account.view(),
        })
    }

    pub fn logout(&self, token: &SessionToken) -> bool {
        self.sessions.revoke(token)
    }

    pub fn identity(&self, token: Option<&SessionToken>) -> Identity {
        token.map_or(Identity::Anonymous, |token| self.sessions.resolve(token))
    }

    pub fn post_job(
        &self,
        identity: &Identity,
        draft: JobDraft,
    ) -> Result<JobPosting, BoardError> {
        let actor = allowed(self.gate.check(identity, Permission::PostJob))?;
        let details = draft.validate()?;

        let job = self
            .jobs
            .insert(JobPosting::new(details, actor.account_id, Utc::now()))?;
        info!(job_id = %job.id(), employer = %job.employer(), "job posted");
        Ok(job)
    }

    pub fn delete_job(&self, identity: &Identity, job_id: &JobId) -> Result<(), BoardError> {
        allowed(self.gate.check_role(identity, Role::Employer))?;
        let job = self.load_job(job_id)?;
        allowed(self.gate.check(identity, Permission::DeleteJob(&job)))?;

        match self.jobs.delete(job_id) {
            Ok(()) => {}
            Err(RepositoryError::NotFound) => return Err(Missing::Job(job_id.to_string()).into()),
            Err(err) => return Err(err.into()),
        }
        info!(job_id = %job_id, "job deleted");
        Ok(())
    }

    /// Self-application by the calling worker. Re-applying is a no-op.
    pub fn apply(
        &self,
        identity: &Identity,
        job_id: &JobId,
    ) -> Result<LifecycleChange, BoardError> {
        let actor = allowed(self.gate.check(identity, Permission::Apply))?;
        self.run_transition(job_id, &actor.account_id, LifecycleAction::Apply)
    }

    pub fn accept_applicant(
        &self,
        identity: &Identity,
        job_id: &JobId,
        applicant: &AccountId,
    ) -> Result<LifecycleChange, BoardError> {
        self.manage_applicant(identity, job_id, applicant, LifecycleAction::Accept)
    }

    pub fn reject_applicant(
        &self,
        identity: &Identity,
        job_id: &JobId,
        applicant: &AccountId,
    ) -> Result<LifecycleChange, BoardError> {
        self.manage_applicant(identity, job_id, applicant, LifecycleAction::Reject)
    }

    pub fn remove_applicant(
        &self,
        identity: &Identity,
        job_id: &JobId,
        applicant: &AccountId,
    ) -> Result<LifecycleChange, BoardError> {
        self.manage_applicant(identity, job_id, applicant, LifecycleAction::Remove)
    }

    /// Role-only pre-check for transports that must gate a request before decoding its input.
    pub fn require_role(&self, identity: &Identity, role: Role) -> Result<Actor, BoardError> {
        allowed(self.gate.check_role(identity, role))
    }

    fn manage_applicant(
        &self,
        identity: &Identity,
        job_id: &JobId,
        applicant: &AccountId,
        action: LifecycleAction,
    ) -> Result<LifecycleChange, BoardError> {
        allowed(self.gate.check_role(identity, Role::Employer))?;
        let job = self.load_job(job_id)?;
        allowed(self.gate.check(identity, Permission::ManageApplicants(&job)))?;

        let change = self.run_transition(job_id, applicant, action)?;
        if change.transition.changed()
            && matches!(action, LifecycleAction::Accept | LifecycleAction::Reject)
        {
            self.notify_decision(&job, applicant, change.transition.after);
        }
        Ok(change)
    }

    fn run_transition(
        &self,
        job_id: &JobId,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<LifecycleChange, BoardError> {
        let transition = match self.jobs.transition(job_id, worker, action) {
            Ok(Some(transition)) => transition,
            Ok(None) | Err(RepositoryError::NotFound) => {
                return Err(Missing::Job(job_id.to_string()).into())
            }
            Err(RepositoryError::Lifecycle(LifecycleError::NotAnApplicant(id))) => {
                return Err(Missing::Applicant(id.to_string()).into())
            }
            Err(err) => return Err(err.into()),
        };

        info!(
            job_id = %job_id,
            worker = %worker,
            action = action.label(),
            from = transition.before.label(),
            to = transition.after.label(),
            "applicant lifecycle transition"
        );

        Ok(LifecycleChange {
            job_id: job_id.clone(),
            worker: worker.clone(),
            transition,
        })
    }

    fn notify_decision(&self, job: &JobPosting, worker: &AccountId, state: LifecycleState) {
        let account = match self.accounts.fetch(worker) {
            Ok(Some(account)) => account,
            Ok(None) => return,
            Err(err) => {
                warn!(
                    worker = %worker,
                    error = %err,
                    "notification skipped, account lookup failed"
                );
                return;
            }
        };

        let verdict = match state {
            LifecycleState::Accepted => "accepted",
            LifecycleState::Rejected => "rejected",
            LifecycleState::None | LifecycleState::Applied => return,
        };
        let notification = Notification {
            to: account.mobile().to_string(),
            subject: format!("Application {verdict}"),
            message: format!(
                "Hello {}, your application for '{}' was {verdict}.",
                account.name(),
                job.title
            ),
        };

        if let Err(err) = self.notifier.notify(notification) {
            warn!(worker = %worker, error = %err, "notification dropped");
        }
    }

    fn load_job(&self, job_id: &JobId) -> Result<JobPosting, BoardError> {
        self.jobs
            .fetch(job_id)?
            .ok_or_else(|| Missing::Job(job_id.to_string()).into())
    }

    pub fn list_jobs(&self, identity: &Identity) -> Result<Vec<JobView>, BoardError> {
        let jobs = self.jobs.list()?;
        self.job_views(&jobs, identity)
    }

    pub fn job_detail(&self, identity: &Identity, job_id: &JobId) -> Result<JobView, BoardError> {
        let job = self.load_job(job_id)?;
        let mut views = self.job_views(std::slice::from_ref(&job), identity)?;
        views
            .pop()
            .ok_or_else(|| Missing::Job(job_id.to_string()).into())
    }

    pub fn profile(&self, identity: &Identity) -> Result<ProfileView, BoardError> {
        let (account_id, role) = match identity {
            Identity::Anonymous => return Err(BoardError::Unauthenticated),
            Identity::Authenticated { account_id, role } => (account_id, *role),
        };

        let account = self.accounts.fetch(account_id)?.map(|account| account.view());
        let mut profile = ProfileView {
            account,
            posted_jobs: Vec::new(),
            accepted_jobs: Vec::new(),
            rejected_jobs: Vec::new(),
        };

        match role {
            Role::Employer => {
                let posted = self.jobs.posted_by(account_id)?;
                profile.posted_jobs = self.job_views(&posted, identity)?;
            }
            Role::Worker => {
                let accepted = self.jobs.accepted_for(account_id)?;
                let rejected = self.jobs.rejected_for(account_id)?;
                profile.accepted_jobs = self.job_views(&accepted, identity)?;
                profile.rejected_jobs = self.job_views(&rejected, identity)?;
            }
        }

        Ok(profile)
    }

    fn job_views(
        &self,
        jobs: &[JobPosting],
        identity: &Identity,
    ) -> Result<Vec<JobView>, BoardError> {
        let owns = |job: &JobPosting| identity.account_id().is_some_and(|id| job.is_owned_by(id));

        let mut resolved: HashMap<AccountId, Option<AccountView>> = HashMap::new();
        for job in jobs {
            let applicants = owns(job).then(|| job.roster().applicants().iter());
            for id in std::iter::once(job.employer()).chain(applicants.into_iter().flatten()) {
                if !resolved.contains_key(id) {
                    let view = self.accounts.fetch(id)?.map(|account| account.view());
                    resolved.insert(id.clone(), view);
                }
            }
        }

        let viewer = match identity {
            Identity::Authenticated {
                account_id,
                role: Role::Worker,
            } => Some(account_id),
            _ => None,
        };

        Ok(jobs
            .iter()
            .map(|job| {
                let viewer_state = viewer.map(|id| job.roster().state_of(id));
                JobView::build(
                    job,
                    |id| resolved.get(id).cloned().flatten(),
                    viewer_state,
                    owns(job),
                )
            })
            .collect())
    }
}

fn allowed(authorization: Authorization) -> Result<Actor, BoardError> {
    match authorization {
        Authorization::Allowed(actor) => Ok(actor),
        Authorization::Unauthenticated => Err(BoardError::Unauthenticated),
        Authorization::Forbidden(reason) => {
            debug!(%reason, "authorization gate denied request");
            Err(BoardError::Forbidden(reason))
        }
    }
}

/// Reference that could not be resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Missing {
    Job(String),
    Applicant(String),
}

impl fmt::Display for Missing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Missing::Job(id) => write!(f, "job {id}"),
            Missing::Applicant(id) => write!(f, "applicant {id}"),
        }
    }
}

/// Error raised by the job board service.
#[derive(Debug, thiserror::Error)]
pub enum BoardError {
    #[error("authentication required")]
    Unauthenticated,
    #[error("forbidden: {0}")]
    Forbidden(ForbiddenReason),
    #[error("{0} not found")]
    NotFound(Missing),
    #[error(transparent)]
    Validation(#[from] ValidationFailure),
    #[error("mobile number or password is incorrect")]
    InvalidCredentials,
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Credential(#[from] CredentialError),
}

impl From<Missing> for BoardError {
    fn from(value: Missing) -> Self {
        Self::NotFound(value)
    }
}
