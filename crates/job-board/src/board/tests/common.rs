use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use serde_json::Value;

use crate::board::domain::{Account, AccountId, JobDraft, JobId, JobPosting, SignupForm};
use crate::board::lifecycle::{LifecycleAction, Transition};
use crate::board::repository::{
    AccountRepository, JobRepository, Notification, NotificationSink, NotifyError,
    RepositoryError,
};
use crate::board::{board_router, Identity, JobBoardService, SessionStore};

pub(super) type TestService = JobBoardService<MemoryJobs, MemoryAccounts, MemoryNotifier>;

pub(super) struct Harness {
    pub(super) service: Arc<TestService>,
    pub(super) jobs: Arc<MemoryJobs>,
    pub(super) notifier: Arc<MemoryNotifier>,
}

pub(super) fn build_service() -> Harness {
    let jobs = Arc::new(MemoryJobs::default());
    let accounts = Arc::new(MemoryAccounts::default());
    let notifier = Arc::new(MemoryNotifier::default());
    let service = Arc::new(JobBoardService::new(
        jobs.clone(),
        accounts,
        notifier.clone(),
        Arc::new(SessionStore::default()),
    ));
    Harness {
        service,
        jobs,
        notifier,
    }
}

pub(super) fn signup_form(name: &str, mobile: &str, role: &str) -> SignupForm {
    SignupForm {
        name: name.to_string(),
        mobile: mobile.to_string(),
        role: role.to_string(),
        password: format!("{mobile}-pass"),
        national_id: format!("NID-{mobile}"),
    }
}

pub(super) fn job_draft(title: &str) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        job_time: "8 hours".to_string(),
        salary: Some("600/day".to_string()),
        location: "Indore".to_string(),
        description: Some("Site work".to_string()),
        contact: "9000000001".to_string(),
    }
}

/// Registers an account and returns the identity a session for it would resolve to.
pub(super) fn register(service: &TestService, name: &str, mobile: &str, role: &str) -> Identity {
    let view = service
        .signup(signup_form(name, mobile, role))
        .expect("signup succeeds");
    Identity::authenticated(view.id, view.role)
}

pub(super) fn account_of(identity: &Identity) -> AccountId {
    identity.account_id().cloned().expect("authenticated identity")
}

pub(super) fn post(service: &TestService, employer: &Identity, title: &str) -> JobPosting {
    service
        .post_job(employer, job_draft(title))
        .expect("job posts")
}

#[derive(Default)]
pub(super) struct MemoryJobs {
    pub(super) records: Mutex<HashMap<JobId, JobPosting>>,
}

impl MemoryJobs {
    pub(super) fn snapshot(&self, id: &JobId) -> Option<JobPosting> {
        self.records.lock().expect("jobs mutex poisoned").get(id).cloned()
    }

    fn filtered(&self, keep: impl Fn(&JobPosting) -> bool) -> Vec<JobPosting> {
        let guard = self.records.lock().expect("jobs mutex poisoned");
        let mut jobs: Vec<JobPosting> = guard.values().filter(|job| keep(job)).cloned().collect();
        jobs.sort_by_key(|job| job.created_at());
        jobs
    }
}

impl JobRepository for MemoryJobs {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = self.records.lock().expect("jobs mutex poisoned");
        if guard.contains_key(job.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id().clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(self.snapshot(id))
    }

    fn delete(&self, id: &JobId) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("jobs mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.filtered(|_| true))
    }

    fn posted_by(&self, employer: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.filtered(|job| job.is_owned_by(employer)))
    }

    fn accepted_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.filtered(|job| job.roster().accepted().contains(worker)))
    }

    fn rejected_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.filtered(|job| job.roster().rejected().contains(worker)))
    }

    fn transition(
        &self,
        id: &JobId,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<Option<Transition>, RepositoryError> {
        let mut guard = self.records.lock().expect("jobs mutex poisoned");
        match guard.get_mut(id) {
            Some(job) => Ok(Some(job.transition(worker, action)?)),
            None => Ok(None),
        }
    }
}

#[derive(Default)]
pub(super) struct MemoryAccounts {
    records: Mutex<HashMap<AccountId, Account>>,
}

impl AccountRepository for MemoryAccounts {
    fn insert(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut guard = self.records.lock().expect("accounts mutex poisoned");
        if guard
            .values()
            .any(|existing| existing.mobile() == account.mobile())
        {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(account.id().clone(), account.clone());
        Ok(account)
    }

    fn fetch(&self, id: &AccountId) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("accounts mutex poisoned")
            .get(id)
            .cloned())
    }

    fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(self
            .records
            .lock()
            .expect("accounts mutex poisoned")
            .values()
            .find(|account| account.mobile() == mobile)
            .cloned())
    }
}

#[derive(Default)]
pub(super) struct MemoryNotifier {
    events: Mutex<Vec<Notification>>,
}

impl MemoryNotifier {
    pub(super) fn events(&self) -> Vec<Notification> {
        self.events.lock().expect("notifier mutex poisoned").clone()
    }
}

impl NotificationSink for MemoryNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        self.events
            .lock()
            .expect("notifier mutex poisoned")
            .push(notification);
        Ok(())
    }
}

pub(super) struct FailingNotifier;

impl NotificationSink for FailingNotifier {
    fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
        Err(NotifyError::Transport("sms gateway offline".to_string()))
    }
}

pub(super) struct UnavailableJobs;

impl JobRepository for UnavailableJobs {
    fn insert(&self, _job: JobPosting) -> Result<JobPosting, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn delete(&self, _id: &JobId) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn posted_by(&self, _employer: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn accepted_for(&self, _worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn rejected_for(&self, _worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn transition(
        &self,
        _id: &JobId,
        _worker: &AccountId,
        _action: LifecycleAction,
    ) -> Result<Option<Transition>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) fn router_with(harness: &Harness) -> axum::Router {
    board_router(harness.service.clone())
}
