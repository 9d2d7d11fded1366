use job_board::board::{
    Account, AccountId, AccountRepository, JobId, JobPosting, JobRepository, LifecycleAction,
    Notification, NotificationSink, NotifyError, RepositoryError, Transition,
};
use job_board::config::NotificationConfig;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

fn locked<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryJobRepository {
    records: Arc<Mutex<HashMap<JobId, JobPosting>>>,
}

impl InMemoryJobRepository {
    fn collect(&self, keep: impl Fn(&JobPosting) -> bool) -> Vec<JobPosting> {
        let guard = locked(&self.records);
        let mut jobs: Vec<JobPosting> = guard.values().filter(|job| keep(job)).cloned().collect();
        jobs.sort_by(|a, b| b.created_at().cmp(&a.created_at()));
        jobs
    }
}

impl JobRepository for InMemoryJobRepository {
    fn insert(&self, job: JobPosting) -> Result<JobPosting, RepositoryError> {
        let mut guard = locked(&self.records);
        if guard.contains_key(job.id()) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(job.id().clone(), job.clone());
        Ok(job)
    }

    fn fetch(&self, id: &JobId) -> Result<Option<JobPosting>, RepositoryError> {
        Ok(locked(&self.records).get(id).cloned())
    }

    fn delete(&self, id: &JobId) -> Result<(), RepositoryError> {
        locked(&self.records)
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn list(&self) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.collect(|_| true))
    }

    fn posted_by(&self, employer: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.collect(|job| job.is_owned_by(employer)))
    }

    fn accepted_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.collect(|job| job.roster().accepted().contains(worker)))
    }

    fn rejected_for(&self, worker: &AccountId) -> Result<Vec<JobPosting>, RepositoryError> {
        Ok(self.collect(|job| job.roster().rejected().contains(worker)))
    }

    // Runs under the table lock so concurrent decisions on one job serialize.
    fn transition(
        &self,
        id: &JobId,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<Option<Transition>, RepositoryError> {
        let mut guard = locked(&self.records);
        match guard.get_mut(id) {
            Some(job) => Ok(Some(job.transition(worker, action)?)),
            None => Ok(None),
        }
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryAccountRepository {
    records: Arc<Mutex<HashMap<AccountId, Account>>>,
}

impl AccountRepository for InMemoryAccountRepository {
    fn insert(&self, account: Account) -> Result<Account, RepositoryError> {
        let mut guard = locked(&self.records);
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
        Ok(locked(&self.records).get(id).cloned())
    }

    fn find_by_mobile(&self, mobile: &str) -> Result<Option<Account>, RepositoryError> {
        Ok(locked(&self.records)
            .values()
            .find(|account| account.mobile() == mobile)
            .cloned())
    }
}

/// Notification sink that records deliveries in the log. No SMS gateway is wired in, so a
/// configured sender only changes whether the message counts as dispatched.
#[derive(Debug, Clone)]
pub(crate) struct LogNotifier {
    config: NotificationConfig,
}

impl LogNotifier {
    pub(crate) fn new(config: NotificationConfig) -> Self {
        Self { config }
    }
}

impl NotificationSink for LogNotifier {
    fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
        let Some(sender) = self.config.sms_from.as_deref() else {
            info!(
                to = %notification.to,
                subject = %notification.subject,
                "sms not configured, skipped"
            );
            return Err(NotifyError::NotConfigured("sms"));
        };
        info!(
            from = sender,
            to = %notification.to,
            subject = %notification.subject,
            message = %notification.message,
            "sms dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification() -> Notification {
        Notification {
            to: "9811111111".to_string(),
            subject: "Application accepted".to_string(),
            message: "Hello".to_string(),
        }
    }

    #[test]
    fn log_notifier_reports_missing_sender() {
        let notifier = LogNotifier::new(NotificationConfig::default());
        assert!(matches!(
            notifier.notify(notification()),
            Err(NotifyError::NotConfigured("sms"))
        ));
    }

    #[test]
    fn log_notifier_dispatches_when_sender_present() {
        let notifier = LogNotifier::new(NotificationConfig {
            sms_from: Some("+15550001111".to_string()),
        });
        assert!(notifier.notify(notification()).is_ok());
    }

    #[test]
    fn job_repository_reports_missing_job_on_transition() {
        let repository = InMemoryJobRepository::default();
        let outcome = repository
            .transition(&JobId::random(), &AccountId::random(), LifecycleAction::Apply)
            .expect("lookup succeeds");
        assert!(outcome.is_none());
    }
}
