use chrono::{DateTime, Utc};
use serde::Serialize;

use super::domain::{AccountId, AccountView, JobId, JobPosting};
use super::lifecycle::{LifecycleState, ReferenceSet};

/// A job with its account references resolved for display.
#[derive(Debug, Clone, Serialize)]
pub struct JobView {
    pub id: JobId,
    pub title: String,
    pub job_time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salary: Option<String>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub contact: String,
    pub created_at: DateTime<Utc>,
    pub employer: Option<AccountView>,
    /// Applicant lists are only filled in for the employer who owns the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applicants: Option<Vec<AccountView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accepted_applicants: Option<Vec<AccountView>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected_applicants: Option<Vec<AccountView>>,
    /// Lifecycle state of the requesting worker, when there is one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_state: Option<LifecycleState>,
}

impl JobView {
    pub(crate) fn build(
        job: &JobPosting,
        resolve: impl Fn(&AccountId) -> Option<AccountView>,
        viewer_state: Option<LifecycleState>,
        show_roster: bool,
    ) -> Self {
        let roster = job.roster();
        let resolve_all = |set: &ReferenceSet| {
            show_roster.then(|| set.iter().filter_map(&resolve).collect::<Vec<_>>())
        };
        Self {
            id: job.id().clone(),
            title: job.title.clone(),
            job_time: job.job_time.clone(),
            salary: job.salary.clone(),
            location: job.location.clone(),
            description: job.description.clone(),
            contact: job.contact.clone(),
            created_at: job.created_at(),
            employer: resolve(job.employer()),
            applicants: resolve_all(roster.applicants()),
            accepted_applicants: resolve_all(roster.accepted()),
            rejected_applicants: resolve_all(roster.rejected()),
            viewer_state,
        }
    }
}

/// Per-account dashboard: employers see their postings, workers see their decisions.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub account: Option<AccountView>,
    pub posted_jobs: Vec<JobView>,
    pub accepted_jobs: Vec<JobView>,
    pub rejected_jobs: Vec<JobView>,
}
