use crate::infra::{InMemoryAccountRepository, InMemoryJobRepository, LogNotifier};
use clap::Args;
use job_board::board::{
    AccountId, Identity, JobBoardService, JobDraft, LifecycleChange, SessionStore, SignupForm,
};
use job_board::config::NotificationConfig;
use job_board::error::AppError;
use std::sync::Arc;

type DemoService = JobBoardService<InMemoryJobRepository, InMemoryAccountRepository, LogNotifier>;

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Title of the job the demo employer posts.
    #[arg(long, default_value = "Site mason")]
    pub(crate) title: String,
    /// How many workers apply. The first is accepted, the rest rejected.
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(1..=9))]
    pub(crate) workers: u8,
    /// Leave the accepted worker in place instead of removing them at the end.
    #[arg(long)]
    pub(crate) keep_accepted: bool,
}

impl Default for DemoArgs {
    fn default() -> Self {
        Self {
            title: "Site mason".to_string(),
            workers: 2,
            keep_accepted: false,
        }
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let service = JobBoardService::new(
        Arc::new(InMemoryJobRepository::default()),
        Arc::new(InMemoryAccountRepository::default()),
        Arc::new(LogNotifier::new(NotificationConfig::default())),
        Arc::new(SessionStore::default()),
    );

    println!("Job board demo");
    let employer = enroll(&service, "Demo Contractors", "9000000000", "employer")?;

    let job = service.post_job(
        &employer,
        JobDraft {
            title: args.title.clone(),
            job_time: "8am-5pm".to_string(),
            salary: Some("650/day".to_string()),
            location: "Nagpur".to_string(),
            description: Some("Brick and plaster work for a two-storey build".to_string()),
            contact: "9000000000".to_string(),
        },
    )?;
    println!("Posted '{}' as {}", job.title, job.id());

    let mut workers: Vec<(String, Identity, AccountId)> = Vec::new();
    for index in 1..=args.workers {
        let name = format!("Worker {index}");
        let identity = enroll(&service, &name, &format!("90000000{index:02}"), "worker")?;
        let account = identity
            .account_id()
            .cloned()
            .ok_or(job_board::board::BoardError::Unauthenticated)?;
        print_change(&name, &service.apply(&identity, job.id())?);
        workers.push((name, identity, account));
    }

    for (position, (name, _, account)) in workers.iter().enumerate() {
        let change = if position == 0 {
            service.accept_applicant(&employer, job.id(), account)?
        } else {
            service.reject_applicant(&employer, job.id(), account)?
        };
        print_change(name, &change);
    }

    if !args.keep_accepted {
        if let Some((name, _, account)) = workers.first() {
            print_change(name, &service.remove_applicant(&employer, job.id(), account)?);
        }
    }

    let detail = service.job_detail(&employer, job.id())?;
    println!("\nFinal roster for '{}'", detail.title);
    println!("  Applicants: {}", names(detail.applicants.as_deref()));
    println!("  Accepted:   {}", names(detail.accepted_applicants.as_deref()));
    println!("  Rejected:   {}", names(detail.rejected_applicants.as_deref()));

    for (name, identity, _) in &workers {
        let profile = service.profile(identity)?;
        println!(
            "  {name}: {} accepted, {} rejected",
            profile.accepted_jobs.len(),
            profile.rejected_jobs.len()
        );
    }

    Ok(())
}

fn enroll(
    service: &DemoService,
    name: &str,
    mobile: &str,
    role: &str,
) -> Result<Identity, AppError> {
    let password = format!("{mobile}-demo");
    service.signup(SignupForm {
        name: name.to_string(),
        mobile: mobile.to_string(),
        role: role.to_string(),
        password: password.clone(),
        national_id: format!("DEMO-{mobile}"),
    })?;
    let session = service.login(mobile, &password)?;
    println!("Signed up {} ({}) as {}", name, mobile, session.account.role);
    Ok(service.identity(Some(&session.token)))
}

fn print_change(name: &str, change: &LifecycleChange) {
    let transition = &change.transition;
    let marker = if transition.changed() { "" } else { " (no change)" };
    println!(
        "  {name}: {} {} -> {}{marker}",
        transition.action.label(),
        transition.before.label(),
        transition.after.label()
    );
}

fn names(accounts: Option<&[job_board::board::AccountView]>) -> String {
    let accounts = accounts.unwrap_or_default();
    if accounts.is_empty() {
        return "none".to_string();
    }
    accounts
        .iter()
        .map(|account| account.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
