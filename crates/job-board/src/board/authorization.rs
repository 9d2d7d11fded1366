use serde::Serialize;

use super::domain::{AccountId, JobPosting, Role};

/// Caller identity as supplied by the session layer. Trusted verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    Authenticated { account_id: AccountId, role: Role },
}

impl Identity {
    pub fn authenticated(account_id: AccountId, role: Role) -> Self {
        Identity::Authenticated { account_id, role }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Identity::Authenticated { .. })
    }

    pub fn account_id(&self) -> Option<&AccountId> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { account_id, .. } => Some(account_id),
        }
    }

    pub fn role(&self) -> Option<Role> {
        match self {
            Identity::Anonymous => None,
            Identity::Authenticated { role, .. } => Some(*role),
        }
    }
}

/// An authenticated caller that passed the gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub account_id: AccountId,
    pub role: Role,
}

/// Mutating operations that must pass the gate.
#[derive(Debug, Clone, Copy)]
pub enum Permission<'a> {
    PostJob,
    Apply,
    DeleteJob(&'a JobPosting),
    ManageApplicants(&'a JobPosting),
}

impl Permission<'_> {
    pub const fn required_role(&self) -> Role {
        match self {
            Permission::Apply => Role::Worker,
            Permission::PostJob | Permission::DeleteJob(_) | Permission::ManageApplicants(_) => {
                Role::Employer
            }
        }
    }

    fn owned_job(&self) -> Option<&JobPosting> {
        match self {
            Permission::DeleteJob(job) | Permission::ManageApplicants(job) => Some(job),
            Permission::PostJob | Permission::Apply => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum ForbiddenReason {
    #[error("action requires the {required} role")]
    WrongRole { required: Role },
    #[error("only the employer who posted this job may do that")]
    NotOwner,
}

/// Tagged gate outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorization {
    Allowed(Actor),
    Unauthenticated,
    Forbidden(ForbiddenReason),
}

/// Single checkpoint run before any lifecycle or posting mutation.
///
/// Ownership is enforced on every employer action that targets an existing job, including
/// reject and remove.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthorizationGate;

impl AuthorizationGate {
    pub fn new() -> Self {
        Self
    }

    /// Authentication and role check only; used before the target job has been loaded.
    pub fn check_role(&self, identity: &Identity, required: Role) -> Authorization {
        match identity {
            Identity::Anonymous => Authorization::Unauthenticated,
            Identity::Authenticated { role, .. } if *role != required => {
                Authorization::Forbidden(ForbiddenReason::WrongRole { required })
            }
            Identity::Authenticated { account_id, role } => Authorization::Allowed(Actor {
                account_id: account_id.clone(),
                role: *role,
            }),
        }
    }

    pub fn check(&self, identity: &Identity, permission: Permission<'_>) -> Authorization {
        let actor = match self.check_role(identity, permission.required_role()) {
            Authorization::Allowed(actor) => actor,
            denied => return denied,
        };

        match permission.owned_job() {
            Some(job) if !job.is_owned_by(&actor.account_id) => {
                Authorization::Forbidden(ForbiddenReason::NotOwner)
            }
            _ => Authorization::Allowed(actor),
        }
    }
}
