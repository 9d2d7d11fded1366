//! Applicant lifecycle over a job posting's reference sets.
//!
//! Each (job, worker) pair is in exactly one [`LifecycleState`]. All movement between states goes
//! through [`ApplicantRoster::transition`], which computes the complete next roster in one step so
//! a store can persist it as a single update.

use serde::{Deserialize, Serialize};

use super::domain::AccountId;

/// Ordered, duplicate-free set of account references. Insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceSet(Vec<AccountId>);

impl ReferenceSet {
    pub fn contains(&self, id: &AccountId) -> bool {
        self.0.contains(id)
    }

    /// Returns `false` when the id was already present.
    fn insert(&mut self, id: &AccountId) -> bool {
        if self.contains(id) {
            return false;
        }
        self.0.push(id.clone());
        true
    }

    fn remove(&mut self, id: &AccountId) -> bool {
        let before = self.0.len();
        self.0.retain(|member| member != id);
        before != self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AccountId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[AccountId] {
        &self.0
    }

    fn has_duplicates(&self) -> bool {
        self.0
            .iter()
            .enumerate()
            .any(|(idx, id)| self.0[..idx].contains(id))
    }
}

impl FromIterator<AccountId> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = AccountId>>(iter: I) -> Self {
        let mut set = ReferenceSet::default();
        for id in iter {
            set.insert(&id);
        }
        set
    }
}

/// Per-worker state derived from roster membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    None,
    Applied,
    Accepted,
    Rejected,
}

impl LifecycleState {
    pub const fn label(self) -> &'static str {
        match self {
            LifecycleState::None => "none",
            LifecycleState::Applied => "applied",
            LifecycleState::Accepted => "accepted",
            LifecycleState::Rejected => "rejected",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Apply,
    Accept,
    Reject,
    Remove,
}

impl LifecycleAction {
    pub const fn label(self) -> &'static str {
        match self {
            LifecycleAction::Apply => "apply",
            LifecycleAction::Accept => "accept",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Remove => "remove",
        }
    }
}

/// Result of applying an action to a roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transition {
    pub action: LifecycleAction,
    pub before: LifecycleState,
    pub after: LifecycleState,
}

impl Transition {
    pub fn changed(&self) -> bool {
        self.before != self.after
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error("account {0} has not applied to this job")]
    NotAnApplicant(AccountId),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RosterViolation {
    #[error("reference set contains duplicate entries")]
    DuplicateReference,
    #[error("account {0} is both accepted and rejected")]
    AcceptedAndRejected(AccountId),
    #[error("account {0} is decided without having applied")]
    DecidedWithoutApplying(AccountId),
}

/// The three reference sets of a job posting.
///
/// Invariants: `accepted` and `rejected` are disjoint, and both are subsets of `applicants`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RosterSnapshot")]
pub struct ApplicantRoster {
    applicants: ReferenceSet,
    accepted: ReferenceSet,
    rejected: ReferenceSet,
}

#[derive(Deserialize)]
struct RosterSnapshot {
    #[serde(default)]
    applicants: ReferenceSet,
    #[serde(default)]
    accepted: ReferenceSet,
    #[serde(default)]
    rejected: ReferenceSet,
}

impl TryFrom<RosterSnapshot> for ApplicantRoster {
    type Error = RosterViolation;

    fn try_from(snapshot: RosterSnapshot) -> Result<Self, Self::Error> {
        ApplicantRoster::from_sets(snapshot.applicants, snapshot.accepted, snapshot.rejected)
    }
}

impl ApplicantRoster {
    /// Rebuild a roster from stored sets, refusing anything that breaks the invariants.
    pub fn from_sets(
        applicants: ReferenceSet,
        accepted: ReferenceSet,
        rejected: ReferenceSet,
    ) -> Result<Self, RosterViolation> {
        if applicants.has_duplicates() || accepted.has_duplicates() || rejected.has_duplicates() {
            return Err(RosterViolation::DuplicateReference);
        }
        if let Some(both) = accepted.iter().find(|id| rejected.contains(id)) {
            return Err(RosterViolation::AcceptedAndRejected(both.clone()));
        }
        if let Some(orphan) = accepted
            .iter()
            .chain(rejected.iter())
            .find(|id| !applicants.contains(id))
        {
            return Err(RosterViolation::DecidedWithoutApplying(orphan.clone()));
        }

        Ok(Self {
            applicants,
            accepted,
            rejected,
        })
    }

    pub fn applicants(&self) -> &ReferenceSet {
        &self.applicants
    }

    pub fn accepted(&self) -> &ReferenceSet {
        &self.accepted
    }

    pub fn rejected(&self) -> &ReferenceSet {
        &self.rejected
    }

    pub fn state_of(&self, worker: &AccountId) -> LifecycleState {
        if !self.applicants.contains(worker) {
            LifecycleState::None
        } else if self.accepted.contains(worker) {
            LifecycleState::Accepted
        } else if self.rejected.contains(worker) {
            LifecycleState::Rejected
        } else {
            LifecycleState::Applied
        }
    }

    /// Apply `action` for `worker` in place. On error the roster is unchanged.
    pub fn transition(
        &mut self,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<Transition, LifecycleError> {
        let before = self.state_of(worker);

        match action {
            LifecycleAction::Apply => {
                if before == LifecycleState::None {
                    self.applicants.insert(worker);
                }
            }
            LifecycleAction::Accept => {
                if before == LifecycleState::None {
                    return Err(LifecycleError::NotAnApplicant(worker.clone()));
                }
                self.rejected.remove(worker);
                self.accepted.insert(worker);
            }
            LifecycleAction::Reject => {
                if before == LifecycleState::None {
                    return Err(LifecycleError::NotAnApplicant(worker.clone()));
                }
                self.accepted.remove(worker);
                self.rejected.insert(worker);
            }
            LifecycleAction::Remove => {
                self.applicants.remove(worker);
                self.accepted.remove(worker);
                self.rejected.remove(worker);
            }
        }

        Ok(Transition {
            action,
            before,
            after: self.state_of(worker),
        })
    }
}
