use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::{ApplicantRoster, LifecycleAction, LifecycleError, Transition};

/// Identifier wrapper for registered accounts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub Uuid);

impl AccountId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse an identifier taken from a path segment.
    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier wrapper for job postings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Uuid::parse_str(raw.trim()).ok().map(Self)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Which side of the board an account acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Worker,
    Employer,
}

impl Role {
    pub const fn label(self) -> &'static str {
        match self {
            Role::Worker => "worker",
            Role::Employer => "employer",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "worker" => Ok(Role::Worker),
            "employer" => Ok(Role::Employer),
            other => Err(UnknownRole(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role '{0}', expected worker or employer")]
pub struct UnknownRole(pub String);

/// A registered person. The role is fixed at signup and has no setter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    id: AccountId,
    name: String,
    mobile: String,
    role: Role,
    credential: String,
    national_id: String,
}

impl Account {
    /// Build an account from a validated signup and an already hashed credential.
    pub fn new(signup: ValidatedSignup, credential: String) -> Self {
        Self {
            id: AccountId::random(),
            name: signup.name,
            mobile: signup.mobile,
            role: signup.role,
            credential,
            national_id: signup.national_id,
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn credential(&self) -> &str {
        &self.credential
    }

    pub fn national_id(&self) -> &str {
        &self.national_id
    }

    pub fn view(&self) -> AccountView {
        AccountView {
            id: self.id.clone(),
            name: self.name.clone(),
            mobile: self.mobile.clone(),
            role: self.role,
        }
    }
}

/// Public projection of an account; never carries the credential or national id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountView {
    pub id: AccountId,
    pub name: String,
    pub mobile: String,
    pub role: Role,
}

/// Raw signup input as submitted by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub national_id: String,
}

/// Signup input that passed field validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignup {
    pub name: String,
    pub mobile: String,
    pub role: Role,
    pub national_id: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<ValidatedSignup, ValidationFailure> {
        let mut missing = Vec::new();
        for (field, value) in [
            ("name", &self.name),
            ("mobile", &self.mobile),
            ("role", &self.role),
            ("password", &self.password),
            ("national_id", &self.national_id),
        ] {
            if value.trim().is_empty() {
                missing.push(field);
            }
        }
        if !missing.is_empty() {
            return Err(ValidationFailure::missing(missing, self.preserved_input()));
        }

        let role = self.role.parse::<Role>().map_err(|err| ValidationFailure {
            fields: vec!["role"],
            message: err.to_string(),
            old_input: self.preserved_input(),
        })?;

        Ok(ValidatedSignup {
            name: self.name.trim().to_string(),
            mobile: self.mobile.trim().to_string(),
            role,
            national_id: self.national_id.trim().to_string(),
        })
    }

    /// Input echoed back to the form. The password is never preserved.
    pub fn preserved_input(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "mobile": self.mobile,
            "role": self.role,
            "national_id": self.national_id,
        })
    }
}

/// Raw job posting input as submitted by an employer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub job_time: String,
    #[serde(default)]
    pub salary: Option<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub contact: String,
}

/// Job details that passed validation and are ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedJob {
    pub title: String,
    pub job_time: String,
    pub salary: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub contact: String,
}

impl JobDraft {
    pub fn validate(&self) -> Result<ValidatedJob, ValidationFailure> {
        let missing: Vec<&'static str> = [
            ("title", &self.title),
            ("job_time", &self.job_time),
            ("location", &self.location),
            ("contact", &self.contact),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(field, _)| field)
        .collect();

        if !missing.is_empty() {
            let old_input = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
            return Err(ValidationFailure::missing(missing, old_input));
        }

        Ok(ValidatedJob {
            title: self.title.trim().to_string(),
            job_time: self.job_time.trim().to_string(),
            salary: non_empty(self.salary.as_deref()),
            location: self.location.trim().to_string(),
            description: non_empty(self.description.as_deref()),
            contact: self.contact.trim().to_string(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Rejected form input, carrying what the client sent so the form can be re-presented.
#[derive(Debug, Clone, PartialEq, Serialize, thiserror::Error)]
#[error("{message}")]
pub struct ValidationFailure {
    pub fields: Vec<&'static str>,
    pub message: String,
    pub old_input: serde_json::Value,
}

impl ValidationFailure {
    fn missing(fields: Vec<&'static str>, old_input: serde_json::Value) -> Self {
        let message = format!("missing required fields: {}", fields.join(", "));
        Self {
            fields,
            message,
            old_input,
        }
    }

    /// Input that could not be read as the expected form at all.
    pub fn malformed(message: String, old_input: serde_json::Value) -> Self {
        Self {
            fields: Vec::new(),
            message,
            old_input,
        }
    }

    pub fn duplicate_mobile(old_input: serde_json::Value) -> Self {
        Self {
            fields: vec!["mobile"],
            message: "mobile number is already registered".to_string(),
            old_input,
        }
    }
}

/// A job listing owned by exactly one employer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPosting {
    id: JobId,
    pub title: String,
    pub job_time: String,
    pub salary: Option<String>,
    pub location: String,
    pub description: Option<String>,
    pub contact: String,
    employer: AccountId,
    roster: ApplicantRoster,
    created_at: DateTime<Utc>,
}

impl JobPosting {
    pub fn new(details: ValidatedJob, employer: AccountId, created_at: DateTime<Utc>) -> Self {
        Self {
            id: JobId::random(),
            title: details.title,
            job_time: details.job_time,
            salary: details.salary,
            location: details.location,
            description: details.description,
            contact: details.contact,
            employer,
            roster: ApplicantRoster::default(),
            created_at,
        }
    }

    pub fn id(&self) -> &JobId {
        &self.id
    }

    pub fn employer(&self) -> &AccountId {
        &self.employer
    }

    pub fn is_owned_by(&self, account: &AccountId) -> bool {
        &self.employer == account
    }

    pub fn roster(&self) -> &ApplicantRoster {
        &self.roster
    }

    /// Move `worker` through the lifecycle. Stores call this inside their single update.
    pub fn transition(
        &mut self,
        worker: &AccountId,
        action: LifecycleAction,
    ) -> Result<Transition, LifecycleError> {
        self.roster.transition(worker, action)
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
