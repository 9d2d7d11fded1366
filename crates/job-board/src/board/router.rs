use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::error;

use super::domain::{AccountId, JobDraft, JobId, Role, SignupForm, ValidationFailure};
use super::repository::{AccountRepository, JobRepository, NotificationSink};
use super::service::{BoardError, JobBoardService, LifecycleChange, Missing};
use super::session::SessionToken;

pub(crate) const JOBS_PATH: &str = "/api/v1/jobs";
pub(crate) const PROFILE_PATH: &str = "/api/v1/profile";
pub(crate) const LOGIN_PATH: &str = "/api/v1/login";

/// Router builder exposing the account, posting and applicant endpoints.
pub fn board_router<J, A, N>(service: Arc<JobBoardService<J, A, N>>) -> Router
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    Router::new()
        .route(
            "/api/v1/jobs",
            get(list_handler::<J, A, N>).post(post_job_handler::<J, A, N>),
        )
        .route("/api/v1/jobs/:job_id", get(detail_handler::<J, A, N>))
        .route(
            "/api/v1/jobs/:job_id/delete",
            post(delete_job_handler::<J, A, N>),
        )
        .route("/api/v1/jobs/:job_id/apply", post(apply_handler::<J, A, N>))
        .route(
            "/api/v1/jobs/:job_id/applicants/:applicant_id/accept",
            post(accept_handler::<J, A, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants/:applicant_id/reject",
            post(reject_handler::<J, A, N>),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants/:applicant_id/remove",
            post(remove_handler::<J, A, N>),
        )
        .route("/api/v1/profile", get(profile_handler::<J, A, N>))
        .route("/api/v1/signup", post(signup_handler::<J, A, N>))
        .route("/api/v1/login", post(login_handler::<J, A, N>))
        .route("/api/v1/logout", post(logout_handler::<J, A, N>))
        .with_state(service)
}

type SharedService<J, A, N> = State<Arc<JobBoardService<J, A, N>>>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct LoginRequest {
    #[serde(default)]
    pub(crate) mobile: String,
    #[serde(default)]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
struct LifecycleResponse {
    job_id: String,
    applicant: String,
    action: &'static str,
    from: &'static str,
    to: &'static str,
    changed: bool,
}

impl From<&LifecycleChange> for LifecycleResponse {
    fn from(change: &LifecycleChange) -> Self {
        Self {
            job_id: change.job_id.to_string(),
            applicant: change.worker.to_string(),
            action: change.transition.action.label(),
            from: change.transition.before.label(),
            to: change.transition.after.label(),
            changed: change.transition.changed(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum EmployerAction {
    Accept,
    Reject,
    Remove,
}

/// Reads `Authorization: Bearer <token>`.
pub(crate) fn session_token(headers: &HeaderMap) -> Option<SessionToken> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(SessionToken(token.to_string()))
    }
}

fn see_other(location: &str, body: serde_json::Value) -> Response {
    (
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location.to_string())],
        Json(body),
    )
        .into_response()
}

pub(crate) fn error_response(err: BoardError) -> Response {
    match err {
        BoardError::Unauthenticated => see_other(LOGIN_PATH, json!({ "error": err.to_string() })),
        BoardError::NotFound(_) => see_other(JOBS_PATH, json!({ "error": err.to_string() })),
        BoardError::Forbidden(reason) => {
            let payload = json!({ "error": err.to_string(), "reason": reason });
            (StatusCode::FORBIDDEN, Json(payload)).into_response()
        }
        BoardError::Validation(failure) => {
            let payload = json!({
                "error": failure.message,
                "fields": failure.fields,
                "old_input": failure.old_input,
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        BoardError::InvalidCredentials => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        BoardError::Repository(_) | BoardError::Credential(_) => {
            error!(error = %err, "request failed");
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
        }
    }
}

/// Decodes a JSON form body. Only runs once the caller has passed the role check, so a body the
/// client got wrong surfaces as a validation failure carrying what was sent, minus `redacted`.
fn decode_form<T>(body: &Bytes, redacted: &[&str]) -> Result<T, BoardError>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }

    let raw: Value = serde_json::from_slice(body).map_err(|err| {
        ValidationFailure::malformed(format!("request body is not valid JSON: {err}"), Value::Null)
    })?;

    serde_json::from_value(raw.clone()).map_err(|err| {
        let mut old_input = raw;
        if let Value::Object(fields) = &mut old_input {
            for key in redacted {
                fields.remove(*key);
            }
        }
        ValidationFailure::malformed(err.to_string(), old_input).into()
    })
}

fn parse_job_id(raw: &str) -> Result<JobId, BoardError> {
    JobId::parse(raw).ok_or_else(|| Missing::Job(raw.to_string()).into())
}

fn parse_applicant_id(raw: &str) -> Result<AccountId, BoardError> {
    AccountId::parse(raw).ok_or_else(|| Missing::Applicant(raw.to_string()).into())
}

pub(crate) async fn list_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    match service.list_jobs(&identity) {
        Ok(jobs) => (StatusCode::OK, Json(jobs)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn detail_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    let result = parse_job_id(&job_id).and_then(|id| service.job_detail(&identity, &id));
    match result {
        Ok(job) => (StatusCode::OK, Json(job)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn profile_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    match service.profile(&identity) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn post_job_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    let result = service
        .require_role(&identity, Role::Employer)
        .and_then(|_| decode_form::<JobDraft>(&body, &[]))
        .and_then(|draft| service.post_job(&identity, draft));
    match result {
        Ok(job) => see_other(JOBS_PATH, json!({ "job_id": job.id() })),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_job_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    let result = service
        .require_role(&identity, Role::Employer)
        .and_then(|_| parse_job_id(&job_id))
        .and_then(|id| {
            service.delete_job(&identity, &id)?;
            Ok(id)
        });
    match result {
        Ok(id) => see_other(JOBS_PATH, json!({ "deleted": id })),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn apply_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    Path(job_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(&headers).as_ref());
    let result = service
        .require_role(&identity, Role::Worker)
        .and_then(|_| parse_job_id(&job_id))
        .and_then(|id| service.apply(&identity, &id));
    match result {
        Ok(change) => {
            let location = format!("{JOBS_PATH}/{}", change.job_id);
            see_other(&location, json!(LifecycleResponse::from(&change)))
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn accept_handler<J, A, N>(
    state: SharedService<J, A, N>,
    Path((job_id, applicant_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    manage(state, &job_id, &applicant_id, &headers, EmployerAction::Accept)
}

pub(crate) async fn reject_handler<J, A, N>(
    state: SharedService<J, A, N>,
    Path((job_id, applicant_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    manage(state, &job_id, &applicant_id, &headers, EmployerAction::Reject)
}

pub(crate) async fn remove_handler<J, A, N>(
    state: SharedService<J, A, N>,
    Path((job_id, applicant_id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    manage(state, &job_id, &applicant_id, &headers, EmployerAction::Remove)
}

fn manage<J, A, N>(
    State(service): SharedService<J, A, N>,
    job_id: &str,
    applicant_id: &str,
    headers: &HeaderMap,
    action: EmployerAction,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let identity = service.identity(session_token(headers).as_ref());
    let result = service
        .require_role(&identity, Role::Employer)
        .and_then(|_| parse_job_id(job_id))
        .and_then(|job| {
            let applicant = parse_applicant_id(applicant_id)?;
            match action {
                EmployerAction::Accept => service.accept_applicant(&identity, &job, &applicant),
                EmployerAction::Reject => service.reject_applicant(&identity, &job, &applicant),
                EmployerAction::Remove => service.remove_applicant(&identity, &job, &applicant),
            }
        });
    match result {
        Ok(change) => see_other(PROFILE_PATH, json!(LifecycleResponse::from(&change))),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn signup_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    body: Bytes,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let result =
        decode_form::<SignupForm>(&body, &["password"]).and_then(|form| service.signup(form));
    match result {
        Ok(account) => see_other(LOGIN_PATH, json!({ "account": account })),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn login_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    body: Bytes,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let result = decode_form::<LoginRequest>(&body, &["password"])
        .and_then(|request| service.login(&request.mobile, &request.password));
    match result {
        Ok(session) => (StatusCode::OK, Json(session)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn logout_handler<J, A, N>(
    State(service): SharedService<J, A, N>,
    headers: HeaderMap,
) -> Response
where
    J: JobRepository + 'static,
    A: AccountRepository + 'static,
    N: NotificationSink + 'static,
{
    let revoked = session_token(&headers)
        .map(|token| service.logout(&token))
        .unwrap_or(false);
    see_other(JOBS_PATH, json!({ "logged_out": revoked }))
}
