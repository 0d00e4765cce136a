use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::actor::{ActorRef, AuthError, Credential, IdentityResolver};
use super::application::{Application, ApplicationId};
use super::document::DocumentDescriptor;
use super::projection::{ApplicationView, VacancyView};
use super::repository::{PlacementRepository, RepositoryError};
use super::service::{PlacementApproval, PlacementError, PlacementService, VacancyDraft};
use super::vacancy::{Vacancy, VacancyId};

/// Shared handler state: the lifecycle service plus the credential resolver.
pub struct PlacementState<R> {
    pub service: Arc<PlacementService<R>>,
    pub identity: Arc<dyn IdentityResolver>,
}

impl<R> Clone for PlacementState<R> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            identity: self.identity.clone(),
        }
    }
}

/// Optional free-text body used by every comment-carrying transition. The body itself
/// may be omitted.
#[derive(Debug, Default, Deserialize)]
pub struct CommentRequest {
    #[serde(default)]
    pub comment: Option<String>,
}

impl CommentRequest {
    fn text(&self) -> &str {
        self.comment.as_deref().unwrap_or_default()
    }
}

/// Router builder exposing the vacancy and application lifecycles over HTTP.
pub fn placement_router<R>(
    service: Arc<PlacementService<R>>,
    identity: Arc<dyn IdentityResolver>,
) -> Router
where
    R: PlacementRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/vacancies",
            post(submit_vacancy_handler::<R>).get(open_vacancies_handler::<R>),
        )
        .route(
            "/api/v1/vacancies/pending",
            get(pending_vacancies_handler::<R>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/approve",
            patch(approve_vacancy_handler::<R>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/reject",
            patch(reject_vacancy_handler::<R>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/close",
            patch(close_vacancy_handler::<R>),
        )
        .route(
            "/api/v1/vacancies/:vacancy_id/applications",
            post(apply_handler::<R>),
        )
        .route(
            "/api/v1/companies/me/vacancies",
            get(company_vacancies_handler::<R>),
        )
        .route(
            "/api/v1/companies/me/applications",
            get(company_applications_handler::<R>),
        )
        .route(
            "/api/v1/students/me/applications",
            get(student_applications_handler::<R>),
        )
        .route(
            "/api/v1/applications/pending",
            get(pending_applications_handler::<R>),
        )
        .route("/api/v1/placements", get(placements_handler::<R>))
        .route(
            "/api/v1/applications/:application_id",
            get(dossier_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/company-approve",
            patch(company_approve_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/company-reject",
            patch(company_reject_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/complete",
            patch(company_complete_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/company-cancel",
            patch(company_cancel_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/university-approve",
            patch(university_approve_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/university-reject",
            patch(university_reject_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/university-cancel",
            patch(university_cancel_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/history",
            get(history_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/comments",
            post(comment_handler::<R>),
        )
        .route(
            "/api/v1/applications/:application_id/documents",
            post(attach_document_handler::<R>).get(documents_handler::<R>),
        )
        .with_state(PlacementState { service, identity })
}

/// Token from an `Authorization: Bearer` header, if one is present.
pub fn bearer_credential(headers: &HeaderMap) -> Option<Credential> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    (!token.is_empty()).then(|| Credential(token.to_string()))
}

fn authenticate<R>(
    state: &PlacementState<R>,
    headers: &HeaderMap,
) -> Result<ActorRef, PlacementError> {
    let credential = bearer_credential(headers).ok_or(AuthError::MissingCredential)?;
    Ok(state.identity.resolve(&credential)?)
}

pub(crate) fn error_status(error: &PlacementError) -> StatusCode {
    match error {
        PlacementError::NotFound { .. } | PlacementError::Repository(RepositoryError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        PlacementError::Forbidden(_) => StatusCode::FORBIDDEN,
        PlacementError::InvalidStateTransition(_)
        | PlacementError::InvalidState { .. }
        | PlacementError::Conflict { .. }
        | PlacementError::Repository(
            RepositoryError::Conflict | RepositoryError::StateMismatch { .. },
        ) => StatusCode::CONFLICT,
        PlacementError::Auth(_) => StatusCode::UNAUTHORIZED,
        PlacementError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        PlacementError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

fn respond<T: Serialize>(status: StatusCode, result: Result<T, PlacementError>) -> Response {
    match result {
        Ok(body) => (status, Json(body)).into_response(),
        Err(error) => {
            let payload = json!({ "error": error.to_string() });
            (error_status(&error), Json(payload)).into_response()
        }
    }
}

fn rejection_response(rejection: JsonRejection) -> Response {
    let payload = json!({ "error": rejection.body_text() });
    (rejection.status(), Json(payload)).into_response()
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, Response> {
    payload.map(|Json(body)| body).map_err(rejection_response)
}

// A request without a JSON content type carries no comment.
fn comment_body(
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Result<CommentRequest, Response> {
    match payload {
        Ok(Json(body)) => Ok(body),
        Err(JsonRejection::MissingJsonContentType(_)) => Ok(CommentRequest::default()),
        Err(rejection) => Err(rejection_response(rejection)),
    }
}

fn vacancy_response(result: Result<Vacancy, PlacementError>) -> Response {
    respond(StatusCode::OK, result.map(|vacancy| VacancyView::from(&vacancy)))
}

fn application_response<R, F>(state: &PlacementState<R>, headers: &HeaderMap, op: F) -> Response
where
    R: PlacementRepository + 'static,
    F: FnOnce(&PlacementService<R>, &ActorRef) -> Result<Application, PlacementError>,
{
    let result = authenticate(state, headers)
        .and_then(|actor| op(&state.service, &actor))
        .map(|application| ApplicationView::from(&application));
    respond(StatusCode::OK, result)
}

pub(crate) async fn submit_vacancy_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
    payload: Result<Json<VacancyDraft>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let draft = match json_body(payload) {
        Ok(draft) => draft,
        Err(response) => return response,
    };
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.submit_vacancy(&actor, draft))
        .map(|vacancy| VacancyView::from(&vacancy));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn open_vacancies_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().open_vacancies(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn pending_vacancies_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().pending_vacancies(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn company_vacancies_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().company_vacancies(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn approve_vacancy_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(vacancy_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = VacancyId(vacancy_id);
    vacancy_response(
        authenticate(&state, &headers).and_then(|actor| state.service.approve_vacancy(&actor, &id)),
    )
}

pub(crate) async fn reject_vacancy_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(vacancy_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = VacancyId(vacancy_id);
    vacancy_response(
        authenticate(&state, &headers).and_then(|actor| state.service.reject_vacancy(&actor, &id)),
    )
}

pub(crate) async fn close_vacancy_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(vacancy_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = VacancyId(vacancy_id);
    vacancy_response(
        authenticate(&state, &headers).and_then(|actor| state.service.close_vacancy(&actor, &id)),
    )
}

pub(crate) async fn apply_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(vacancy_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = VacancyId(vacancy_id);
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.apply(&actor, &id))
        .map(|application| ApplicationView::from(&application));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn company_applications_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().company_applications(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn student_applications_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().student_applications(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn pending_applications_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().pending_university_review(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn placements_handler<R>(
    State(state): State<PlacementState<R>>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().placements(&actor));
    respond(StatusCode::OK, result)
}

pub(crate) async fn dossier_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.queries().dossier(&actor, &id));
    respond(StatusCode::OK, result)
}

pub(crate) async fn company_approve_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.company_approve(actor, &id, body.comment.as_deref())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn company_reject_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.company_reject(actor, &id, body.text())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn company_complete_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.company_complete(actor, &id, body.text())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn company_cancel_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.company_cancel(actor, &id, body.text())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn university_approve_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<PlacementApproval>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match json_body(payload) {
        Ok(approval) => application_response(&state, &headers, |service, actor| {
            service.university_approve(actor, &id, approval)
        }),
        Err(response) => response,
    }
}

pub(crate) async fn university_reject_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.university_reject(actor, &id, body.text())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn university_cancel_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    match comment_body(payload) {
        Ok(body) => application_response(&state, &headers, |service, actor| {
            service.university_cancel(actor, &id, body.text())
        }),
        Err(response) => response,
    }
}

pub(crate) async fn history_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.history(&actor, &id))
        .map(|entries| {
            entries
                .iter()
                .map(|entry| entry.view())
                .collect::<Vec<_>>()
        });
    respond(StatusCode::OK, result)
}

pub(crate) async fn comment_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<CommentRequest>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    let body = match comment_body(payload) {
        Ok(body) => body,
        Err(response) => return response,
    };
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.add_comment(&actor, &id, body.text()))
        .map(|entry| entry.view());
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn attach_document_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<DocumentDescriptor>, JsonRejection>,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    let descriptor = match json_body(payload) {
        Ok(descriptor) => descriptor,
        Err(response) => return response,
    };
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.attach_document(&actor, &id, descriptor));
    respond(StatusCode::CREATED, result)
}

pub(crate) async fn documents_handler<R>(
    State(state): State<PlacementState<R>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
) -> Response
where
    R: PlacementRepository + 'static,
{
    let id = ApplicationId(application_id);
    let result = authenticate(&state, &headers)
        .and_then(|actor| state.service.documents(&actor, &id));
    respond(StatusCode::OK, result)
}
