use crate::infra::InMemoryIdentityDirectory;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use practicum::error::AppError;
use practicum::workflows::placement::{
    bearer_credential, ActorRef, AuthError, IdentityResolver, NewUniversityUser, PlacementError,
    UniversityDirectory, UniversityRole,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Account to create. University staff accounts need an administrator; companies and
/// students can be registered by any reviewer.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub(crate) enum AccountRequest {
    University {
        name: String,
        email: String,
        role: UniversityRole,
    },
    Company {
        name: String,
        tax_id: String,
    },
    Student {
        name: String,
        email: String,
    },
}

#[derive(Debug, Serialize)]
pub(crate) struct IssuedAccount {
    pub(crate) actor: ActorRef,
    pub(crate) token: String,
}

pub(crate) fn account_router(directory: Arc<InMemoryIdentityDirectory>) -> Router {
    Router::new()
        .route("/api/v1/accounts", post(register_account_handler))
        .with_state(directory)
}

pub(crate) async fn register_account_handler(
    State(directory): State<Arc<InMemoryIdentityDirectory>>,
    headers: HeaderMap,
    payload: Result<Json<AccountRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<IssuedAccount>), AppError> {
    let credential = bearer_credential(&headers)
        .ok_or(PlacementError::Auth(AuthError::MissingCredential))?;
    let caller = directory
        .resolve(&credential)
        .map_err(PlacementError::from)?;
    let Json(request) =
        payload.map_err(|rejection| PlacementError::Validation(rejection.body_text()))?;

    let actor = register(&directory, &caller, request)?;
    let token = directory
        .issue_token(actor.clone())
        .map_err(PlacementError::from)?;
    info!(kind = actor.kind(), account = %actor, registrar = %caller, "account registered");
    Ok((StatusCode::CREATED, Json(IssuedAccount { actor, token })))
}

fn register(
    directory: &InMemoryIdentityDirectory,
    caller: &ActorRef,
    request: AccountRequest,
) -> Result<ActorRef, PlacementError> {
    let registrar = match caller {
        ActorRef::University { role, .. } if role.can_review() => *role,
        _ => {
            return Err(PlacementError::Forbidden(
                "administrator or coordinator role required",
            ))
        }
    };

    match request {
        AccountRequest::University { name, email, role } => {
            if registrar != UniversityRole::Administrator {
                return Err(PlacementError::Forbidden(
                    "only administrators register university staff",
                ));
            }
            let user = directory.register_university_user(NewUniversityUser {
                name: required(name, "name")?,
                email: required(email, "email")?,
                role,
            })?;
            Ok(ActorRef::University {
                id: user.id,
                role: user.role,
            })
        }
        AccountRequest::Company { name, tax_id } => {
            let company =
                directory.register_company(required(name, "name")?, required(tax_id, "tax_id")?)?;
            Ok(ActorRef::Company { id: company.id })
        }
        AccountRequest::Student { name, email } => {
            let student =
                directory.register_student(required(name, "name")?, required(email, "email")?)?;
            Ok(ActorRef::Student { id: student.id })
        }
    }
}

fn required(value: String, field: &str) -> Result<String, PlacementError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlacementError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}
