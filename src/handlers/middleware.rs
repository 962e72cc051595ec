//! Bearer token gate for the role-scoped route groups.
//!
//! Extracts `Authorization: Bearer <token>`, authenticates it, checks the
//! caller's role and injects `AuthenticatedActor` into request extensions.

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::{bearer_token, AppState};
use crate::db::models::Role;
use crate::error::ClinicError;
use crate::store::ClinicStore;

pub async fn require_doctor<S: ClinicStore>(
    State(state): State<AppState<S>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    gate(state, Role::Doctor, req, next).await
}

pub async fn require_receptionist<S: ClinicStore>(
    State(state): State<AppState<S>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    gate(state, Role::Receptionist, req, next).await
}

async fn gate<S: ClinicStore>(
    state: AppState<S>,
    role: Role,
    req: Request<Body>,
    next: Next,
) -> Response {
    match gate_inner(state, role, req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn gate_inner<S: ClinicStore>(
    state: AppState<S>,
    role: Role,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ClinicError> {
    let token = bearer_token(req.headers())
        .ok_or_else(|| ClinicError::Auth("authorization header required".into()))?
        .to_string();

    let actor = state.auth.authenticate(&token).await?;
    if actor.role != role {
        log::warn!(
            "User {} with role {} denied access to {} routes",
            actor.id,
            actor.role,
            role
        );
        return Err(ClinicError::Forbidden(format!("{} role required", role)));
    }

    req.extensions_mut().insert(actor);
    Ok(next.run(req).await)
}
