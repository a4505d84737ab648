//! # Request Extractors
//!
//! The upstream gateway authenticates callers and forwards who they are:
//!
//! ```text
//! X-Principal-Id:   u-42
//! X-Principal-Role: MANAGER
//! ```
//!
//! [`Staff`] accepts any known role, [`Elevated`] only ADMIN and MANAGER.
//! [`ApiJson`] is `Json` with rejections mapped to [`ApiError`].

use std::str::FromStr;

use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::extract::rejection::JsonRejection;
use axum::http::request::Parts;
use axum::Json;

use vantage_core::{Principal, Role};

use crate::error::ApiError;

pub const PRINCIPAL_ID_HEADER: &str = "x-principal-id";
pub const PRINCIPAL_ROLE_HEADER: &str = "x-principal-role";

/// Any authenticated staff member.
#[derive(Debug, Clone)]
pub struct Staff(pub Principal);

/// An ADMIN or MANAGER.
#[derive(Debug, Clone)]
pub struct Elevated(pub Principal);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
    parts
        .headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

fn principal_from(parts: &Parts) -> Result<Principal, ApiError> {
    let id = header(parts, PRINCIPAL_ID_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing principal"))?;
    let role = header(parts, PRINCIPAL_ROLE_HEADER)
        .ok_or_else(|| ApiError::unauthorized("Missing principal role"))?;
    let role = Role::from_str(role).map_err(|e| ApiError::unauthorized(e.to_string()))?;

    Ok(Principal::new(id, role))
}

impl<S> FromRequestParts<S> for Staff
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        principal_from(parts).map(Staff)
    }
}

impl<S> FromRequestParts<S> for Elevated
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let principal = principal_from(parts)?;
        if !principal.role.is_elevated() {
            return Err(ApiError::forbidden(format!(
                "{:?} may not perform this operation",
                principal.role
            )));
        }
        Ok(Elevated(principal))
    }
}

/// JSON body whose parse failures answer with a `VALIDATION_ERROR` body.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}
