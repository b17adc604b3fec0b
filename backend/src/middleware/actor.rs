//! Actor identity extraction
//!
//! Authentication happens upstream; the proxy forwards the verified email in
//! `x-actor-email`. Handlers receive it as an explicit [`CurrentActor`] and pass
//! it down to every service call.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    Json,
};
use shared::{validate_email, Actor};

use crate::error::{ErrorDetail, ErrorResponse};

/// Header set by the authenticating proxy
pub const ACTOR_HEADER: &str = "x-actor-email";

/// The actor performing the current request
#[derive(Clone, Debug)]
pub struct CurrentActor(pub Actor);

fn unauthorized(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    let error = ErrorResponse {
        error: ErrorDetail {
            code: "UNAUTHORIZED".to_string(),
            message: message.to_string(),
            field: Some(ACTOR_HEADER.to_string()),
            available: None,
            requested: None,
        },
    };
    (StatusCode::UNAUTHORIZED, Json(error))
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentActor
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(ACTOR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| unauthorized("Actor identity required"))?;

        validate_email(email).map_err(unauthorized)?;

        Ok(CurrentActor(Actor::new(email.to_lowercase())))
    }
}
