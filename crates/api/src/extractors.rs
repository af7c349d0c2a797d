//! Request extractors.

use axum::{extract::FromRequestParts, http::request::Parts};
use mizan_shared::types::UserId;

use crate::error::ApiError;

/// Header carrying the opaque id of the acting user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The acting user, when the caller supplied one.
///
/// Identity lives outside this service; the id is recorded on entries and
/// documents as `created_by` and never checked.
///
/// ```ignore
/// async fn handler(ActingUser(user): ActingUser) -> impl IntoResponse {
///     // user: Option<UserId>
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ActingUser(pub Option<UserId>);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(USER_ID_HEADER) else {
            return Ok(Self(None));
        };

        value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<UserId>().ok())
            .map(|id| Self(Some(id)))
            .ok_or_else(|| ApiError::bad_request("INVALID_USER_ID", "X-User-Id must be a UUID"))
    }
}
