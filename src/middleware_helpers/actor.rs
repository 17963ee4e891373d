use axum::{extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use uuid::Uuid;

pub const ACTOR_NAME_HEADER: &str = "x-actor-name";
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_EMAIL_HEADER: &str = "x-actor-email";

/// Identity resolved by the upstream gateway and forwarded in headers.
///
/// The service never authenticates; it records whichever actor the gateway
/// vouched for. All fields are optional because system integrations may
/// supply the actor in the request body instead.
#[derive(Clone, Debug, Default)]
pub struct ActorContext {
    pub name: Option<String>,
    pub id: Option<Uuid>,
    pub email: Option<String>,
}

impl ActorContext {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let header_str = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        Self {
            name: header_str(ACTOR_NAME_HEADER),
            id: header_str(ACTOR_ID_HEADER).and_then(|s| Uuid::parse_str(&s).ok()),
            email: header_str(ACTOR_EMAIL_HEADER),
        }
    }
}

/// Plain helper for call sites that already hold the headers
pub fn actor_context(headers: &HeaderMap) -> ActorContext {
    ActorContext::from_headers(headers)
}

impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(ActorContext::from_headers(&parts.headers))
    }
}
