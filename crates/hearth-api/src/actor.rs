//! Caller identity extraction.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! actor in two headers which this extractor turns into an [`Actor`].

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use hearth_core::capability::CapabilitySet;
use uuid::Uuid;

use crate::error::ApiError;

/// Header carrying the actor's UUID.
pub const ACTOR_ID_HEADER: &str = "x-actor-id";
/// Header carrying the actor's comma-separated capabilities.
pub const ACTOR_CAPABILITIES_HEADER: &str = "x-actor-capabilities";

/// The authenticated caller of a request.
#[derive(Debug, Clone)]
pub struct Actor {
    /// The actor's identifier.
    pub id: Uuid,
    /// Capabilities granted to the actor.
    pub capabilities: CapabilitySet,
}

impl<S: Send + Sync> FromRequestParts<S> for Actor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw_id = parts
            .headers
            .get(ACTOR_ID_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated(format!("missing {ACTOR_ID_HEADER} header")))?
            .to_str()
            .map_err(|_| {
                ApiError::Unauthenticated(format!("{ACTOR_ID_HEADER} header is not valid text"))
            })?;
        let id = Uuid::parse_str(raw_id.trim()).map_err(|_| {
            ApiError::Unauthenticated(format!("{ACTOR_ID_HEADER} header is not a UUID"))
        })?;

        let capabilities = match parts.headers.get(ACTOR_CAPABILITIES_HEADER) {
            Some(value) => CapabilitySet::parse_list(value.to_str().map_err(|_| {
                ApiError::Unauthenticated(format!(
                    "{ACTOR_CAPABILITIES_HEADER} header is not valid text"
                ))
            })?),
            None => CapabilitySet::new(),
        };

        Ok(Self { id, capabilities })
    }
}
