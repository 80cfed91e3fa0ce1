//! Client identification
//!
//! The retry limiter keys its counters by client address.

use std::convert::Infallible;
use std::net::SocketAddr;

use async_trait::async_trait;
use axum::extract::{ConnectInfo, FromRef, FromRequestParts};
use axum::http::{HeaderMap, request::Parts};

use crate::AppState;

/// Identifier used when neither the socket nor a trusted header names the client
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Address of the requesting client
///
/// Taken from the socket (`ConnectInfo`), or from the first
/// `X-Forwarded-For` entry when `server.trust_forwarded_for` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientId(pub String);

fn forwarded_for(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToOwned::to_owned)
}

#[async_trait]
impl<S> FromRequestParts<S> for ClientId
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);

        if state.config.server.trust_forwarded_for {
            if let Some(client) = forwarded_for(&parts.headers) {
                return Ok(ClientId(client));
            }
        }

        let client = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string())
            .unwrap_or_else(|| UNKNOWN_CLIENT.to_string());

        Ok(ClientId(client))
    }
}
