//! Request identity.
//!
//! Modules never verify credentials themselves. They receive an
//! [`Authenticator`] at startup and ask it who is calling; how the identity
//! was established (token, session, gateway) is the authenticator's business.

use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};

use crate::ServiceError;

/// Header carrying the authenticated user id, set by the gateway.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Header carrying the caller's currently selected company.
pub const COMPANY_ID_HEADER: &str = "x-company-id";

/// Who is calling, and on behalf of which company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    /// Current company (tenant). `None` for users not attached to any company.
    pub company_id: Option<i64>,
}

/// Pluggable identity resolution, called once per request.
pub trait Authenticator: Send + Sync + 'static {
    /// Resolve the caller from request headers.
    ///
    /// Returns `ServiceError::Unauthorized` when no identity can be established.
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ServiceError>;
}

/// Trusts identity headers injected by an upstream gateway that has already
/// verified the caller. Never expose a service using this directly.
pub struct TrustedHeaders;

impl Authenticator for TrustedHeaders {
    fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, ServiceError> {
        let user_id = header_i64(headers, USER_ID_HEADER)?
            .ok_or_else(|| ServiceError::Unauthorized(format!("missing {} header", USER_ID_HEADER)))?;
        let company_id = header_i64(headers, COMPANY_ID_HEADER)?;
        Ok(Identity { user_id, company_id })
    }
}

fn header_i64(headers: &HeaderMap, name: &str) -> Result<Option<i64>, ServiceError> {
    let Some(raw) = headers.get(name) else {
        return Ok(None);
    };
    let text = raw
        .to_str()
        .map_err(|_| ServiceError::Unauthorized(format!("{} is not valid text", name)))?;
    text.trim()
        .parse::<i64>()
        .map(Some)
        .map_err(|_| ServiceError::Unauthorized(format!("{} must be an integer id", name)))
}
