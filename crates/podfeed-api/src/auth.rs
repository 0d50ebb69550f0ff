//! Caller privilege, as vouched for by the upstream auth gateway.
//!
//! The gateway performs the Patreon login and forwards the patron id and
//! pledge amount as headers. Those headers are only trusted when the request
//! also carries the shared gateway secret.

use std::convert::Infallible;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;
use tracing::debug;

use crate::security::secrets_match;
use crate::state::AppState;

pub const GATEWAY_SECRET_HEADER: &str = "x-gateway-secret";
pub const PATREON_ID_HEADER: &str = "x-patreon-id";
pub const PLEDGE_CENTS_HEADER: &str = "x-patreon-pledge-cents";

/// Patreon id of the project creator, privileged regardless of pledge.
pub const CREATOR_ID: &str = "2822191";

/// Smallest pledge that unlocks quality and page size selection.
pub const MIN_PLEDGE_CENTS: u64 = 100;

/// Who is calling, reduced to what feed creation needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Caller {
    pub patreon_id: Option<String>,
    pub privileged: bool,
}

impl Caller {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn privileged(patreon_id: impl Into<String>) -> Self {
        Self {
            patreon_id: Some(patreon_id.into()),
            privileged: true,
        }
    }

    /// Read the gateway headers. Without a configured secret, or with a
    /// mismatching one, every caller is anonymous.
    pub fn from_headers(headers: &HeaderMap, gateway_secret: Option<&str>) -> Self {
        let Some(expected) = gateway_secret else {
            return Self::anonymous();
        };

        let provided = header_str(headers, GATEWAY_SECRET_HEADER).unwrap_or_default();
        if !secrets_match(expected, provided) {
            if !provided.is_empty() {
                debug!("Ignoring privilege headers with invalid gateway secret");
            }
            return Self::anonymous();
        }

        let patreon_id = header_str(headers, PATREON_ID_HEADER)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let pledge_cents = header_str(headers, PLEDGE_CENTS_HEADER)
            .and_then(|s| s.trim().parse::<u64>().ok())
            .unwrap_or(0);

        let privileged = match &patreon_id {
            Some(id) => id == CREATOR_ID || pledge_cents >= MIN_PLEDGE_CENTS,
            None => false,
        };

        Self {
            patreon_id,
            privileged,
        }
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Caller::from_headers(
            &parts.headers,
            state.config.gateway_secret.as_deref(),
        ))
    }
}
