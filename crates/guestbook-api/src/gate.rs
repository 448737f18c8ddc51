//! Admin token check for the moderation routes.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::headers::authorization::Bearer;
use axum_extra::headers::{Authorization, HeaderMapExt};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Holds the admin secret as an HMAC tag under a per-process random key, so
/// presented tokens are checked with a constant-time tag comparison.
pub struct AdminGate {
    mac: HmacSha256,
    tag: Vec<u8>,
}

impl AdminGate {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let key: [u8; 32] = rand::random();
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| anyhow::anyhow!("invalid HMAC key: {e}"))?;

        let mut keyed = mac.clone();
        keyed.update(secret.as_bytes());
        let tag = keyed.finalize().into_bytes().to_vec();

        Ok(Self { mac, tag })
    }

    pub fn authorize(&self, presented: &str) -> bool {
        if presented.is_empty() {
            return false;
        }
        let mut mac = self.mac.clone();
        mac.update(presented.as_bytes());
        mac.verify_slice(&self.tag).is_ok()
    }
}

/// First `token` pair of the query string. Other parameters are left to the
/// handlers, so a malformed `id` cannot hide a valid token.
fn query_token(request: &Request) -> Option<String> {
    let query = request.uri().query()?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
}

/// Middleware guarding `/admin/*`. The token comes from the `token` query
/// parameter, falling back to an `Authorization: Bearer` header.
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let from_header = || {
        request
            .headers()
            .typed_get::<Authorization<Bearer>>()
            .map(|auth| auth.token().to_string())
    };

    let Some(token) = query_token(&request).or_else(from_header) else {
        tracing::debug!(path = %request.uri().path(), "missing admin token");
        return Err(ApiError::Unauthorized);
    };

    if !state.gate.authorize(&token) {
        tracing::debug!(path = %request.uri().path(), "invalid admin token");
        return Err(ApiError::Unauthorized);
    }

    Ok(next.run(request).await)
}
