//! Token storage and management

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Stored bearer token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredToken {
    pub token: String,
    pub expires_at: Option<u64>,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

impl StoredToken {
    /// Wrap a raw token. Expiry comes from the JWT `exp` claim when the token
    /// carries one.
    pub fn new(token: String) -> Self {
        let expires_at = TokenClaims::decode(&token).and_then(|c| c.exp);
        Self { token, expires_at }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            // No grace period: the backend rejects the token at `exp` exactly.
            Some(exp) => now_secs() >= exp,
            None => false,
        }
    }

    pub fn claims(&self) -> Option<TokenClaims> {
        TokenClaims::decode(&self.token)
    }
}

/// Claims the backend puts into its access tokens.
///
/// Read without signature verification; the client only uses them for
/// display and for recognising its own chat messages.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaims {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub role: Option<String>,
    pub user_type: Option<String>,
    pub exp: Option<u64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT. Returns `None` for opaque tokens.
    pub fn decode(token: &str) -> Option<Self> {
        let payload = token.split('.').nth(1)?;
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Older tokens carry only `userType`.
    pub fn is_car_center(&self) -> bool {
        let role = self.role.as_deref().or(self.user_type.as_deref());
        matches!(role, Some("ROLE_CAR_CENTER") | Some("CAR_CENTER"))
    }
}

/// Token store trait for different storage backends
pub trait TokenStore {
    fn get_auth_token(&self) -> Option<StoredToken>;
    fn set_auth_token(&mut self, token: String);
    fn clear_tokens(&mut self);
}
