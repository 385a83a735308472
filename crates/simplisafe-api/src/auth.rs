// Credential store types and token-endpoint wire shapes.
//
// The SimpliSafe cloud hands out OAuth-style token pairs from a single
// endpoint (`api/token`) that accepts three different grant payloads:
// password login, refresh-token exchange, and out-of-band MFA code
// exchange. All three produce the same [`Credentials`] shape.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};

/// Stored credentials start counting as expired this long before the
/// wire deadline, so an in-flight request never races the real expiry.
const EXPIRY_MARGIN_SECS: i64 = 90;

/// SimpliSafe's grant type URI for the out-of-band MFA code exchange.
const GRANT_TYPE_MFA_OOB: &str = "http://simplisafe.com/oauth/grant-types/mfa-oob";

/// A complete token set for an authenticated session.
///
/// Replaced wholesale on every refresh -- the token refresher is the only
/// writer, and partial updates are impossible by construction.
#[derive(Debug, Clone)]
pub struct Credentials {
    access_token: SecretString,
    refresh_token: SecretString,
    token_type: String,
    expires_at: DateTime<Utc>,
}

impl Credentials {
    /// The current access token.
    pub fn access_token(&self) -> &SecretString {
        &self.access_token
    }

    /// The refresh token. Persist this to log in again later without
    /// a password.
    pub fn refresh_token(&self) -> &SecretString {
        &self.refresh_token
    }

    /// Token type for the `Authorization` header (normally `Bearer`).
    pub fn token_type(&self) -> &str {
        &self.token_type
    }

    /// When the access token stops being usable.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Whether the access token is expired (or close enough to expiry
    /// that it should be refreshed before use).
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now + ChronoDuration::seconds(EXPIRY_MARGIN_SECS) >= self.expires_at
    }

    /// Render the `Authorization` header value.
    pub(crate) fn authorization_header(&self) -> String {
        format!("{} {}", self.token_type, self.access_token.expose_secret())
    }
}

// ── Token endpoint wire shapes ──────────────────────────────────────

/// Successful response from the token endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    #[serde(default = "default_token_type")]
    pub token_type: String,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl TokenResponse {
    pub(crate) fn into_credentials(self, now: DateTime<Utc>) -> Credentials {
        Credentials {
            access_token: SecretString::from(self.access_token),
            refresh_token: SecretString::from(self.refresh_token),
            token_type: self.token_type,
            expires_at: now + ChronoDuration::seconds(self.expires_in),
        }
    }
}

/// Error-shaped token endpoint body. The cloud reuses this shape for
/// both "MFA required" (HTTP 401) and "authorization pending" (HTTP 200
/// on the MFA grant before the user approves the challenge).
#[derive(Debug, Deserialize)]
pub(crate) struct TokenErrorBody {
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub mfa_token: Option<String>,
}

impl TokenErrorBody {
    pub(crate) fn is_mfa_required(&self) -> bool {
        self.error.as_deref() == Some("mfa_required") && self.mfa_token.is_some()
    }

    pub(crate) fn is_authorization_pending(&self) -> bool {
        self.error.as_deref() == Some("authorization_pending")
    }
}

/// Response from the MFA challenge endpoint.
#[derive(Debug, Deserialize)]
pub(crate) struct MfaChallengeResponse {
    pub oob_code: String,
}

// ── Grants ──────────────────────────────────────────────────────────

/// One of the three payload shapes accepted by the token endpoint.
#[derive(Debug)]
pub(crate) enum TokenGrant<'a> {
    Password {
        email: &'a str,
        password: &'a SecretString,
    },
    RefreshToken(&'a SecretString),
    MfaOob {
        mfa_token: &'a str,
        oob_code: &'a str,
    },
}

impl TokenGrant<'_> {
    /// Build the JSON body for this grant.
    pub(crate) fn payload(&self, client_id: &str) -> Value {
        match self {
            Self::Password { email, password } => json!({
                "grant_type": "password",
                "username": email,
                "password": password.expose_secret(),
                "client_id": client_id,
                "scope": "offline_access",
            }),
            Self::RefreshToken(token) => json!({
                "grant_type": "refresh_token",
                "refresh_token": token.expose_secret(),
                "client_id": client_id,
            }),
            Self::MfaOob {
                mfa_token,
                oob_code,
            } => json!({
                "grant_type": GRANT_TYPE_MFA_OOB,
                "mfa_token": mfa_token,
                "oob_code": oob_code,
                "client_id": client_id,
                "scope": "offline_access",
            }),
        }
    }
}
