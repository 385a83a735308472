use thiserror::Error;

/// Top-level error type for the `simplisafe-api` crate.
///
/// Covers authentication, transport, and request failures.
/// `simplisafe-core` maps these into domain-level errors.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// Login or token refresh was rejected by the cloud.
    ///
    /// Fatal to the current operation -- retrying with the same
    /// credentials will not succeed.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// An MFA challenge was sent but not yet approved by the user.
    ///
    /// Distinct from [`InvalidCredentials`](Self::InvalidCredentials):
    /// the caller should prompt the user to approve the challenge
    /// (usually an email link) and retry login later.
    #[error("Authorization pending -- approve the MFA challenge, then log in again")]
    PendingAuthorization,

    // ── Requests ────────────────────────────────────────────────────
    /// Generic non-2xx response. 409s are retried before this surfaces.
    #[error("Request failed (HTTP {status}): {body}")]
    Request { status: u16, body: String },

    /// The endpoint returned 403 -- the feature is not available for
    /// this account or hardware generation. Never retried.
    #[error("Endpoint unavailable: {endpoint}")]
    EndpointUnavailable { endpoint: String },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this error means the stored credentials are no
    /// longer usable and a fresh login is required.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::InvalidCredentials | Self::PendingAuthorization)
    }

    /// The HTTP status carried by a request error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::EndpointUnavailable { .. } => Some(403),
            _ => None,
        }
    }
}
