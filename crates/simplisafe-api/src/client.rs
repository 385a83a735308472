// Authenticated request engine.
//
// Wraps `reqwest::Client` with the SimpliSafe token lifecycle: tokens are
// refreshed before they expire, a 401 triggers one refresh-and-retry, and
// 409s (transient base-station lock contention) are retried a bounded
// number of times. Everything above this layer deals in JSON payloads.

use reqwest::{Method, StatusCode, header};
use secrecy::SecretString;
use serde_json::{Value, json};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, warn};
use url::Url;

use chrono::Utc;

use crate::auth::{Credentials, MfaChallengeResponse, TokenErrorBody, TokenGrant, TokenResponse};
use crate::error::Error;
use crate::transport::TransportConfig;

/// Production API root. Override `base_url` in tests.
pub const DEFAULT_API_URL: &str = "https://api.simplisafe.com/v1/";

/// Retry tuning for 409 conflict responses.
///
/// The cloud returns 409 when a write races a base-station sync; these
/// usually clear within a second or two.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts for a conflicting request (including the first).
    pub conflict_attempts: u32,
    /// Delay between conflict retries. Tests set this to zero.
    pub conflict_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            conflict_attempts: 3,
            conflict_delay: Duration::from_secs(1),
        }
    }
}

/// Configuration for an [`ApiClient`].
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// API root; must be treated as a directory (trailing slash).
    pub base_url: Url,
    /// OAuth client id registered with SimpliSafe.
    pub client_id: String,
    pub transport: TransportConfig,
    pub retry: RetryPolicy,
}

impl ApiConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            base_url: Url::parse(DEFAULT_API_URL).expect("default API URL is valid"),
            client_id: client_id.into(),
            transport: TransportConfig::default(),
            retry: RetryPolicy::default(),
        }
    }
}

/// Outcome of a single token endpoint round-trip.
enum TokenOutcome {
    Tokens(TokenResponse),
    MfaRequired { mfa_token: String },
}

/// Raw authenticated client for the SimpliSafe cloud API.
///
/// Owns the credential store; the token refresher is the only code path
/// that writes to it, and it replaces the whole token set atomically.
/// Endpoint semantics (subscriptions, settings, PINs, …) live in
/// `simplisafe-core` -- this type only knows how to authenticate and
/// shuttle JSON.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    client_id: String,
    retry: RetryPolicy,
    credentials: Mutex<Option<Credentials>>,
}

impl ApiClient {
    /// Build an unauthenticated client. Call one of the `login_via_*`
    /// methods before issuing requests.
    pub fn new(config: ApiConfig) -> Result<Self, Error> {
        let http = config.transport.build_client()?;

        // Joining relative paths requires a directory-style base.
        let mut base_url = config.base_url;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            http,
            base_url,
            client_id: config.client_id,
            retry: config.retry,
            credentials: Mutex::new(None),
        })
    }

    /// The API root this client talks to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Snapshot of the current credentials, if authenticated.
    ///
    /// Callers can persist the refresh token and later resume the
    /// session with [`login_via_token`](Self::login_via_token).
    pub async fn credentials(&self) -> Option<Credentials> {
        self.credentials.lock().await.clone()
    }

    // ── Login flows ──────────────────────────────────────────────────

    /// Authenticate with an email address and password.
    ///
    /// If the account has MFA enabled, the cloud answers the password
    /// grant with an MFA challenge; this method sends the out-of-band
    /// challenge and attempts the code exchange. Until the user approves
    /// the challenge, the exchange fails with
    /// [`Error::PendingAuthorization`] -- prompt the user, then call
    /// this again.
    pub async fn login_via_credentials(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<(), Error> {
        debug!("logging in with account credentials");
        let grant = TokenGrant::Password { email, password };
        match self.token_request(&grant).await? {
            TokenOutcome::Tokens(tokens) => {
                self.store_credentials(tokens).await;
                Ok(())
            }
            TokenOutcome::MfaRequired { mfa_token } => {
                debug!("account requires multi-factor authentication");
                let oob_code = self.send_mfa_challenge(&mfa_token).await?;
                let grant = TokenGrant::MfaOob {
                    mfa_token: &mfa_token,
                    oob_code: &oob_code,
                };
                match self.token_request(&grant).await? {
                    TokenOutcome::Tokens(tokens) => {
                        self.store_credentials(tokens).await;
                        Ok(())
                    }
                    TokenOutcome::MfaRequired { .. } => Err(Error::InvalidCredentials),
                }
            }
        }
    }

    /// Authenticate with a previously-saved refresh token.
    pub async fn login_via_token(&self, refresh_token: &SecretString) -> Result<(), Error> {
        debug!("logging in with saved refresh token");
        match self
            .token_request(&TokenGrant::RefreshToken(refresh_token))
            .await?
        {
            TokenOutcome::Tokens(tokens) => {
                self.store_credentials(tokens).await;
                Ok(())
            }
            TokenOutcome::MfaRequired { .. } => Err(Error::InvalidCredentials),
        }
    }

    // ── Request engine ───────────────────────────────────────────────

    /// Issue an authenticated request and return the parsed JSON body.
    ///
    /// `path` is relative to the API root (e.g.
    /// `subscriptions/12345/settings`). Handles the full failure policy:
    ///
    /// - expired/absent token: refreshed before the request is sent
    /// - 401: one refresh-and-retry; a second 401 is
    ///   [`Error::InvalidCredentials`]
    /// - 403: [`Error::EndpointUnavailable`], never retried
    /// - 409: bounded retries per [`RetryPolicy`], then
    ///   [`Error::Request`]
    /// - other non-2xx: [`Error::Request`] immediately
    ///
    /// An empty 2xx body yields `Value::Null`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        params: Option<&[(&str, String)]>,
        json_body: Option<&Value>,
    ) -> Result<Value, Error> {
        self.ensure_fresh_token().await?;
        let url = self.url(path)?;

        let mut refreshed = false;
        let mut conflicts: u32 = 0;

        loop {
            let authorization = {
                let guard = self.credentials.lock().await;
                guard
                    .as_ref()
                    .map(Credentials::authorization_header)
                    .ok_or(Error::InvalidCredentials)?
            };

            debug!("{method} {url}");
            let mut builder = self
                .http
                .request(method.clone(), url.clone())
                .header(header::AUTHORIZATION, authorization);
            if let Some(params) = params {
                builder = builder.query(params);
            }
            if let Some(body) = json_body {
                builder = builder.json(body);
            }

            let resp = builder.send().await.map_err(Error::Transport)?;
            let status = resp.status();

            if status.is_success() {
                let body = resp.text().await.map_err(Error::Transport)?;
                if body.trim().is_empty() {
                    return Ok(Value::Null);
                }
                return serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }

            match status {
                StatusCode::UNAUTHORIZED => {
                    if refreshed {
                        warn!(%url, "request rejected again after a token refresh");
                        return Err(Error::InvalidCredentials);
                    }
                    debug!("access token rejected, refreshing");
                    self.refresh_access_token().await?;
                    refreshed = true;
                }
                StatusCode::FORBIDDEN => {
                    return Err(Error::EndpointUnavailable {
                        endpoint: path.to_owned(),
                    });
                }
                StatusCode::CONFLICT => {
                    conflicts += 1;
                    if conflicts >= self.retry.conflict_attempts {
                        let body = resp.text().await.unwrap_or_default();
                        return Err(Error::Request {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    debug!(attempt = conflicts, "conflict from the cloud, retrying");
                    tokio::time::sleep(self.retry.conflict_delay).await;
                }
                _ => {
                    let body = resp.text().await.unwrap_or_default();
                    return Err(Error::Request {
                        status: status.as_u16(),
                        body,
                    });
                }
            }
        }
    }

    // ── Token lifecycle ──────────────────────────────────────────────

    /// Refresh proactively if the stored token is absent or expired.
    async fn ensure_fresh_token(&self) -> Result<(), Error> {
        let needs_refresh = {
            let guard = self.credentials.lock().await;
            match guard.as_ref() {
                Some(creds) => creds.is_expired(Utc::now()),
                None => true,
            }
        };
        if needs_refresh {
            debug!("access token absent or expired, refreshing before request");
            self.refresh_access_token().await?;
        }
        Ok(())
    }

    /// Exchange the stored refresh token for a new token set.
    ///
    /// Holds the credential lock across the exchange so concurrent
    /// callers cannot stampede the token endpoint; the replacement is
    /// all-or-nothing.
    async fn refresh_access_token(&self) -> Result<(), Error> {
        let mut guard = self.credentials.lock().await;
        let refresh_token = guard
            .as_ref()
            .map(|c| c.refresh_token().clone())
            .ok_or(Error::InvalidCredentials)?;

        match self
            .token_request(&TokenGrant::RefreshToken(&refresh_token))
            .await?
        {
            TokenOutcome::Tokens(tokens) => {
                *guard = Some(tokens.into_credentials(Utc::now()));
                Ok(())
            }
            TokenOutcome::MfaRequired { .. } => Err(Error::InvalidCredentials),
        }
    }

    async fn store_credentials(&self, tokens: TokenResponse) {
        *self.credentials.lock().await = Some(tokens.into_credentials(Utc::now()));
    }

    /// One round-trip against the token endpoint.
    ///
    /// All three grant shapes post here. A 200 whose body reports
    /// `authorization_pending` is the MFA flow waiting on the user; a
    /// 401 whose body carries an `mfa_token` starts that flow. Anything
    /// else that isn't a token set is invalid credentials.
    async fn token_request(&self, grant: &TokenGrant<'_>) -> Result<TokenOutcome, Error> {
        let url = self.url("api/token")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&grant.payload(&self.client_id))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        let body = resp.text().await.map_err(Error::Transport)?;

        if status.is_success() {
            if let Ok(err_body) = serde_json::from_str::<TokenErrorBody>(&body) {
                if err_body.is_authorization_pending() {
                    return Err(Error::PendingAuthorization);
                }
            }
            let tokens: TokenResponse =
                serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                    message: e.to_string(),
                    body,
                })?;
            return Ok(TokenOutcome::Tokens(tokens));
        }

        if status == StatusCode::UNAUTHORIZED {
            if let Ok(err_body) = serde_json::from_str::<TokenErrorBody>(&body) {
                if err_body.is_mfa_required() {
                    if let Some(mfa_token) = err_body.mfa_token {
                        return Ok(TokenOutcome::MfaRequired { mfa_token });
                    }
                }
            }
        }

        warn!(status = status.as_u16(), "token request rejected");
        Err(Error::InvalidCredentials)
    }

    /// Send the out-of-band MFA challenge, returning the code to
    /// exchange at the token endpoint.
    async fn send_mfa_challenge(&self, mfa_token: &str) -> Result<String, Error> {
        let url = self.url("api/mfa/challenge")?;
        debug!("POST {url}");

        let resp = self
            .http
            .post(url)
            .json(&json!({
                "challenge_type": "oob",
                "client_id": self.client_id,
                "mfa_token": mfa_token,
            }))
            .send()
            .await
            .map_err(Error::Transport)?;

        let status = resp.status();
        if !status.is_success() {
            warn!(status = status.as_u16(), "MFA challenge rejected");
            return Err(Error::InvalidCredentials);
        }

        let body = resp.text().await.map_err(Error::Transport)?;
        let challenge: MfaChallengeResponse =
            serde_json::from_str(&body).map_err(|e| Error::Deserialization {
                message: e.to_string(),
                body,
            })?;
        Ok(challenge.oob_code)
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        self.base_url.join(path).map_err(Error::InvalidUrl)
    }
}
