// ── Account facade ──
//
// The entry point for consumers: authenticates, resolves the account's
// user id, and enumerates the systems attached to its subscriptions.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;
use serde_json::Value;
use tracing::{debug, info, warn};

use simplisafe_api::{ApiClient, ApiConfig, Credentials, Method};

use crate::error::CoreError;
use crate::system::pins::PinPolicy;
use crate::system::{DEFAULT_UPDATE_SKIP_WINDOW, Generation, System};

/// Configuration for an [`Account`].
#[derive(Debug, Clone)]
pub struct AccountConfig {
    pub api: ApiConfig,
    /// PIN invariants handed to every system this account builds.
    pub pin_policy: PinPolicy,
    /// Post-state-change window during which system updates are skipped.
    pub update_skip_window: Duration,
}

impl AccountConfig {
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            api: ApiConfig::new(client_id),
            pin_policy: PinPolicy::default(),
            update_skip_window: DEFAULT_UPDATE_SKIP_WINDOW,
        }
    }
}

/// An authenticated SimpliSafe account.
///
/// Cheap to keep around for the lifetime of a session; all systems it
/// vends share one [`ApiClient`] (and therefore one credential store).
pub struct Account {
    api: Arc<ApiClient>,
    user_id: u64,
    pin_policy: PinPolicy,
    update_skip_window: Duration,
}

impl Account {
    /// Authenticate with an email address and password.
    ///
    /// See [`ApiClient::login_via_credentials`] for the MFA flow this
    /// may surface.
    pub async fn login_via_credentials(
        email: &str,
        password: &SecretString,
        config: AccountConfig,
    ) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.api)?;
        api.login_via_credentials(email, password).await?;
        Self::from_authenticated(api, config.pin_policy, config.update_skip_window).await
    }

    /// Authenticate with a previously-saved refresh token.
    pub async fn login_via_token(
        refresh_token: &SecretString,
        config: AccountConfig,
    ) -> Result<Self, CoreError> {
        let api = ApiClient::new(config.api)?;
        api.login_via_token(refresh_token).await?;
        Self::from_authenticated(api, config.pin_policy, config.update_skip_window).await
    }

    /// Resolve the account's user id from the auth check endpoint.
    async fn from_authenticated(
        api: ApiClient,
        pin_policy: PinPolicy,
        update_skip_window: Duration,
    ) -> Result<Self, CoreError> {
        let api = Arc::new(api);
        let resp = api.request(Method::GET, "api/authCheck", None, None).await?;
        let user_id = resp
            .get("userId")
            .and_then(Value::as_u64)
            .ok_or_else(|| CoreError::UnexpectedPayload {
                message: "authCheck response missing userId".to_owned(),
            })?;
        debug!(user_id, "authenticated");

        Ok(Self {
            api,
            user_id,
            pin_policy,
            update_skip_window,
        })
    }

    /// The account's user id.
    pub fn user_id(&self) -> u64 {
        self.user_id
    }

    /// Snapshot of the current credentials, for persisting the refresh
    /// token between sessions.
    pub async fn credentials(&self) -> Option<Credentials> {
        self.api.credentials().await
    }

    /// All active systems attached to this account, keyed by system id.
    ///
    /// Deactivated subscriptions are filtered out; subscriptions with
    /// missing system data or an unknown system version are skipped
    /// with a logged message rather than failing the whole listing.
    pub async fn get_systems(&self) -> Result<HashMap<u64, System>, CoreError> {
        let params = [("activeOnly", "true".to_owned())];
        let resp = self
            .api
            .request(
                Method::GET,
                &format!("users/{}/subscriptions", self.user_id),
                Some(&params),
                None,
            )
            .await?;

        let subscriptions = resp
            .get("subscriptions")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut systems = HashMap::new();
        for subscription in subscriptions {
            let Some(sid) = subscription.get("sid").and_then(Value::as_u64) else {
                warn!("skipping subscription without a sid");
                continue;
            };
            if subscription.get("activated").and_then(Value::as_u64) == Some(0) {
                debug!(sid, "skipping deactivated subscription");
                continue;
            }
            let Some(system_data) = subscription.pointer("/location/system") else {
                info!(sid, "Skipping location with missing system data");
                continue;
            };
            let version = system_data
                .get("version")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            let Some(generation) = Generation::from_version(version) else {
                warn!(sid, version, "skipping system with unknown version");
                continue;
            };

            let mut system = System::new(
                Arc::clone(&self.api),
                self.user_id,
                sid,
                generation,
                self.pin_policy.clone(),
                self.update_skip_window,
                subscription,
            );
            system.bootstrap().await?;
            systems.insert(sid, system);
        }

        debug!(count = systems.len(), "systems loaded");
        Ok(systems)
    }
}
