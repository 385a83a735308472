// Door lock entities.
//
// Unlike sensors, locks are mutable through the cloud: lock/unlock
// commands post to the doorlock endpoint and the response confirms the
// state that was actually applied. Local state is only updated from
// that confirmation, so a failed command leaves the entity untouched.

use std::sync::Arc;

use serde_json::{Value, json};
use simplisafe_api::{ApiClient, Method};
use tracing::warn;

use crate::error::CoreError;

/// States a lock can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LockState {
    Unlocked,
    Locked,
    Jammed,
    Unknown,
}

impl LockState {
    /// Map the numeric state code from entity payloads.
    pub(crate) fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Unlocked,
            1 => Self::Locked,
            2 => Self::Jammed,
            other => {
                warn!(code = other, "unknown lock state");
                Self::Unknown
            }
        }
    }

    /// Map the state token from a lock-command response.
    pub(crate) fn from_command_response(raw: &str) -> Self {
        match raw {
            "lock" => Self::Locked,
            "unlock" => Self::Unlocked,
            other => {
                warn!(raw = other, "unknown lock command response");
                Self::Unknown
            }
        }
    }
}

/// A door lock attached to a system.
#[derive(Clone)]
pub struct Lock {
    api: Arc<ApiClient>,
    subscription_id: u64,
    serial: String,
    state: LockState,
    data: Value,
}

impl Lock {
    pub(crate) fn from_raw(api: Arc<ApiClient>, subscription_id: u64, raw: Value) -> Option<Self> {
        let Some(serial) = raw.get("serial").and_then(Value::as_str) else {
            warn!("skipping lock record without a serial");
            return None;
        };
        let state = raw
            .pointer("/status/lockState")
            .and_then(Value::as_u64)
            .map_or(LockState::Unknown, LockState::from_code);

        Some(Self {
            api,
            subscription_id,
            serial: serial.to_owned(),
            state,
            data: raw,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }

    pub fn state(&self) -> LockState {
        self.state
    }

    pub fn disabled(&self) -> bool {
        self.bool_at("/status/lockDisabled")
    }

    pub fn error(&self) -> bool {
        self.bool_at("/status/lockError")
    }

    pub fn lock_low_battery(&self) -> bool {
        self.bool_at("/status/lockLowBattery")
    }

    pub fn pin_pad_low_battery(&self) -> bool {
        self.bool_at("/status/pinPadLowBattery")
    }

    pub fn offline(&self) -> bool {
        self.bool_at("/flags/offline")
    }

    /// Lock the lock.
    pub async fn lock(&mut self) -> Result<(), CoreError> {
        self.set_state("lock").await
    }

    /// Unlock the lock.
    pub async fn unlock(&mut self) -> Result<(), CoreError> {
        self.set_state("unlock").await
    }

    async fn set_state(&mut self, target: &str) -> Result<(), CoreError> {
        let path = format!("doorlock/{}/{}/state", self.subscription_id, self.serial);
        let resp = self
            .api
            .request(Method::POST, &path, None, Some(&json!({ "state": target })))
            .await?;

        match resp.get("state").and_then(Value::as_str) {
            Some(raw) => self.state = LockState::from_command_response(raw),
            None => {
                warn!(serial = %self.serial, "lock command response missing 'state'");
                self.state = LockState::Unknown;
            }
        }
        Ok(())
    }

    fn bool_at(&self, pointer: &str) -> bool {
        self.data
            .pointer(pointer)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_codes_map_with_unknown_fallback() {
        assert_eq!(LockState::from_code(0), LockState::Unlocked);
        assert_eq!(LockState::from_code(1), LockState::Locked);
        assert_eq!(LockState::from_code(2), LockState::Jammed);
        assert_eq!(LockState::from_code(99), LockState::Unknown);
    }

    #[test]
    fn command_responses_map_with_unknown_fallback() {
        assert_eq!(LockState::from_command_response("lock"), LockState::Locked);
        assert_eq!(
            LockState::from_command_response("unlock"),
            LockState::Unlocked
        );
        assert_eq!(
            LockState::from_command_response("sideways"),
            LockState::Unknown
        );
    }
}
