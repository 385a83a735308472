// V3 (current hardware) wire details.
//
// V3 systems use the `ss3` API surface. Fresh data is requested with a
// `forceUpdate` flag (inverse of V2's `cached`), sensors have a
// dedicated endpoint, and the PIN set is nested inside the settings
// payload: the master PIN in slot `pin1`, duress in `duress`, and user
// PINs as a fixed-size array of name/pin slots (empty strings mark
// unused slots).

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::warn;

use super::pins::PinPolicy;
use crate::error::CoreError;
use crate::model::SystemState;

// Volume levels accepted by the V3 base station.
pub const VOLUME_OFF: i64 = 0;
pub const VOLUME_LOW: i64 = 1;
pub const VOLUME_MEDIUM: i64 = 2;
pub const VOLUME_HIGH: i64 = 3;

pub(crate) fn settings_path(sid: u64) -> String {
    format!("ss3/subscriptions/{sid}/settings/normal")
}

pub(crate) fn pins_write_path(sid: u64) -> String {
    format!("ss3/subscriptions/{sid}/settings/pins")
}

pub(crate) fn sensors_path(sid: u64) -> String {
    format!("ss3/subscriptions/{sid}/sensors")
}

pub(crate) fn state_path(sid: u64, token: &str) -> String {
    format!("ss3/subscriptions/{sid}/state/{token}")
}

/// Query parameters for the settings endpoint.
pub(crate) fn settings_params(cached: bool) -> Vec<(&'static str, String)> {
    vec![
        ("forceUpdate", (!cached).to_string()),
        ("settingsType", "all".to_owned()),
    ]
}

/// Query parameters for the sensors endpoint.
pub(crate) fn sensors_params(cached: bool) -> Vec<(&'static str, String)> {
    vec![("forceUpdate", (!cached).to_string())]
}

/// Extract the label → PIN mapping from a V3 settings payload.
pub(crate) fn parse_pins(settings: &Value) -> HashMap<String, String> {
    let Some(root) = settings.pointer("/settings/pins") else {
        warn!("V3 settings payload missing 'settings.pins'");
        return HashMap::new();
    };

    let mut pins = HashMap::new();

    let slot = |path: &str| {
        root.pointer(path)
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
    };
    if let Some(value) = slot("/pin1/value") {
        pins.insert("master".to_owned(), value);
    }
    if let Some(value) = slot("/duress/value") {
        pins.insert("duress".to_owned(), value);
    }

    if let Some(users) = root.get("users").and_then(Value::as_array) {
        for user in users {
            let name = user.get("name").and_then(Value::as_str).unwrap_or_default();
            let pin = user.get("pin").and_then(Value::as_str).unwrap_or_default();
            if !name.is_empty() && !pin.is_empty() {
                pins.insert(name.to_owned(), pin.to_owned());
            }
        }
    }

    pins
}

/// Rebuild the wire shape for a PIN write.
///
/// The cloud replaces the whole set on every write, so all slots are
/// serialized: master in `pin1`, duress in `duress`, user PINs packed
/// into the fixed-size slot array (padded with empty slots).
pub(crate) fn pins_payload(pins: &HashMap<String, String>, policy: &PinPolicy) -> Value {
    let master = pins.get("master").cloned().unwrap_or_default();
    let duress = pins.get("duress").cloned().unwrap_or_default();

    let mut users: Vec<(&String, &String)> = pins
        .iter()
        .filter(|(label, _)| !policy.is_reserved(label))
        .collect();
    users.sort_by(|a, b| a.0.cmp(b.0));

    let mut slots: Vec<Value> = users
        .into_iter()
        .map(|(name, pin)| json!({"name": name, "pin": pin}))
        .collect();
    while slots.len() < policy.max_user_pins {
        slots.push(json!({"name": "", "pin": ""}));
    }

    json!({
        "pins": {
            "pin1": { "value": master },
            "duress": { "value": duress },
            "users": slots,
        }
    })
}

/// The state the cloud actually applied, from a state-change response.
pub(crate) fn applied_state(resp: &Value) -> SystemState {
    match resp.get("state").and_then(Value::as_str) {
        Some(raw) => SystemState::from_raw(raw),
        None => {
            warn!("V3 state-change response missing 'state'");
            SystemState::Unknown
        }
    }
}

/// Map a settable property name to its wire field in `settings.normal`.
pub(crate) fn property_wire_name(name: &str) -> Option<&'static str> {
    Some(match name {
        "alarm_duration" => "alarmDuration",
        "alarm_volume" => "alarmVolume",
        "chime_volume" => "doorChime",
        "entry_delay_away" => "entryDelayAway",
        "entry_delay_home" => "entryDelayHome",
        "exit_delay_away" => "exitDelayAway",
        "exit_delay_home" => "exitDelayHome",
        "light" => "light",
        "voice_prompt_volume" => "voicePrompts",
        _ => return None,
    })
}

/// Validate a property value against the base station's accepted
/// ranges, before any request is made.
pub(crate) fn validate_property(name: &str, value: &Value) -> Result<(), CoreError> {
    fn invalid(name: &str) -> CoreError {
        CoreError::InvalidProperty {
            name: name.to_owned(),
        }
    }
    fn in_range(
        name: &str,
        value: &Value,
        range: std::ops::RangeInclusive<i64>,
    ) -> Result<(), CoreError> {
        match value.as_i64() {
            Some(v) if range.contains(&v) => Ok(()),
            _ => Err(invalid(name)),
        }
    }

    match name {
        "light" if value.is_boolean() => Ok(()),
        "alarm_volume" | "chime_volume" | "voice_prompt_volume" => {
            in_range(name, value, VOLUME_OFF..=VOLUME_HIGH)
        }
        "alarm_duration" => in_range(name, value, 30..=480),
        "entry_delay_away" => in_range(name, value, 30..=255),
        "entry_delay_home" | "exit_delay_home" => in_range(name, value, 0..=255),
        "exit_delay_away" => in_range(name, value, 45..=255),
        _ => Err(invalid(name)),
    }
}

/// Raw entity records from a V3 sensors response.
pub(crate) fn entities(payload: &Value) -> Vec<Value> {
    payload
        .get("sensors")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
