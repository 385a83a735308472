// V2 (original hardware) wire details.
//
// V2 systems predate the `ss3` API surface: settings, PINs, and state
// all live under `subscriptions/{sid}/…`, the server-side cache is
// selected with a `cached` query flag, and sensor data rides along in
// the settings payload instead of having its own endpoint.

use std::collections::HashMap;

use serde_json::{Value, json};
use tracing::warn;

use crate::model::SystemState;

pub(crate) fn settings_path(sid: u64) -> String {
    format!("subscriptions/{sid}/settings")
}

pub(crate) fn pins_path(sid: u64) -> String {
    format!("subscriptions/{sid}/pins")
}

pub(crate) fn state_path(sid: u64) -> String {
    format!("subscriptions/{sid}/state")
}

/// Query parameters shared by the V2 read endpoints.
pub(crate) fn cached_params(cached: bool) -> Vec<(&'static str, String)> {
    vec![
        ("cached", cached.to_string()),
        ("settingsType", "all".to_owned()),
    ]
}

/// Extract the label → PIN mapping from a V2 pins payload.
pub(crate) fn parse_pins(payload: &Value) -> HashMap<String, String> {
    let Some(pins) = payload.get("pins").and_then(Value::as_object) else {
        warn!("V2 pins payload missing 'pins' object");
        return HashMap::new();
    };

    pins.iter()
        .filter_map(|(label, value)| {
            let pin = value.as_str()?;
            (!pin.is_empty()).then(|| (label.clone(), pin.to_owned()))
        })
        .collect()
}

/// Build the write body. V2 writes replace the entire PIN set.
pub(crate) fn pins_payload(pins: &HashMap<String, String>) -> Value {
    json!({ "pins": pins })
}

/// The state the cloud actually applied, from a state-change response.
pub(crate) fn applied_state(resp: &Value) -> SystemState {
    match resp.get("requestedState").and_then(Value::as_str) {
        Some(raw) => SystemState::from_raw(raw),
        None => {
            warn!("V2 state-change response missing 'requestedState'");
            SystemState::Unknown
        }
    }
}

/// Raw entity records from a V2 settings payload.
pub(crate) fn entities(settings: &Value) -> Vec<Value> {
    settings
        .pointer("/settings/sensors")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default()
}
