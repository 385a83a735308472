// Sensor entities.
//
// Sensors are read-only snapshots rebuilt on every entity refresh; they
// carry their raw payload and answer property questions against it.
// V2 payloads are flat, V3 nests status/settings/flags blocks.

use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::model::DeviceKind;
use crate::system::Generation;

/// A single sensor attached to a system.
#[derive(Debug, Clone)]
pub struct Sensor {
    generation: Generation,
    kind: DeviceKind,
    serial: String,
    data: Value,
}

impl Sensor {
    /// Build from a raw entity record. Records without a serial are
    /// unusable and dropped with a warning.
    ///
    /// `kind` is passed in because the system entity already coerced it
    /// to decide whether the record is a sensor or a lock.
    pub(crate) fn from_raw(generation: Generation, kind: DeviceKind, raw: Value) -> Option<Self> {
        let Some(serial) = raw.get("serial").and_then(Value::as_str) else {
            warn!("skipping sensor record without a serial");
            return None;
        };

        Some(Self {
            generation,
            kind,
            serial: serial.to_owned(),
            data: raw,
        })
    }

    pub fn serial(&self) -> &str {
        &self.serial
    }

    pub fn name(&self) -> Option<&str> {
        self.data.get("name").and_then(Value::as_str)
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    /// Whether the sensor is currently triggered.
    ///
    /// Kinds that cannot trigger (keypads, sirens, …) always report
    /// `false`.
    pub fn triggered(&self) -> bool {
        if !self.kind.can_trigger() {
            return false;
        }
        match self.generation {
            Generation::V3 => self.bool_at("/status/triggered"),
            Generation::V2 => self.bool_at("/triggered"),
        }
    }

    /// Whether the sensor trips the alarm without an entry delay.
    pub fn trigger_instantly(&self) -> bool {
        match self.generation {
            Generation::V3 => self.bool_at("/setting/instantTrigger"),
            Generation::V2 => self.bool_at("/instant"),
        }
    }

    /// Temperature reading, for temperature sensors only.
    ///
    /// Asking a non-temperature sensor is a caller bug and fails with
    /// [`CoreError::InvalidProperty`]; a temperature sensor that hasn't
    /// reported yet yields `Ok(None)`.
    pub fn temperature(&self) -> Result<Option<i64>, CoreError> {
        if self.kind != DeviceKind::Temperature {
            return Err(CoreError::InvalidProperty {
                name: "temperature".to_owned(),
            });
        }
        let value = match self.generation {
            Generation::V3 => self.data.pointer("/status/temperature"),
            Generation::V2 => self.data.get("temperature"),
        };
        Ok(value.and_then(Value::as_i64))
    }

    pub fn offline(&self) -> bool {
        match self.generation {
            Generation::V3 => self.bool_at("/flags/offline"),
            Generation::V2 => self.bool_at("/offline"),
        }
    }

    pub fn low_battery(&self) -> bool {
        match self.generation {
            Generation::V3 => self.bool_at("/flags/lowBattery"),
            // V2 reports a battery status string instead of a flag.
            Generation::V2 => self
                .data
                .get("battery")
                .and_then(Value::as_str)
                .is_some_and(|status| status != "ok"),
        }
    }

    pub fn error(&self) -> bool {
        match self.generation {
            Generation::V3 => self.bool_at("/status/malfunction"),
            Generation::V2 => self.bool_at("/error"),
        }
    }

    /// The raw entity payload, for fields this type doesn't surface.
    pub fn raw(&self) -> &Value {
        &self.data
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
    use serde_json::json;

    fn v3_sensor(kind: u64, status: Value) -> Sensor {
        Sensor::from_raw(
            Generation::V3,
            DeviceKind::from_code(kind),
            json!({
                "serial": "825-123",
                "name": "Front Door",
                "type": kind,
                "status": status,
                "setting": { "instantTrigger": true },
                "flags": { "offline": false, "lowBattery": true },
            }),
        )
        .expect("valid sensor")
    }

    #[test]
    fn triggered_requires_triggerable_kind() {
        let entry = v3_sensor(5, json!({ "triggered": true }));
        assert!(entry.triggered());

        let keypad = v3_sensor(1, json!({ "triggered": true }));
        assert!(!keypad.triggered());
    }

    #[test]
    fn temperature_only_on_temperature_sensors() {
        let freeze = v3_sensor(10, json!({ "temperature": 67 }));
        assert_eq!(freeze.temperature().expect("temperature sensor"), Some(67));

        let entry = v3_sensor(5, json!({}));
        assert!(matches!(
            entry.temperature(),
            Err(CoreError::InvalidProperty { .. })
        ));
    }

    #[test]
    fn v3_flags_are_read() {
        let sensor = v3_sensor(4, json!({}));
        assert!(!sensor.offline());
        assert!(sensor.low_battery());
        assert!(sensor.trigger_instantly());
    }

    #[test]
    fn v2_flat_fields_are_read() {
        let sensor = Sensor::from_raw(
            Generation::V2,
            DeviceKind::Entry,
            json!({
                "serial": "195-123",
                "name": "Kitchen Window",
                "type": 5,
                "triggered": true,
                "instant": false,
                "battery": "low",
            }),
        )
        .expect("valid sensor");

        assert!(sensor.triggered());
        assert!(!sensor.trigger_instantly());
        assert!(sensor.low_battery());
    }

    #[test]
    fn record_without_serial_is_dropped() {
        assert!(
            Sensor::from_raw(Generation::V3, DeviceKind::Entry, json!({"type": 5})).is_none()
        );
    }
}
