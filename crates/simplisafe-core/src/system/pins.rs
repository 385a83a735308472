// PIN policy and local validation.
//
// The remote API has no incremental PIN updates: every write replaces
// the whole set. The invariants here are therefore enforced against a
// force-fetched copy of the remote set immediately before each write
// (see `System::set_pin` / `System::remove_pin`); nothing is cached
// locally for writes.

use std::collections::HashMap;

use crate::error::PinError;

/// Labels that always exist on a system and can never be removed.
pub const RESERVED_PIN_LABELS: [&str; 2] = ["master", "duress"];

const DEFAULT_MAX_USER_PINS: usize = 4;
const DEFAULT_PIN_LENGTH: usize = 4;

/// PIN invariants for one system.
///
/// Owned by the system entity rather than living as module globals, so
/// accounts with different plan limits can carry different policies.
#[derive(Debug, Clone)]
pub struct PinPolicy {
    /// Maximum number of non-reserved PINs.
    pub max_user_pins: usize,
    /// Required PIN length, digits only.
    pub pin_length: usize,
    /// Labels that always exist and cannot be deleted.
    pub reserved_labels: Vec<String>,
}

impl Default for PinPolicy {
    fn default() -> Self {
        Self {
            max_user_pins: DEFAULT_MAX_USER_PINS,
            pin_length: DEFAULT_PIN_LENGTH,
            reserved_labels: RESERVED_PIN_LABELS.iter().map(|&l| l.to_owned()).collect(),
        }
    }
}

impl PinPolicy {
    /// Whether `label` is one of the reserved slots.
    pub fn is_reserved(&self, label: &str) -> bool {
        self.reserved_labels.iter().any(|l| l == label)
    }

    /// Total entries a PIN set may hold (user slots + reserved slots).
    pub fn max_total(&self) -> usize {
        self.max_user_pins + self.reserved_labels.len()
    }

    /// Validate a candidate PIN value. Purely local; no request is made
    /// when this fails.
    pub fn validate_value(&self, pin: &str) -> Result<(), PinError> {
        if pin.chars().count() != self.pin_length {
            return Err(PinError::WrongLength {
                expected: self.pin_length,
            });
        }
        if !pin.chars().all(|c| c.is_ascii_digit()) {
            return Err(PinError::NonNumeric);
        }
        Ok(())
    }

    /// Check the merge of `{label: pin}` into `current` against the
    /// duplicate and max-count invariants.
    ///
    /// `current` must be the force-fetched remote set. Overwriting an
    /// existing label (reserved or not) never trips the count check --
    /// the merge doesn't grow the set.
    pub fn validate_merge(
        &self,
        current: &HashMap<String, String>,
        label: &str,
        pin: &str,
    ) -> Result<(), PinError> {
        if current.values().any(|existing| existing == pin) {
            return Err(PinError::Duplicate {
                pin: pin.to_owned(),
            });
        }
        if current.len() >= self.max_total() && !current.contains_key(label) {
            return Err(PinError::TooMany {
                max: self.max_total(),
            });
        }
        Ok(())
    }
}
