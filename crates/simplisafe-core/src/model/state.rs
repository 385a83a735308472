// System alarm state.

use strum::{Display, EnumString};
use tracing::warn;

/// States a system can be in.
///
/// The `*Count` variants are the exit-countdown forms the base station
/// reports while a state change is pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumString, Display)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum SystemState {
    Alarm,
    AlarmCount,
    Away,
    AwayCount,
    EntryDelay,
    Error,
    ExitDelay,
    Home,
    HomeCount,
    Off,
    Test,
    Unknown,
}

impl SystemState {
    /// Coerce a raw vendor string (e.g. `"AWAY_COUNT"`) into a state.
    ///
    /// Unrecognized values degrade to [`Unknown`](Self::Unknown) with a
    /// logged warning -- never a hard failure.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_uppercase().parse() {
            Ok(state) => state,
            Err(_) => {
                warn!(raw, "unknown system state");
                Self::Unknown
            }
        }
    }

    /// The lowercase token used in state-change requests.
    ///
    /// Only the three settable states have one.
    pub(crate) fn request_token(self) -> Option<&'static str> {
        match self {
            Self::Off => Some("off"),
            Self::Home => Some("home"),
            Self::Away => Some("away"),
            _ => None,
        }
    }

    /// Whether the system is armed (including pending countdowns).
    pub fn is_armed(self) -> bool {
        matches!(
            self,
            Self::Away | Self::AwayCount | Self::Home | Self::HomeCount
        )
    }
}
