// Entity type codes.

use tracing::warn;

/// What kind of device an entity payload describes.
///
/// The cloud identifies entities with small integer codes; new hardware
/// ships with new codes, so unrecognized values map to
/// [`Unknown`](Self::Unknown) rather than failing the whole refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DeviceKind {
    Remote,
    Keypad,
    Keychain,
    PanicButton,
    Motion,
    Entry,
    GlassBreak,
    CarbonMonoxide,
    Smoke,
    Leak,
    Temperature,
    Camera,
    Siren,
    Doorbell,
    Lock,
    LockKeypad,
    Unknown,
}

impl DeviceKind {
    /// Map a raw entity-type code to a kind.
    pub fn from_code(code: u64) -> Self {
        match code {
            0 => Self::Remote,
            1 => Self::Keypad,
            2 => Self::Keychain,
            3 => Self::PanicButton,
            4 => Self::Motion,
            5 => Self::Entry,
            6 => Self::GlassBreak,
            7 => Self::CarbonMonoxide,
            8 => Self::Smoke,
            9 => Self::Leak,
            10 => Self::Temperature,
            12 => Self::Camera,
            13 => Self::Siren,
            15 => Self::Doorbell,
            16 => Self::Lock,
            253 => Self::LockKeypad,
            other => {
                warn!(code = other, "unknown entity type");
                Self::Unknown
            }
        }
    }

    /// Whether this kind of sensor can report a triggered status.
    pub fn can_trigger(self) -> bool {
        matches!(
            self,
            Self::CarbonMonoxide
                | Self::Entry
                | Self::GlassBreak
                | Self::Leak
                | Self::Motion
                | Self::Smoke
                | Self::Temperature
        )
    }
}
