// Domain error types.
//
// PIN failures get their own enum because callers branch on them (a
// validation failure is a user-input problem, not a cloud problem).
// Everything transport-shaped arrives via `simplisafe_api::Error`.

use thiserror::Error;

/// A PIN operation was refused.
///
/// Validation variants (`WrongLength`, `NonNumeric`, `Reserved`) are
/// raised before any request is made; the rest require the freshly
/// fetched remote PIN set. None of these are retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PinError {
    #[error("PINs must be {expected} digits long")]
    WrongLength { expected: usize },

    #[error("PINs can only contain numbers")]
    NonNumeric,

    #[error("Refusing to create duplicate PIN: {pin}")]
    Duplicate { pin: String },

    #[error("Refusing to create more than {max} PINs")]
    TooMany { max: usize },

    #[error("Refusing to delete reserved PIN: {label}")]
    Reserved { label: String },

    #[error("Cannot delete nonexistent PIN: {pin_or_label}")]
    Nonexistent { pin_or_label: String },
}

/// Error type for everything above the HTTP layer.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A PIN operation was refused (validation or remote-state conflict).
    #[error(transparent)]
    Pin(#[from] PinError),

    /// The events endpoint returned no events when one was required.
    #[error("SimpliSafe cloud didn't return any events")]
    NoEvents,

    /// A subscription exists but carries no system data.
    #[error("Subscription {sid} has no system data")]
    MissingSystemData { sid: u64 },

    /// The cloud reported a system version this crate doesn't know.
    #[error("Unknown system version: {version}")]
    UnknownSystemVersion { version: u64 },

    /// A property name or value was rejected before any request.
    #[error("Invalid property: {name}")]
    InvalidProperty { name: String },

    /// The operation is not supported by this hardware generation.
    #[error("Operation not supported on a V{version} system: {operation}")]
    UnsupportedVersion { operation: &'static str, version: u8 },

    /// The cloud answered 2xx but the payload didn't carry what the
    /// operation needed.
    #[error("Unexpected payload from the cloud: {message}")]
    UnexpectedPayload { message: String },

    /// Transport / auth / request failure from the API layer.
    #[error(transparent)]
    Api(#[from] simplisafe_api::Error),
}

impl CoreError {
    /// Returns `true` if a fresh login could resolve this error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Api(e) if e.is_auth_error())
    }
}
