//! Domain layer for the SimpliSafe cloud API.
//!
//! This crate owns everything above raw HTTP (which lives in
//! `simplisafe-api`):
//!
//! - **[`Account`]** — the entry point. Authenticates (password, saved
//!   refresh token, or MFA flow), resolves the account's user id, and
//!   enumerates systems: [`Account::get_systems`] returns one
//!   [`System`] per active subscription.
//!
//! - **[`System`]** — a single security system. Both hardware
//!   generations (V2/V3) share the type; endpoint paths and wire shapes
//!   dispatch through [`Generation`]. Carries the system's state,
//!   notifications, and entities, refreshed via [`System::update`].
//!
//! - **PIN management** — [`System::get_pins`] / [`System::set_pin`] /
//!   [`System::remove_pin`], enforcing the [`PinPolicy`] invariants
//!   (4-digit numeric values, unique values, reserved master/duress
//!   slots, max user PIN count) against a force-fetched copy of the
//!   remote set. The cloud replaces the whole PIN set on every write.
//!
//! - **Entities** — [`Sensor`], [`Lock`], and [`Camera`] snapshots,
//!   plus the pure raw-to-typed mappers in [`model`] ([`SystemState`],
//!   [`DeviceKind`], …). Unrecognized vendor values degrade to an
//!   `Unknown` variant with a logged warning, never a hard failure.

pub mod account;
pub mod camera;
pub mod error;
pub mod lock;
pub mod model;
pub mod sensor;
pub mod system;

pub use account::{Account, AccountConfig};
pub use camera::{Camera, CameraKind};
pub use error::{CoreError, PinError};
pub use lock::{Lock, LockState};
pub use model::{DeviceKind, Notification, SystemState};
pub use sensor::Sensor;
pub use system::pins::{PinPolicy, RESERVED_PIN_LABELS};
pub use system::{
    DEFAULT_UPDATE_SKIP_WINDOW, Generation, System, UpdateOptions, VOLUME_HIGH, VOLUME_LOW,
    VOLUME_MEDIUM, VOLUME_OFF,
};

// Handy for callers that drive `simplisafe-api` directly.
pub use simplisafe_api::{ApiConfig, Credentials, RetryPolicy, TransportConfig};
