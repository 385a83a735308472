//! Raw async client for the SimpliSafe cloud API.
//!
//! This crate owns the pieces of the client that deal in HTTP and
//! tokens, nothing else:
//!
//! - **[`ApiClient`]** — the authenticated request engine. Refreshes
//!   tokens before expiry, retries once on 401 (after a refresh),
//!   retries 409 conflicts a bounded number of times, and maps all
//!   other failures to typed [`Error`]s.
//! - **[`Credentials`]** — the stored access/refresh token pair with
//!   its expiry. Replaced wholesale on every refresh; never partially
//!   updated.
//! - Login flows — password, saved refresh token, and the out-of-band
//!   MFA challenge/exchange.
//!
//! Endpoint semantics (subscriptions, PINs, system state, …) live in
//! `simplisafe-core`, which drives this crate through
//! [`ApiClient::request`].

pub mod auth;
pub mod client;
pub mod error;
pub mod transport;

pub use auth::Credentials;
pub use client::{ApiClient, ApiConfig, DEFAULT_API_URL, RetryPolicy};
pub use error::Error;
pub use transport::TransportConfig;

// Re-exported so downstream crates don't need a direct reqwest
// dependency just to name a method.
pub use reqwest::Method;
