use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failure kinds for allocation, store access and the external facilities.
///
/// Allocation and store errors abort the running request; nothing is written
/// before the store step, so an early failure leaves the fleet untouched.
/// Service-control and QR failures after a config has been written are logged
/// by the caller and never unwind the written file.
#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration store '{path}' is unavailable: {source}")]
    StoreUnavailable { path: PathBuf, source: io::Error },

    #[error("configuration store is locked by another provisioning run; remove '{0}' if none is active")]
    StoreLocked(PathBuf),

    #[error("no server configurations found in '{0}'")]
    StoreEmpty(PathBuf),

    #[error("all interface slots wg0-wg9 are taken")]
    SlotsExhausted,

    #[error("no free client addresses left on '{0}'")]
    AddressesExhausted(String),

    #[error("no configuration found for '{0}'")]
    ConfigNotFound(String),

    #[error("failed to read '{path}': {source}")]
    ReadFailure { path: PathBuf, source: io::Error },

    #[error("failed to write '{path}': {source}")]
    WriteFailure { path: PathBuf, source: io::Error },

    #[error("invalid settings file '{path}': {reason}")]
    SettingsInvalid { path: PathBuf, reason: String },

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("public address lookup failed: {0}")]
    RequestFailure(String),

    #[error("'{command}' failed: {reason}")]
    ExternalCommandFailure { command: String, reason: String },
}
