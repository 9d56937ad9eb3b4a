//! Error types shared across the driver
//!
//! Host-facing failures are collapsed into [`InitError`], which mirrors the
//! status codes a tracking runtime expects back from a driver plugin. The
//! other enums describe failures of the collaborators the driver talks to.

use thiserror::Error;

/// Status returned to the host from lifecycle calls and factory lookups
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    /// No input device matching the headset identity was found
    #[error("Headset input device not found")]
    HmdNotFound,

    /// The factory was asked for an interface this driver does not provide
    #[error("Interface not found: {0}")]
    InterfaceNotFound(String),

    /// `activate` was called on a device that is not inactive
    #[error("Device is already active")]
    AlreadyActive,

    /// Generic driver failure (thread spawn, runtime creation, ...)
    #[error("Driver failed: {0}")]
    DriverFailed(String),

    /// The driver log could not be initialized
    #[error("Driver log initialization failed: {0}")]
    LogInit(String),
}

/// Failures of the joystick sampler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SamplerError {
    #[error("Failed to initialize input subsystem: {0}")]
    InitializationError(String),

    #[error("No input device matches {0}")]
    NoMatchingDevice(String),

    #[error("Input device lost: {0}")]
    AcquisitionLost(String),

    #[error("No input device selected")]
    NotConnected,
}

/// Failures reading host settings
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingsError {
    #[error("Setting {section}/{key} not found")]
    MissingKey { section: String, key: String },

    #[error("Setting {section}/{key} has the wrong type")]
    TypeMismatch { section: String, key: String },
}

/// Failures writing device properties
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PropertyError {
    #[error("Invalid property container")]
    InvalidContainer,
}
