//! Virtual tracking device for the Avegant Glyph
//!
//! The headset's orientation controller is sampled on a background thread,
//! turned into head poses and published to the tracking runtime, which also
//! gets a display component describing the headset's window.

pub mod config;
pub mod display;
pub mod driver;
pub mod error;
pub mod host;
pub mod input;
pub mod logging;
pub mod math;
pub mod pose;
pub mod provider;

pub use config::DriverConfig;
pub use driver::{HeadsetDriver, TrackedDeviceServerDriver};
pub use error::{InitError, PropertyError, SamplerError, SettingsError};
pub use host::DriverContext;
pub use math::Quaternion;
pub use pose::DriverPose;
pub use provider::{hmd_driver_factory, DriverFactory, ProvidedInterface};
