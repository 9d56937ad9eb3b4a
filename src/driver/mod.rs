//! Tracked-device driver for the headset
//!
//! [`HeadsetDriver`] owns the device identity, registers its properties on
//! activation and runs the pose poll loop ([`worker`]) while active. Optional
//! capabilities are exposed through a [`ComponentRegistry`].
//!
//! ```text
//!            activate                 (poll thread)
//! Inactive ────────► Activating ────► Active ──► sampler → pose → host
//!     ▲                                  │
//!     └────────── Deactivating ◄─────────┘
//!                  deactivate (cancel + join)
//! ```

pub mod component;
pub mod headset;
mod worker;

pub use component::{Component, ComponentRegistry, ComponentTag, DISPLAY_COMPONENT_VERSION};
pub use headset::HeadsetDriver;

use crate::error::InitError;
use crate::host::TrackedDeviceIndex;
use crate::pose::DriverPose;

/// Lifecycle phase of a device driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActivityState {
    #[default]
    Inactive,
    Activating,
    Active,
    Deactivating,
}

/// Device-driver interface the host calls
pub trait TrackedDeviceServerDriver: Send {
    /// Brings the device up under the host-assigned index.
    fn activate(&mut self, object_id: TrackedDeviceIndex) -> Result<(), InitError>;

    /// Stops pose production and waits for the poll thread to exit.
    fn deactivate(&mut self);

    fn enter_standby(&mut self);

    /// Capability lookup by interface name
    fn get_component(&self, name: &str) -> Option<Component>;

    /// Writes at most `response.len()` bytes of reply
    fn debug_request(&mut self, request: &str, response: &mut [u8]);

    fn get_pose(&self) -> DriverPose;

    fn power_off(&mut self);

    fn run_frame(&mut self);
}
