//! Interfaces consumed from the tracking runtime
//!
//! The driver never reaches into the host directly; everything goes through
//! the traits in this module, bundled into a [`DriverContext`] that is handed
//! to the provider at init time. [`mock`] implements all of them in memory,
//! [`console`] just logs for the standalone runner.

pub mod console;
pub mod mock;

use std::fmt;
use std::sync::Arc;

use crate::config::DriverConfig;
use crate::display::MonitorProbe;
use crate::error::{PropertyError, SettingsError};
use crate::pose::DriverPose;

/// Settings section of the runtime itself
pub const STEAMVR_SECTION: &str = "steamvr";
/// Inter-pupillary distance key in [`STEAMVR_SECTION`]
pub const IPD_KEY: &str = "ipd";
/// Settings section owned by this driver
pub const DRIVER_SECTION: &str = "driver_glyph";
/// Side-by-side stereo flag in [`DRIVER_SECTION`]
pub const USE_SBS_KEY: &str = "useSBS";

/// Index the host assigns to a tracked device on activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TrackedDeviceIndex(pub u32);

impl TrackedDeviceIndex {
    pub const INVALID: TrackedDeviceIndex = TrackedDeviceIndex(u32::MAX);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for TrackedDeviceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            write!(f, "#invalid")
        }
    }
}

/// Handle of the property container attached to a device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyContainerHandle(pub u64);

impl PropertyContainerHandle {
    pub const INVALID: PropertyContainerHandle = PropertyContainerHandle(0);

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedDeviceClass {
    Invalid,
    Hmd,
    Controller,
    GenericTracker,
    TrackingReference,
}

/// Device properties this driver writes during activation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    ModelNumber,
    RenderModelName,
    UserIpdMeters,
    UserHeadToEyeDepthMeters,
    DisplayFrequency,
    SecondsFromVsyncToPhotons,
    CurrentUniverseId,
    IsOnDesktop,
}

impl Property {
    pub fn name(&self) -> &'static str {
        match self {
            Property::ModelNumber => "Prop_ModelNumber_String",
            Property::RenderModelName => "Prop_RenderModelName_String",
            Property::UserIpdMeters => "Prop_UserIpdMeters_Float",
            Property::UserHeadToEyeDepthMeters => "Prop_UserHeadToEyeDepthMeters_Float",
            Property::DisplayFrequency => "Prop_DisplayFrequency_Float",
            Property::SecondsFromVsyncToPhotons => "Prop_SecondsFromVsyncToPhotons_Float",
            Property::CurrentUniverseId => "Prop_CurrentUniverseId_Uint64",
            Property::IsOnDesktop => "Prop_IsOnDesktop_Bool",
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Device registration and pose intake on the host side
pub trait ServerDriverHost: Send + Sync {
    /// Announces a new device. Returns false if the host rejected it.
    fn tracked_device_added(&self, serial_number: &str, class: TrackedDeviceClass) -> bool;

    /// Receives a pose snapshot for an activated device.
    fn tracked_device_pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose);
}

/// Per-device property store
pub trait DriverProperties: Send + Sync {
    fn tracked_device_to_property_container(
        &self,
        index: TrackedDeviceIndex,
    ) -> PropertyContainerHandle;

    fn set_string_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: &str,
    ) -> Result<(), PropertyError>;

    fn set_float_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: f32,
    ) -> Result<(), PropertyError>;

    fn set_bool_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: bool,
    ) -> Result<(), PropertyError>;

    fn set_uint64_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: u64,
    ) -> Result<(), PropertyError>;
}

/// Read access to the host's persisted settings
pub trait DriverSettings: Send + Sync {
    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<bool, SettingsError>;
}

/// Everything the host hands to the driver at init time
#[derive(Clone)]
pub struct DriverContext {
    pub host: Arc<dyn ServerDriverHost>,
    pub properties: Arc<dyn DriverProperties>,
    pub settings: Arc<dyn DriverSettings>,
    pub monitor_probe: Option<Arc<dyn MonitorProbe>>,
    pub config: DriverConfig,
}

impl DriverContext {
    pub fn new(
        host: Arc<dyn ServerDriverHost>,
        properties: Arc<dyn DriverProperties>,
        settings: Arc<dyn DriverSettings>,
    ) -> Self {
        Self {
            host,
            properties,
            settings,
            monitor_probe: None,
            config: DriverConfig::default(),
        }
    }

    /// Builds a context where one object serves all three host roles.
    pub fn from_host<H>(host: Arc<H>) -> Self
    where
        H: ServerDriverHost + DriverProperties + DriverSettings + 'static,
    {
        Self::new(host.clone(), host.clone(), host)
    }

    pub fn with_monitor_probe(mut self, probe: Arc<dyn MonitorProbe>) -> Self {
        self.monitor_probe = Some(probe);
        self
    }

    pub fn with_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }
}

impl fmt::Debug for DriverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverContext")
            .field("monitor_probe", &self.monitor_probe.is_some())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
