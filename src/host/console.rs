//! Host that only logs, used by the standalone runner

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tracing::{info, warn};

use super::{
    DriverProperties, DriverSettings, Property, PropertyContainerHandle, ServerDriverHost,
    TrackedDeviceClass, TrackedDeviceIndex,
};
use crate::error::{PropertyError, SettingsError};
use crate::pose::DriverPose;

#[derive(Debug)]
pub struct ConsoleHost {
    poses: AtomicU64,
    last_report: Mutex<DateTime<Local>>,
    report_interval: chrono::Duration,
}

impl ConsoleHost {
    /// Logs the newest pose at most once per `report_interval_secs`.
    pub fn new(report_interval_secs: u64) -> Self {
        Self {
            poses: AtomicU64::new(0),
            last_report: Mutex::new(Local::now()),
            report_interval: chrono::Duration::seconds(report_interval_secs.max(1) as i64),
        }
    }

    pub fn pose_count(&self) -> u64 {
        self.poses.load(Ordering::Relaxed)
    }

    fn log_property(&self, container: PropertyContainerHandle, property: Property, value: String) {
        info!("[{:?}] {} = {}", container, property, value);
    }
}

impl Default for ConsoleHost {
    fn default() -> Self {
        Self::new(1)
    }
}

impl ServerDriverHost for ConsoleHost {
    fn tracked_device_added(&self, serial_number: &str, class: TrackedDeviceClass) -> bool {
        info!("Device added: {} ({:?})", serial_number, class);
        true
    }

    fn tracked_device_pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose) {
        let count = self.poses.fetch_add(1, Ordering::Relaxed) + 1;

        let Ok(mut last_report) = self.last_report.try_lock() else {
            return;
        };
        let now = Local::now();
        if now - *last_report > self.report_interval {
            let q = pose.rotation;
            info!(
                "{} pose #{}: w={:.4} x={:.4} y={:.4} z={:.4}",
                index, count, q.w, q.x, q.y, q.z
            );
            *last_report = now;
        }
    }
}

impl DriverProperties for ConsoleHost {
    fn tracked_device_to_property_container(
        &self,
        index: TrackedDeviceIndex,
    ) -> PropertyContainerHandle {
        if !index.is_valid() {
            warn!("Property container requested for invalid device");
            return PropertyContainerHandle::INVALID;
        }
        PropertyContainerHandle(u64::from(index.0) + 1)
    }

    fn set_string_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: &str,
    ) -> Result<(), PropertyError> {
        self.log_property(container, property, value.to_string());
        Ok(())
    }

    fn set_float_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: f32,
    ) -> Result<(), PropertyError> {
        self.log_property(container, property, value.to_string());
        Ok(())
    }

    fn set_bool_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: bool,
    ) -> Result<(), PropertyError> {
        self.log_property(container, property, value.to_string());
        Ok(())
    }

    fn set_uint64_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: u64,
    ) -> Result<(), PropertyError> {
        self.log_property(container, property, value.to_string());
        Ok(())
    }
}

// No settings store; the driver falls back to its config
impl DriverSettings for ConsoleHost {
    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError> {
        Err(SettingsError::MissingKey {
            section: section.to_string(),
            key: key.to_string(),
        })
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<bool, SettingsError> {
        Err(SettingsError::MissingKey {
            section: section.to_string(),
            key: key.to_string(),
        })
    }
}
