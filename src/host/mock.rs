//! In-memory host used by tests and the standalone runner

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace};

use super::{
    DriverProperties, DriverSettings, Property, PropertyContainerHandle, ServerDriverHost,
    TrackedDeviceClass, TrackedDeviceIndex,
};
use crate::error::{PropertyError, SettingsError};
use crate::pose::DriverPose;

/// Value written through one of the typed property setters
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    String(String),
    Float(f32),
    Bool(bool),
    Uint64(u64),
}

/// Value served by the mock settings store
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SettingValue {
    Float(f32),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedDevice {
    pub serial_number: String,
    pub class: TrackedDeviceClass,
}

/// Records everything the driver does to the host
#[derive(Debug, Default)]
pub struct MockHost {
    added: Mutex<Vec<AddedDevice>>,
    properties: Mutex<HashMap<(PropertyContainerHandle, Property), PropertyValue>>,
    settings: Mutex<HashMap<(String, String), SettingValue>>,
    last_pose: Mutex<Option<(TrackedDeviceIndex, DriverPose)>>,
    publish_count: AtomicUsize,
    next_container: AtomicU64,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MockHost {
    pub fn new() -> Self {
        Self {
            next_container: AtomicU64::new(1),
            ..Default::default()
        }
    }

    pub fn with_setting(self, section: &str, key: &str, value: SettingValue) -> Self {
        lock(&self.settings).insert((section.to_string(), key.to_string()), value);
        self
    }

    pub fn added_devices(&self) -> Vec<AddedDevice> {
        lock(&self.added).clone()
    }

    pub fn property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
    ) -> Option<PropertyValue> {
        lock(&self.properties).get(&(container, property)).cloned()
    }

    /// All properties written to any container, keyed by property
    pub fn properties(&self) -> HashMap<Property, PropertyValue> {
        lock(&self.properties)
            .iter()
            .map(|((_, property), value)| (*property, value.clone()))
            .collect()
    }

    pub fn publish_count(&self) -> usize {
        self.publish_count.load(Ordering::SeqCst)
    }

    pub fn last_pose(&self) -> Option<(TrackedDeviceIndex, DriverPose)> {
        *lock(&self.last_pose)
    }

    fn set(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: PropertyValue,
    ) -> Result<(), PropertyError> {
        if !container.is_valid() {
            return Err(PropertyError::InvalidContainer);
        }
        debug!("Mock host property {} = {:?}", property, value);
        lock(&self.properties).insert((container, property), value);
        Ok(())
    }

    fn setting(&self, section: &str, key: &str) -> Result<SettingValue, SettingsError> {
        lock(&self.settings)
            .get(&(section.to_string(), key.to_string()))
            .copied()
            .ok_or_else(|| SettingsError::MissingKey {
                section: section.to_string(),
                key: key.to_string(),
            })
    }
}

impl ServerDriverHost for MockHost {
    fn tracked_device_added(&self, serial_number: &str, class: TrackedDeviceClass) -> bool {
        debug!("Mock host registered device {} ({:?})", serial_number, class);
        lock(&self.added).push(AddedDevice {
            serial_number: serial_number.to_string(),
            class,
        });
        true
    }

    fn tracked_device_pose_updated(&self, index: TrackedDeviceIndex, pose: &DriverPose) {
        trace!("Mock host pose for {}: {:?}", index, pose.rotation);
        *lock(&self.last_pose) = Some((index, *pose));
        self.publish_count.fetch_add(1, Ordering::SeqCst);
    }
}

impl DriverProperties for MockHost {
    fn tracked_device_to_property_container(
        &self,
        index: TrackedDeviceIndex,
    ) -> PropertyContainerHandle {
        if !index.is_valid() {
            return PropertyContainerHandle::INVALID;
        }
        PropertyContainerHandle(self.next_container.fetch_add(1, Ordering::SeqCst))
    }

    fn set_string_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: &str,
    ) -> Result<(), PropertyError> {
        self.set(container, property, PropertyValue::String(value.to_string()))
    }

    fn set_float_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: f32,
    ) -> Result<(), PropertyError> {
        self.set(container, property, PropertyValue::Float(value))
    }

    fn set_bool_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: bool,
    ) -> Result<(), PropertyError> {
        self.set(container, property, PropertyValue::Bool(value))
    }

    fn set_uint64_property(
        &self,
        container: PropertyContainerHandle,
        property: Property,
        value: u64,
    ) -> Result<(), PropertyError> {
        self.set(container, property, PropertyValue::Uint64(value))
    }
}

impl DriverSettings for MockHost {
    fn get_float(&self, section: &str, key: &str) -> Result<f32, SettingsError> {
        match self.setting(section, key)? {
            SettingValue::Float(value) => Ok(value),
            SettingValue::Bool(_) => Err(SettingsError::TypeMismatch {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }

    fn get_bool(&self, section: &str, key: &str) -> Result<bool, SettingsError> {
        match self.setting(section, key)? {
            SettingValue::Bool(value) => Ok(value),
            SettingValue::Float(_) => Err(SettingsError::TypeMismatch {
                section: section.to_string(),
                key: key.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serves_typed_settings() {
        let host = MockHost::new()
            .with_setting("steamvr", "ipd", SettingValue::Float(0.065))
            .with_setting("driver_glyph", "useSBS", SettingValue::Bool(true));

        assert!((host.get_float("steamvr", "ipd").unwrap() - 0.065).abs() < 1e-6);
        assert!(host.get_bool("driver_glyph", "useSBS").unwrap());
        assert!(matches!(
            host.get_bool("steamvr", "ipd"),
            Err(SettingsError::TypeMismatch { .. })
        ));
        assert!(matches!(
            host.get_float("steamvr", "missing"),
            Err(SettingsError::MissingKey { .. })
        ));
    }

    #[test]
    fn rejects_invalid_container() {
        let host = MockHost::new();
        let container = host.tracked_device_to_property_container(TrackedDeviceIndex::INVALID);
        assert_eq!(
            host.set_bool_property(container, Property::IsOnDesktop, false),
            Err(PropertyError::InvalidContainer)
        );
    }

    #[test]
    fn counts_pose_updates() {
        let host = MockHost::new();
        let pose = DriverPose::default();
        host.tracked_device_pose_updated(TrackedDeviceIndex(0), &pose);
        host.tracked_device_pose_updated(TrackedDeviceIndex(0), &pose);
        assert_eq!(host.publish_count(), 2);
        assert_eq!(
            host.last_pose().map(|(index, _)| index),
            Some(TrackedDeviceIndex(0))
        );
    }
}
