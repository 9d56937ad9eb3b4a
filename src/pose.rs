//! Pose model and raw axis → orientation conversion
//!
//! The poll thread is the only writer of the current pose; frame-thread
//! readers get copies out of a [`tokio::sync::watch`] cell, so a reader can
//! never observe a half-written pose.

use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::input::RawAxisState;
use crate::math::{compose_axis_quaternion, Quaternion};

/// Upper bound of the raw axis range reported by the input hardware
pub const RAW_AXIS_MAX: i32 = 65535;

/// Degrees of rotation per raw axis count
pub const DEGREES_PER_COUNT: f64 = 360.0 / RAW_AXIS_MAX as f64;

/// Angle every axis maps to at raw value 0
pub const CENTER_DEGREES: f64 = 180.0;

/// Pose time offset published when the config does not override it
pub const DEFAULT_POSE_TIME_OFFSET: f64 = -0.016;

/// Tracking quality reported with each pose
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TrackingResult {
    #[default]
    Uninitialized,
    CalibratingInProgress,
    CalibratingOutOfRange,
    RunningOk,
    RunningOutOfRange,
}

/// Snapshot handed to the host on every publish
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DriverPose {
    pub rotation: Quaternion,
    pub world_from_driver_rotation: Quaternion,
    pub driver_from_head_rotation: Quaternion,
    pub pose_time_offset: f64,
    pub pose_is_valid: bool,
    pub device_is_connected: bool,
    pub result: TrackingResult,
}

impl Default for DriverPose {
    fn default() -> Self {
        Self {
            rotation: Quaternion::IDENTITY,
            world_from_driver_rotation: Quaternion::IDENTITY,
            driver_from_head_rotation: Quaternion::IDENTITY,
            pose_time_offset: 0.0,
            pose_is_valid: false,
            device_is_connected: false,
            result: TrackingResult::Uninitialized,
        }
    }
}

/// Rotation angles in degrees derived from one raw sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisAngles {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Maps a raw axis value onto 0..360 degrees, centered at 180° for raw 0.
pub fn axis_to_degrees(raw: i32) -> f64 {
    DEGREES_PER_COUNT * f64::from(raw) + CENTER_DEGREES
}

/// Same as [`axis_to_degrees`] with the rotation direction flipped.
pub fn negated_axis_to_degrees(raw: i32) -> f64 {
    -DEGREES_PER_COUNT * f64::from(raw) + CENTER_DEGREES
}

impl AxisAngles {
    pub fn from_raw(raw: &RawAxisState) -> Self {
        Self {
            x: axis_to_degrees(raw.x),
            y: axis_to_degrees(raw.y),
            z: negated_axis_to_degrees(raw.z),
        }
    }
}

impl DriverPose {
    /// Converts one raw sample into a running, connected pose.
    pub fn from_raw(raw: &RawAxisState, pose_time_offset: f64) -> Self {
        let angles = AxisAngles::from_raw(raw);
        Self {
            rotation: compose_axis_quaternion(angles.x, angles.y, angles.z),
            world_from_driver_rotation: Quaternion::IDENTITY,
            driver_from_head_rotation: Quaternion::IDENTITY,
            pose_time_offset,
            pose_is_valid: true,
            device_is_connected: true,
            result: TrackingResult::RunningOk,
        }
    }
}

/// Creates the single-writer pose cell
pub fn pose_channel(initial: DriverPose) -> (PosePublisher, PoseReader) {
    let (tx, rx) = watch::channel(initial);
    (PosePublisher { tx }, PoseReader { rx })
}

/// Write side of the pose cell, owned by the poll worker
#[derive(Debug)]
pub struct PosePublisher {
    tx: watch::Sender<DriverPose>,
}

impl PosePublisher {
    /// Replaces the current pose. Never fails, even without readers.
    pub fn publish(&self, pose: DriverPose) {
        self.tx.send_replace(pose);
    }

    pub fn subscribe(&self) -> PoseReader {
        PoseReader {
            rx: self.tx.subscribe(),
        }
    }
}

/// Read side of the pose cell
#[derive(Debug, Clone)]
pub struct PoseReader {
    rx: watch::Receiver<DriverPose>,
}

impl PoseReader {
    pub fn latest(&self) -> DriverPose {
        *self.rx.borrow()
    }
}
