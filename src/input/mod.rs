//! Input sampling for the headset's orientation joystick
//!
//! The headset reports its orientation through a game-controller interface
//! with three absolute axes. This module selects that controller and exposes
//! the latest axis readings:
//!
//! 1. [`gamepad`] - gilrs-backed sampler with device discovery and re-acquisition
//! 2. [`scripted`] - replayable source for tests and hardware-free runs
//!
//! ```text
//! Controller ──► JoystickSampler ──► RawAxisState ──► pose conversion
//!                (Discovering → Sampling)
//! ```

pub mod gamepad;
pub mod scripted;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use gamepad::{JoystickSampler, SamplerState};
pub use scripted::ScriptedAxisSource;

use crate::pose::RAW_AXIS_MAX;

/// Latest three axis readings in the raw 0..=65535 range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RawAxisState {
    /// Drives the rotation about X
    pub x: i32,
    /// Drives the rotation about Y
    pub y: i32,
    /// Drives the (negated) rotation about Z
    pub z: i32,
}

/// Outcome of one poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sample {
    /// Read succeeded this tick
    Fresh(RawAxisState),
    /// Read failed; re-acquisition was attempted and the previous state is returned
    Cached(RawAxisState),
}

impl Sample {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Sample::Fresh(_))
    }

    pub fn state(&self) -> RawAxisState {
        match self {
            Sample::Fresh(state) | Sample::Cached(state) => *state,
        }
    }
}

/// A non-blocking source of raw axis readings
///
/// Implementations recover from transient read failures themselves; a failed
/// read is reported as [`Sample::Cached`], never as an error.
pub trait AxisSource: Send {
    fn poll(&mut self) -> Sample;

    fn last_state(&self) -> RawAxisState;

    /// Human readable name for logs
    fn describe(&self) -> String;
}

/// Hardware identity used to pick the headset's controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Optional case-insensitive product name filter
    pub name_contains: Option<String>,
}

impl Default for InputIdentity {
    fn default() -> Self {
        Self {
            vendor_id: 0x2C43,
            product_id: 0x0009,
            name_contains: None,
        }
    }
}

impl InputIdentity {
    pub fn matches(&self, vendor_id: Option<u16>, product_id: Option<u16>, name: &str) -> bool {
        if vendor_id != Some(self.vendor_id) || product_id != Some(self.product_id) {
            return false;
        }
        match &self.name_contains {
            Some(filter) => name.to_lowercase().contains(&filter.to_lowercase()),
            None => true,
        }
    }
}

impl fmt::Display for InputIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)?;
        if let Some(filter) = &self.name_contains {
            write!(f, " (\"{filter}\")")?;
        }
        Ok(())
    }
}

/// Controller axis a rotation is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AxisChannel {
    LeftStickX,
    LeftStickY,
    LeftZ,
    RightStickX,
    RightStickY,
    RightZ,
}

impl From<AxisChannel> for gilrs::Axis {
    fn from(channel: AxisChannel) -> Self {
        match channel {
            AxisChannel::LeftStickX => gilrs::Axis::LeftStickX,
            AxisChannel::LeftStickY => gilrs::Axis::LeftStickY,
            AxisChannel::LeftZ => gilrs::Axis::LeftZ,
            AxisChannel::RightStickX => gilrs::Axis::RightStickX,
            AxisChannel::RightStickY => gilrs::Axis::RightStickY,
            AxisChannel::RightZ => gilrs::Axis::RightZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisBinding {
    pub channel: AxisChannel,
    #[serde(default)]
    pub invert: bool,
}

impl AxisBinding {
    pub const fn new(channel: AxisChannel, invert: bool) -> Self {
        Self { channel, invert }
    }

    /// Rescales a normalized -1..1 reading to the raw integer range.
    pub fn to_raw(&self, value: f32) -> i32 {
        let value = f64::from(value.clamp(-1.0, 1.0));
        let value = if self.invert { -value } else { value };
        let raw = ((value + 1.0) * 0.5 * f64::from(RAW_AXIS_MAX)).round();
        raw.clamp(0.0, f64::from(RAW_AXIS_MAX)) as i32
    }
}

/// Which controller axis feeds each rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisBindings {
    pub x: AxisBinding,
    pub y: AxisBinding,
    pub z: AxisBinding,
}

impl Default for AxisBindings {
    fn default() -> Self {
        Self {
            x: AxisBinding::new(AxisChannel::LeftZ, false),
            y: AxisBinding::new(AxisChannel::RightStickX, false),
            // raw Y counts grow downwards on the headset
            z: AxisBinding::new(AxisChannel::LeftStickY, true),
        }
    }
}
