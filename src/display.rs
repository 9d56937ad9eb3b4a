//! Display geometry for the headset's stereo surface
//!
//! Geometry is resolved once when the driver is constructed, either from a
//! [`MonitorProbe`] that locates the headset's monitor or from the configured
//! fallback, and is read-only afterwards. [`GlyphDisplay`] answers the host's
//! display-component queries from that snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::DisplayConfig;

/// Which eye a query refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Eye {
    Left,
    Right,
}

/// How the two eye images share the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum StereoLayout {
    /// Each eye gets half of the window width
    SideBySide,
    /// Each eye gets the full window width; the right eye starts past the window
    #[default]
    FullWidthPerEye,
}

impl StereoLayout {
    pub fn from_side_by_side(enabled: bool) -> Self {
        if enabled {
            StereoLayout::SideBySide
        } else {
            StereoLayout::FullWidthPerEye
        }
    }
}

/// Position and size of a rectangle on the desktop or render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

/// Viewport within the output window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Tangent-space frustum bounds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectionBounds {
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

/// Per-channel texture coordinates after lens distortion
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistortionCoordinates {
    pub red: [f32; 2],
    pub green: [f32; 2],
    pub blue: [f32; 2],
}

/// Current mode of a monitor found by a [`MonitorProbe`]
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorInfo {
    pub device_id: String,
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub refresh_rate: f32,
}

/// Platform lookup of the headset's monitor
pub trait MonitorProbe: Send + Sync {
    /// First attached monitor whose device id starts with `id_prefix`
    fn find_monitor(&self, id_prefix: &str) -> Option<MonitorInfo>;
}

/// Snapshot of the headset display taken at construction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayGeometry {
    pub window: Rect,
    pub render_width: u32,
    pub render_height: u32,
    pub refresh_rate: f32,
    pub layout: StereoLayout,
}

impl DisplayGeometry {
    pub fn from_config(config: &DisplayConfig, layout: StereoLayout) -> Self {
        Self {
            window: Rect {
                x: config.window_x,
                y: config.window_y,
                width: config.window_width,
                height: config.window_height,
            },
            render_width: config.window_width,
            render_height: config.window_height,
            refresh_rate: config.refresh_rate,
            layout,
        }
    }

    pub fn from_monitor(monitor: &MonitorInfo, layout: StereoLayout) -> Self {
        Self {
            window: Rect {
                x: monitor.x,
                y: monitor.y,
                width: monitor.width,
                height: monitor.height,
            },
            render_width: monitor.width,
            render_height: monitor.height,
            refresh_rate: monitor.refresh_rate,
            layout,
        }
    }

    /// Probes for the headset monitor, falling back to the configured window.
    pub fn resolve(
        config: &DisplayConfig,
        layout: StereoLayout,
        probe: Option<&dyn MonitorProbe>,
    ) -> Self {
        let found = probe.and_then(|probe| probe.find_monitor(&config.monitor_id_prefix));

        let geometry = match found {
            Some(monitor) => {
                info!("Headset display found: {}", monitor.device_id);
                Self::from_monitor(&monitor, layout)
            }
            None => {
                warn!(
                    "No monitor matching {}, using configured window",
                    config.monitor_id_prefix
                );
                Self::from_config(config, layout)
            }
        };

        info!(
            "Window: {} {} {} {}",
            geometry.window.x, geometry.window.y, geometry.window.width, geometry.window.height
        );
        info!(
            "Render Target: {} {}",
            geometry.render_width, geometry.render_height
        );
        info!("Display Frequency: {}", geometry.refresh_rate);
        info!("Stereo layout: {:?}", geometry.layout);

        geometry
    }

    pub fn eye_viewport(&self, eye: Eye) -> Viewport {
        let width = match self.layout {
            StereoLayout::SideBySide => self.window.width / 2,
            StereoLayout::FullWidthPerEye => self.window.width,
        };

        let x = match eye {
            Eye::Left => 0,
            Eye::Right => width,
        };

        Viewport {
            x,
            y: 0,
            width,
            height: self.window.height,
        }
    }
}

/// Display queries the host issues for stereo rendering
pub trait DisplayComponent: Send + Sync {
    fn window_bounds(&self) -> Rect;
    fn is_display_on_desktop(&self) -> bool;
    fn is_display_real_display(&self) -> bool;
    fn recommended_render_target_size(&self) -> (u32, u32);
    fn eye_output_viewport(&self, eye: Eye) -> Viewport;
    fn projection_raw(&self, eye: Eye) -> ProjectionBounds;
    fn compute_distortion(&self, eye: Eye, u: f32, v: f32) -> DistortionCoordinates;
}

/// Display component of the headset
#[derive(Debug, Clone)]
pub struct GlyphDisplay {
    geometry: DisplayGeometry,
}

impl GlyphDisplay {
    pub fn new(geometry: DisplayGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &DisplayGeometry {
        &self.geometry
    }
}

impl DisplayComponent for GlyphDisplay {
    fn window_bounds(&self) -> Rect {
        self.geometry.window
    }

    fn is_display_on_desktop(&self) -> bool {
        false
    }

    fn is_display_real_display(&self) -> bool {
        true
    }

    fn recommended_render_target_size(&self) -> (u32, u32) {
        (self.geometry.render_width, self.geometry.render_height)
    }

    fn eye_output_viewport(&self, eye: Eye) -> Viewport {
        let viewport = self.geometry.eye_viewport(eye);
        debug!("Eye output {:?}: {:?}", eye, viewport);
        viewport
    }

    fn projection_raw(&self, _eye: Eye) -> ProjectionBounds {
        ProjectionBounds {
            left: -1.0,
            right: 1.0,
            top: -1.0,
            bottom: 1.0,
        }
    }

    // No lens correction
    fn compute_distortion(&self, _eye: Eye, u: f32, v: f32) -> DistortionCoordinates {
        DistortionCoordinates {
            red: [u, v],
            green: [u, v],
            blue: [u, v],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProbe(MonitorInfo);

    impl MonitorProbe for FixedProbe {
        fn find_monitor(&self, id_prefix: &str) -> Option<MonitorInfo> {
            self.0.device_id.starts_with(id_prefix).then(|| self.0.clone())
        }
    }

    fn display(layout: StereoLayout) -> GlyphDisplay {
        GlyphDisplay::new(DisplayGeometry::from_config(&DisplayConfig::default(), layout))
    }

    #[test]
    fn full_width_viewports_do_not_overlap() {
        let display = display(StereoLayout::FullWidthPerEye);
        assert_eq!(
            display.eye_output_viewport(Eye::Left),
            Viewport { x: 0, y: 0, width: 1280, height: 720 }
        );
        assert_eq!(
            display.eye_output_viewport(Eye::Right),
            Viewport { x: 1280, y: 0, width: 1280, height: 720 }
        );
    }

    #[test]
    fn side_by_side_splits_window() {
        let display = display(StereoLayout::SideBySide);
        assert_eq!(
            display.eye_output_viewport(Eye::Left),
            Viewport { x: 0, y: 0, width: 640, height: 720 }
        );
        assert_eq!(
            display.eye_output_viewport(Eye::Right),
            Viewport { x: 640, y: 0, width: 640, height: 720 }
        );
    }

    #[test]
    fn fixed_queries() {
        let display = display(StereoLayout::FullWidthPerEye);
        assert!(!display.is_display_on_desktop());
        assert!(display.is_display_real_display());
        assert_eq!(display.recommended_render_target_size(), (1280, 720));
        assert_eq!(
            display.window_bounds(),
            Rect { x: 0, y: 0, width: 1280, height: 720 }
        );

        for eye in [Eye::Left, Eye::Right] {
            assert_eq!(
                display.projection_raw(eye),
                ProjectionBounds { left: -1.0, right: 1.0, top: -1.0, bottom: 1.0 }
            );
            let coords = display.compute_distortion(eye, 0.25, 0.75);
            assert_eq!(coords.red, [0.25, 0.75]);
            assert_eq!(coords.green, [0.25, 0.75]);
            assert_eq!(coords.blue, [0.25, 0.75]);
        }
    }

    #[test]
    fn probe_overrides_configured_window() {
        let probe = FixedProbe(MonitorInfo {
            device_id: "MONITOR\\AVG0065\\{4d36e96e}".to_string(),
            x: 1920,
            y: 0,
            width: 1280,
            height: 720,
            refresh_rate: 60.0,
        });
        let config = DisplayConfig {
            window_width: 800,
            window_height: 600,
            monitor_id_prefix: "MONITOR\\AVG0065".to_string(),
            ..Default::default()
        };

        let geometry = DisplayGeometry::resolve(&config, StereoLayout::SideBySide, Some(&probe));
        assert_eq!(geometry.window.x, 1920);
        assert_eq!(geometry.render_width, 1280);

        let fallback = DisplayGeometry::resolve(&config, StereoLayout::SideBySide, None);
        assert_eq!(fallback.window.width, 800);
        assert_eq!(fallback.render_height, 600);
    }
}
