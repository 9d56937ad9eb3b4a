use std::sync::Arc;

use tracing::{debug, error, info, warn};

use super::component::{Component, ComponentRegistry};
use super::worker::{PollerHandle, PoseWorker};
use super::{ActivityState, TrackedDeviceServerDriver};
use crate::config::{InputConfig, PollingConfig, PoseConfig};
use crate::display::{DisplayComponent, DisplayGeometry, GlyphDisplay, StereoLayout};
use crate::error::{InitError, PropertyError, SamplerError};
use crate::host::{
    DriverContext, DriverProperties, Property, PropertyContainerHandle, ServerDriverHost,
    TrackedDeviceIndex, DRIVER_SECTION, IPD_KEY, STEAMVR_SECTION, USE_SBS_KEY,
};
use crate::input::{AxisSource, JoystickSampler};
use crate::pose::{pose_channel, DriverPose, PosePublisher, PoseReader};

/// The headset as one tracked device
///
/// Construction reads host settings and resolves the display geometry;
/// [`HeadsetDriver::initialize`] looks for the orientation controller. A
/// driver without a controller can be registered, but refuses activation.
pub struct HeadsetDriver {
    host: Arc<dyn ServerDriverHost>,
    properties: Arc<dyn DriverProperties>,

    serial_number: String,
    model_number: String,
    ipd: f32,
    seconds_from_vsync_to_photons: f32,
    display: Arc<GlyphDisplay>,
    components: ComponentRegistry,

    input: InputConfig,
    polling: PollingConfig,
    pose: PoseConfig,

    object_id: TrackedDeviceIndex,
    property_container: PropertyContainerHandle,
    activity: ActivityState,

    // Parked here while inactive, owned by the poll thread while active
    sampler: Option<Box<dyn AxisSource>>,
    publisher: Option<PosePublisher>,
    pose_reader: PoseReader,
    poller: Option<PollerHandle>,
}

impl HeadsetDriver {
    pub fn new(context: &DriverContext) -> Self {
        let config = &context.config;

        let ipd = match context.settings.get_float(STEAMVR_SECTION, IPD_KEY) {
            Ok(ipd) => ipd,
            Err(e) => {
                warn!("{}, using default IPD", e);
                config.pose.default_ipd_meters
            }
        };
        let side_by_side = match context.settings.get_bool(DRIVER_SECTION, USE_SBS_KEY) {
            Ok(enabled) => enabled,
            Err(e) => {
                debug!("{}, using configured stereo layout", e);
                config.display.side_by_side
            }
        };

        let geometry = DisplayGeometry::resolve(
            &config.display,
            StereoLayout::from_side_by_side(side_by_side),
            context.monitor_probe.as_deref(),
        );
        let display = Arc::new(GlyphDisplay::new(geometry));

        let mut components = ComponentRegistry::new();
        components.register(Component::Display(display.clone()));

        let (publisher, pose_reader) = pose_channel(DriverPose::default());

        info!("Serial Number: {}", config.device.serial_number);
        info!("Model Number: {}", config.device.model_number);
        info!(
            "Seconds from Vsync to Photons: {}",
            config.display.seconds_from_vsync_to_photons
        );
        info!("IPD: {}", ipd);

        Self {
            host: context.host.clone(),
            properties: context.properties.clone(),
            serial_number: config.device.serial_number.clone(),
            model_number: config.device.model_number.clone(),
            ipd,
            seconds_from_vsync_to_photons: config.display.seconds_from_vsync_to_photons,
            display,
            components,
            input: config.input.clone(),
            polling: config.polling.clone(),
            pose: config.pose.clone(),
            object_id: TrackedDeviceIndex::INVALID,
            property_container: PropertyContainerHandle::INVALID,
            activity: ActivityState::Inactive,
            sampler: None,
            publisher: Some(publisher),
            pose_reader,
            poller: None,
        }
    }

    /// Finds the headset controller through gilrs.
    ///
    /// Failure leaves the driver without an input device; activation then
    /// reports [`InitError::HmdNotFound`].
    pub fn initialize(&mut self) -> Result<(), SamplerError> {
        let sampler = JoystickSampler::create(self.input.identity.clone(), self.input.bindings)?
            .discover()?;
        self.attach_sampler(Box::new(sampler));
        Ok(())
    }

    /// Uses `sampler` as the orientation source from the next activation on.
    pub fn attach_sampler(&mut self, sampler: Box<dyn AxisSource>) {
        info!("Attached input device: {}", sampler.describe());
        self.sampler = Some(sampler);
    }

    pub fn has_input_device(&self) -> bool {
        self.sampler.is_some() || self.poller.is_some()
    }

    pub fn serial_number(&self) -> &str {
        &self.serial_number
    }

    pub fn model_number(&self) -> &str {
        &self.model_number
    }

    pub fn ipd(&self) -> f32 {
        self.ipd
    }

    pub fn object_id(&self) -> TrackedDeviceIndex {
        self.object_id
    }

    pub fn activity(&self) -> ActivityState {
        self.activity
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_some()
    }

    /// Typed access to the display capability
    pub fn display(&self) -> Arc<dyn DisplayComponent> {
        self.display.clone()
    }

    pub fn display_geometry(&self) -> &DisplayGeometry {
        self.display.geometry()
    }

    fn register_properties(&self) {
        let container = self.property_container;
        let props = &self.properties;

        let results: [(Property, Result<(), PropertyError>); 8] = [
            (
                Property::ModelNumber,
                props.set_string_property(container, Property::ModelNumber, &self.model_number),
            ),
            (
                Property::RenderModelName,
                props.set_string_property(
                    container,
                    Property::RenderModelName,
                    &self.model_number,
                ),
            ),
            (
                Property::UserIpdMeters,
                props.set_float_property(container, Property::UserIpdMeters, self.ipd),
            ),
            (
                Property::UserHeadToEyeDepthMeters,
                props.set_float_property(
                    container,
                    Property::UserHeadToEyeDepthMeters,
                    self.pose.head_to_eye_depth_meters,
                ),
            ),
            (
                Property::DisplayFrequency,
                props.set_float_property(
                    container,
                    Property::DisplayFrequency,
                    self.display.geometry().refresh_rate,
                ),
            ),
            (
                Property::SecondsFromVsyncToPhotons,
                props.set_float_property(
                    container,
                    Property::SecondsFromVsyncToPhotons,
                    self.seconds_from_vsync_to_photons,
                ),
            ),
            (
                Property::CurrentUniverseId,
                props.set_uint64_property(
                    container,
                    Property::CurrentUniverseId,
                    self.pose.universe_id,
                ),
            ),
            // avoids "not fullscreen" warnings from the host monitor
            (
                Property::IsOnDesktop,
                props.set_bool_property(container, Property::IsOnDesktop, false),
            ),
        ];

        for (property, result) in results {
            if let Err(e) = result {
                warn!("Failed to set {}: {}", property, e);
            }
        }
    }

    // Publisher to hand to the next poll thread; a panicked thread took the
    // old one with it, so start a fresh cell
    fn take_publisher(&mut self) -> PosePublisher {
        match self.publisher.take() {
            Some(publisher) => publisher,
            None => {
                let (publisher, reader) = pose_channel(self.pose_reader.latest());
                self.pose_reader = reader;
                publisher
            }
        }
    }

    // Takes back what an activation handed to the poll thread
    fn restore_worker(&mut self, worker: PoseWorker) {
        let (sampler, publisher) = worker.into_parts();
        self.sampler = Some(sampler);
        self.publisher = Some(publisher);
    }

    fn reset_to_inactive(&mut self) {
        self.object_id = TrackedDeviceIndex::INVALID;
        self.property_container = PropertyContainerHandle::INVALID;
        self.activity = ActivityState::Inactive;
    }
}

impl TrackedDeviceServerDriver for HeadsetDriver {
    fn activate(&mut self, object_id: TrackedDeviceIndex) -> Result<(), InitError> {
        if self.activity != ActivityState::Inactive {
            error!(
                "Activate called for {} while {:?}",
                self.serial_number, self.activity
            );
            return Err(InitError::AlreadyActive);
        }

        info!("Activating {} as {}", self.serial_number, object_id);
        self.activity = ActivityState::Activating;
        self.object_id = object_id;
        self.property_container = self
            .properties
            .tracked_device_to_property_container(object_id);
        self.register_properties();

        let Some(sampler) = self.sampler.take() else {
            error!("No headset controller available, activation failed");
            self.reset_to_inactive();
            return Err(InitError::HmdNotFound);
        };

        let publisher = self.take_publisher();
        let worker = PoseWorker::new(
            object_id,
            sampler,
            publisher,
            self.host.clone(),
            self.polling.clone(),
            self.pose.time_offset_secs,
        );

        match worker.spawn() {
            Ok(poller) => {
                self.poller = Some(poller);
                self.activity = ActivityState::Active;
                info!("{} active", self.serial_number);
                Ok(())
            }
            Err((e, worker)) => {
                self.restore_worker(worker);
                self.reset_to_inactive();
                Err(e)
            }
        }
    }

    fn deactivate(&mut self) {
        if let Some(poller) = self.poller.take() {
            self.activity = ActivityState::Deactivating;
            debug!("Stopping pose poll thread for {}", self.object_id);

            if let Some(worker) = poller.stop() {
                self.restore_worker(worker);
            }
        }

        self.reset_to_inactive();
        info!("{} deactivated", self.serial_number);
    }

    fn enter_standby(&mut self) {}

    fn get_component(&self, name: &str) -> Option<Component> {
        let component = self.components.lookup(name).cloned();
        if component.is_none() {
            debug!("No component named {}", name);
        }
        component
    }

    fn debug_request(&mut self, request: &str, response: &mut [u8]) {
        debug!("Debug request: {}", request);
        if let Some(first) = response.first_mut() {
            *first = 0;
        }
    }

    fn get_pose(&self) -> DriverPose {
        self.pose_reader.latest()
    }

    fn power_off(&mut self) {}

    fn run_frame(&mut self) {}
}

impl Drop for HeadsetDriver {
    fn drop(&mut self) {
        if self.poller.is_some() {
            warn!("{} dropped while active, stopping poll thread", self.serial_number);
            self.deactivate();
        }
    }
}
