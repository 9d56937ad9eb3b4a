//! Host-facing entry points
//!
//! The host loads the driver, asks [`hmd_driver_factory`] for interfaces by
//! name and drives the returned providers. The server provider owns the one
//! [`HeadsetDriver`] and forwards frame ticks to it.

use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use tracing::{debug, error, info, warn};

use crate::driver::{HeadsetDriver, TrackedDeviceServerDriver, DISPLAY_COMPONENT_VERSION};
use crate::error::InitError;
use crate::host::{DriverContext, TrackedDeviceClass};
use crate::logging::{cleanup_driver_log, init_driver_log};

pub const SERVER_PROVIDER_VERSION: &str = "IServerTrackedDeviceProvider_004";
pub const WATCHDOG_PROVIDER_VERSION: &str = "IVRWatchdogProvider_001";
pub const TRACKED_DEVICE_DRIVER_VERSION: &str = "ITrackedDeviceServerDriver_005";

/// Server-side provider interface the host drives once per process
pub trait ServerTrackedDeviceProvider: Send {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError>;

    fn cleanup(&mut self);

    /// Interface names implemented by this driver
    fn interface_versions(&self) -> &'static [&'static str];

    fn run_frame(&mut self);

    fn should_block_standby_mode(&self) -> bool;

    fn enter_standby(&mut self);

    fn leave_standby(&mut self);
}

pub trait WatchdogProvider: Send {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError>;

    fn cleanup(&mut self);
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
pub struct GlyphServerProvider {
    device: Option<Arc<Mutex<HeadsetDriver>>>,
}

impl GlyphServerProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// The headset created by [`init`](ServerTrackedDeviceProvider::init)
    pub fn device(&self) -> Option<Arc<Mutex<HeadsetDriver>>> {
        self.device.clone()
    }
}

impl ServerTrackedDeviceProvider for GlyphServerProvider {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError> {
        init_driver_log(&context.config.logging.filter)?;
        info!("Initializing Glyph server provider");

        if self.device.is_some() {
            warn!("Server provider initialized twice, replacing headset driver");
        }

        let mut driver = HeadsetDriver::new(&context);
        if let Err(e) = driver.initialize() {
            // Registration still happens, activation reports the missing device
            error!("Headset input unavailable: {}", e);
        }

        if !context
            .host
            .tracked_device_added(driver.serial_number(), TrackedDeviceClass::Hmd)
        {
            warn!("Host rejected device {}", driver.serial_number());
        }

        self.device = Some(Arc::new(Mutex::new(driver)));
        Ok(())
    }

    fn cleanup(&mut self) {
        info!("Cleaning up Glyph server provider");
        // Deactivation is the host's job; dropping only joins a stray poll thread
        self.device = None;
        cleanup_driver_log();
    }

    fn interface_versions(&self) -> &'static [&'static str] {
        &[
            SERVER_PROVIDER_VERSION,
            TRACKED_DEVICE_DRIVER_VERSION,
            DISPLAY_COMPONENT_VERSION,
            WATCHDOG_PROVIDER_VERSION,
        ]
    }

    fn run_frame(&mut self) {
        if let Some(device) = &self.device {
            lock(device).run_frame();
        }
    }

    fn should_block_standby_mode(&self) -> bool {
        false
    }

    fn enter_standby(&mut self) {}

    fn leave_standby(&mut self) {}
}

/// Watchdog with the wake loop left disabled
#[derive(Debug, Default)]
pub struct GlyphWatchdog {
    initialized: bool,
}

impl GlyphWatchdog {
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl WatchdogProvider for GlyphWatchdog {
    fn init(&mut self, context: DriverContext) -> Result<(), InitError> {
        init_driver_log(&context.config.logging.filter)?;
        debug!("Watchdog initialized");
        self.initialized = true;
        Ok(())
    }

    fn cleanup(&mut self) {
        debug!("Watchdog cleaned up");
        self.initialized = false;
        cleanup_driver_log();
    }
}

/// Interface handed out by the factory
#[derive(Clone)]
pub enum ProvidedInterface {
    ServerProvider(Arc<Mutex<GlyphServerProvider>>),
    Watchdog(Arc<Mutex<GlyphWatchdog>>),
}

impl ProvidedInterface {
    pub fn into_server_provider(self) -> Option<Arc<Mutex<GlyphServerProvider>>> {
        match self {
            ProvidedInterface::ServerProvider(provider) => Some(provider),
            ProvidedInterface::Watchdog(_) => None,
        }
    }

    pub fn into_watchdog(self) -> Option<Arc<Mutex<GlyphWatchdog>>> {
        match self {
            ProvidedInterface::Watchdog(watchdog) => Some(watchdog),
            ProvidedInterface::ServerProvider(_) => None,
        }
    }
}

/// Lazily created provider singletons keyed by interface name
#[derive(Default)]
pub struct DriverFactory {
    server: OnceLock<Arc<Mutex<GlyphServerProvider>>>,
    watchdog: OnceLock<Arc<Mutex<GlyphWatchdog>>>,
}

impl DriverFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, interface_name: &str) -> Result<ProvidedInterface, InitError> {
        match interface_name {
            SERVER_PROVIDER_VERSION => Ok(ProvidedInterface::ServerProvider(
                self.server.get_or_init(Default::default).clone(),
            )),
            WATCHDOG_PROVIDER_VERSION => Ok(ProvidedInterface::Watchdog(
                self.watchdog.get_or_init(Default::default).clone(),
            )),
            _ => {
                debug!("Factory miss for {}", interface_name);
                Err(InitError::InterfaceNotFound(interface_name.to_string()))
            }
        }
    }
}

static FACTORY: OnceLock<DriverFactory> = OnceLock::new();

/// Process-wide driver entry point
pub fn hmd_driver_factory(interface_name: &str) -> Result<ProvidedInterface, InitError> {
    FACTORY.get_or_init(DriverFactory::new).lookup(interface_name)
}
