use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use color_eyre::{eyre::eyre, Result};
use glyph_driver::driver::TrackedDeviceServerDriver;
use glyph_driver::host::console::ConsoleHost;
use glyph_driver::host::{DriverContext, TrackedDeviceIndex};
use glyph_driver::logging::init_driver_log;
use glyph_driver::provider::{ServerTrackedDeviceProvider, SERVER_PROVIDER_VERSION};
use glyph_driver::{hmd_driver_factory, DriverConfig};
use tracing::{error, info, warn};

// Frame rate of the simulated host loop
const FRAME_INTERVAL: Duration = Duration::from_micros(11_111);

#[tokio::main]
async fn main() -> Result<()> {
    let config = setup()?;

    let host = Arc::new(ConsoleHost::new(config.polling.stats_interval_secs));
    let context = DriverContext::from_host(host.clone()).with_config(config);

    let provider = hmd_driver_factory(SERVER_PROVIDER_VERSION)?
        .into_server_provider()
        .ok_or_else(|| eyre!("Factory returned the wrong interface"))?;

    lock(&provider)?.init(context)?;
    let device = lock(&provider)?
        .device()
        .ok_or_else(|| eyre!("Provider did not create a headset"))?;

    // Keep running without a controller so the display setup can be inspected
    if let Err(e) = lock(&device)?.activate(TrackedDeviceIndex(0)) {
        error!("Activation failed: {}", e);
    }

    info!("Running, press Ctrl-C to stop");
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut frames = tokio::time::interval(FRAME_INTERVAL);
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = frames.tick() => {
                lock(&provider)?.run_frame();
                let _pose = lock(&device)?.get_pose();
            }
        }
    }

    info!("Shutting down after {} poses", host.pose_count());
    lock(&device)?.deactivate();
    lock(&provider)?.cleanup();
    Ok(())
}

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>> {
    mutex.lock().map_err(|_| eyre!("Driver state poisoned"))
}

fn setup() -> Result<DriverConfig> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;

    let path = match std::env::args_os().nth(1) {
        Some(arg) => Some(PathBuf::from(arg)),
        None => DriverConfig::default_path(),
    };
    let mut config = match &path {
        Some(path) => DriverConfig::load_or_default(path),
        None => DriverConfig::default(),
    };

    if let Ok(filter) = std::env::var("RUST_LOG") {
        config.logging.filter = filter;
    }
    init_driver_log(&config.logging.filter)?;

    match &path {
        Some(path) => info!("Configuration from {}", path.display()),
        None => warn!("No configuration directory, using defaults"),
    }
    Ok(config)
}
