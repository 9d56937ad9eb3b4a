use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use glyph_driver::display::{Eye, MonitorInfo, MonitorProbe};
use glyph_driver::driver::{ActivityState, DISPLAY_COMPONENT_VERSION};
use glyph_driver::host::mock::{MockHost, PropertyValue, SettingValue};
use glyph_driver::host::{
    DriverContext, Property, TrackedDeviceIndex, DRIVER_SECTION, IPD_KEY, STEAMVR_SECTION,
    USE_SBS_KEY,
};
use glyph_driver::input::{RawAxisState, ScriptedAxisSource};
use glyph_driver::pose::{pose_channel, TrackingResult};
use glyph_driver::provider::{SERVER_PROVIDER_VERSION, WATCHDOG_PROVIDER_VERSION};
use glyph_driver::{
    DriverConfig, DriverFactory, DriverPose, HeadsetDriver, InitError, TrackedDeviceServerDriver,
};

fn wait_for(mut condition: impl FnMut() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        assert!(Instant::now() < deadline, "condition not reached in time");
        thread::sleep(Duration::from_millis(1));
    }
}

fn headset(host: &Arc<MockHost>) -> HeadsetDriver {
    HeadsetDriver::new(&DriverContext::from_host(host.clone()))
}

#[test]
fn deactivate_stops_publishing() {
    let host = Arc::new(MockHost::new());
    let mut driver = headset(&host);
    driver.attach_sampler(Box::new(ScriptedAxisSource::sweep(64)));

    driver.activate(TrackedDeviceIndex(0)).unwrap();
    assert!(driver.is_polling());
    wait_for(|| host.publish_count() >= 10);

    let started = Instant::now();
    driver.deactivate();
    assert!(started.elapsed() < Duration::from_secs(1));
    assert!(!driver.is_polling());
    assert_eq!(driver.activity(), ActivityState::Inactive);

    let stopped_at = host.publish_count();
    thread::sleep(Duration::from_millis(20));
    assert_eq!(host.publish_count(), stopped_at);

    let pose = driver.get_pose();
    assert!(pose.pose_is_valid);
    assert!(pose.device_is_connected);
    assert_eq!(pose.result, TrackingResult::RunningOk);
}

#[test]
fn reactivation_reuses_sampler() {
    let host = Arc::new(MockHost::new());
    let mut driver = headset(&host);
    driver.attach_sampler(Box::new(ScriptedAxisSource::from_states([RawAxisState {
        x: 100,
        y: 200,
        z: 300,
    }])));

    for index in [0, 3] {
        driver.activate(TrackedDeviceIndex(index)).unwrap();
        wait_for(|| {
            host.last_pose()
                .map(|(last, _)| last == TrackedDeviceIndex(index))
                .unwrap_or(false)
        });
        driver.deactivate();
    }
    assert!(driver.has_input_device());
}

#[test]
fn activate_without_input_device() {
    let host = Arc::new(MockHost::new());
    let mut driver = headset(&host);

    assert_eq!(
        driver.activate(TrackedDeviceIndex(0)),
        Err(InitError::HmdNotFound)
    );
    assert!(!driver.is_polling());
    driver.deactivate();
    driver.deactivate();

    assert_eq!(host.publish_count(), 0);
    assert!(!driver.get_pose().pose_is_valid);
}

#[test]
fn failing_samples_keep_last_pose() {
    let host = Arc::new(MockHost::new());
    let mut driver = headset(&host);
    let first = RawAxisState { x: 0, y: 0, z: 0 };
    driver.attach_sampler(Box::new(ScriptedAxisSource::new(vec![
        Some(first),
        None,
        None,
        None,
    ])));

    driver.activate(TrackedDeviceIndex(0)).unwrap();
    wait_for(|| host.publish_count() >= 3);
    driver.deactivate();

    assert_eq!(driver.get_pose(), DriverPose::from_raw(&first, -0.016));
}

#[test]
fn display_component_lookup() {
    let host = Arc::new(MockHost::new());
    let driver = headset(&host);

    let component = driver.get_component(DISPLAY_COMPONENT_VERSION).unwrap();
    assert!(Arc::ptr_eq(component.as_display().unwrap(), &driver.display()));

    assert!(driver.get_component("IVRCameraComponent_003").is_none());
    assert!(driver.get_component("").is_none());
}

#[test]
fn settings_override_config() {
    let host = Arc::new(
        MockHost::new()
            .with_setting(STEAMVR_SECTION, IPD_KEY, SettingValue::Float(0.058))
            .with_setting(DRIVER_SECTION, USE_SBS_KEY, SettingValue::Bool(true)),
    );
    let mut driver = headset(&host);
    driver.attach_sampler(Box::new(ScriptedAxisSource::sweep(4)));

    let display = driver.display();
    assert_eq!(display.eye_output_viewport(Eye::Left).width, 640);
    assert_eq!(display.eye_output_viewport(Eye::Right).x, 640);
    assert_eq!(display.recommended_render_target_size(), (1280, 720));

    driver.activate(TrackedDeviceIndex(1)).unwrap();
    driver.deactivate();

    let props = host.properties();
    assert_eq!(
        props.get(&Property::UserIpdMeters),
        Some(&PropertyValue::Float(0.058))
    );
    assert_eq!(
        props.get(&Property::UserHeadToEyeDepthMeters),
        Some(&PropertyValue::Float(0.0))
    );
    assert_eq!(
        props.get(&Property::SecondsFromVsyncToPhotons),
        Some(&PropertyValue::Float(0.0))
    );
}

struct FixedMonitor(MonitorInfo);

impl MonitorProbe for FixedMonitor {
    fn find_monitor(&self, id_prefix: &str) -> Option<MonitorInfo> {
        self.0.device_id.starts_with(id_prefix).then(|| self.0.clone())
    }
}

#[test]
fn monitor_probe_sets_geometry() {
    let host = Arc::new(MockHost::new());
    let probe = Arc::new(FixedMonitor(MonitorInfo {
        device_id: "MONITOR\\AVG0065\\{4d36e96e}".to_string(),
        x: 1920,
        y: 0,
        width: 1280,
        height: 720,
        refresh_rate: 60.0,
    }));
    let context = DriverContext::from_host(host.clone()).with_monitor_probe(probe);
    let driver = HeadsetDriver::new(&context);

    let window = driver.display().window_bounds();
    assert_eq!((window.x, window.y), (1920, 0));
    assert_eq!((window.width, window.height), (1280, 720));
}

#[test]
fn configured_identity_is_reported() {
    let host = Arc::new(MockHost::new());
    let mut config = DriverConfig::default();
    config.device.serial_number = "Glyph042".to_string();
    config.display.refresh_rate = 120.0;
    let context = DriverContext::from_host(host.clone()).with_config(config);

    let mut driver = HeadsetDriver::new(&context);
    assert_eq!(driver.serial_number(), "Glyph042");
    driver.attach_sampler(Box::new(ScriptedAxisSource::sweep(2)));
    driver.activate(TrackedDeviceIndex(0)).unwrap();
    driver.deactivate();

    assert_eq!(
        host.properties().get(&Property::DisplayFrequency),
        Some(&PropertyValue::Float(120.0))
    );
    assert_eq!(driver.display_geometry().refresh_rate, 120.0);
}

#[test]
fn factory_lookup() {
    let factory = DriverFactory::new();

    let a = factory
        .lookup(SERVER_PROVIDER_VERSION)
        .unwrap()
        .into_server_provider()
        .unwrap();
    let b = factory
        .lookup(SERVER_PROVIDER_VERSION)
        .unwrap()
        .into_server_provider()
        .unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert!(factory.lookup(WATCHDOG_PROVIDER_VERSION).is_ok());

    match factory.lookup("IVRDriverManager_001") {
        Err(InitError::InterfaceNotFound(name)) => assert_eq!(name, "IVRDriverManager_001"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("unknown interface resolved"),
    }
}

#[test]
fn poses_stay_unit_length_under_concurrent_reads() {
    let host = Arc::new(MockHost::new());
    let mut driver = headset(&host);
    driver.attach_sampler(Box::new(ScriptedAxisSource::sweep(257)));
    driver.activate(TrackedDeviceIndex(0)).unwrap();
    wait_for(|| host.publish_count() > 0);

    for _ in 0..1000 {
        let pose = driver.get_pose();
        assert!(pose.pose_is_valid);
        assert!((pose.rotation.magnitude() - 1.0).abs() < 1e-9);
        thread::sleep(Duration::from_micros(100));
    }
    driver.deactivate();
}

#[test]
fn pose_cell_readers_never_see_torn_values() {
    let (publisher, reader) = pose_channel(DriverPose::default());
    let writer = thread::spawn(move || {
        for step in 0..4000 {
            let raw = RawAxisState {
                x: step * 16,
                y: 65535 - step * 16,
                z: step * 8,
            };
            publisher.publish(DriverPose::from_raw(&raw, -0.016));
            thread::sleep(Duration::from_micros(250));
        }
    });

    for _ in 0..1000 {
        let pose = reader.latest();
        if pose.pose_is_valid {
            assert!((pose.rotation.magnitude() - 1.0).abs() < 1e-9);
            assert_eq!(pose.pose_time_offset, -0.016);
        }
        thread::sleep(Duration::from_micros(500));
    }
    writer.join().unwrap();
}
