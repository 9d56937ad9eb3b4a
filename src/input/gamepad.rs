use gilrs::{Event, EventType, Gamepad, GamepadId, Gilrs};
use statum::{machine, state};
use tracing::{debug, error, info, warn};

use super::{AxisBindings, AxisSource, InputIdentity, RawAxisState, Sample};
use crate::error::SamplerError;

// Sampler lifecycle
#[state]
#[derive(Debug, Clone)]
pub enum SamplerState {
    Discovering,
    Sampling,
}

#[machine]
#[derive(Debug)]
pub struct JoystickSampler<S: SamplerState> {
    // Gilrs context
    gilrs: Gilrs,

    // Selected headset controller
    active_gamepad: Option<GamepadId>,

    // Identity the controller must match
    identity: InputIdentity,

    // Controller axis per rotation
    bindings: AxisBindings,

    // Last successful read, returned while the controller is lost
    last_state: RawAxisState,
}

impl<S: SamplerState> JoystickSampler<S> {
    pub fn identity(&self) -> &InputIdentity {
        &self.identity
    }

    pub fn active_gamepad(&self) -> Option<GamepadId> {
        self.active_gamepad
    }

    // First connected controller matching the identity, logging the rest
    fn find_matching(&self) -> Option<GamepadId> {
        for (id, gamepad) in self.gilrs.gamepads() {
            if self.is_match(&gamepad) {
                info!(
                    "Headset controller found: {} [{:04x?}:{:04x?}] ({})",
                    gamepad.name(),
                    gamepad.vendor_id(),
                    gamepad.product_id(),
                    id
                );
                return Some(id);
            }
            debug!(
                "Skipping non-headset controller: {} [{:04x?}:{:04x?}] ({})",
                gamepad.name(),
                gamepad.vendor_id(),
                gamepad.product_id(),
                id
            );
        }
        None
    }

    fn is_match(&self, gamepad: &Gamepad<'_>) -> bool {
        self.identity
            .matches(gamepad.vendor_id(), gamepad.product_id(), gamepad.name())
    }
}

impl JoystickSampler<Discovering> {
    pub fn create(
        identity: InputIdentity,
        bindings: AxisBindings,
    ) -> Result<Self, SamplerError> {
        debug!("Creating joystick sampler for {}", identity);

        info!("Initializing gilrs controller interface");
        let gilrs = match Gilrs::new() {
            Ok(g) => {
                info!("Successfully initialized gilrs");
                g
            }
            Err(e) => {
                error!("Failed to initialize gilrs: {}", e);
                return Err(SamplerError::InitializationError(e.to_string()));
            }
        };

        Ok(Self::new(
            gilrs,
            None,
            identity,
            bindings,
            RawAxisState::default(),
        ))
    }

    // Select the headset controller and transition to Sampling
    pub fn discover(mut self) -> Result<JoystickSampler<Sampling>, SamplerError> {
        let count = self.gilrs.gamepads().count();
        info!("Enumerating {} connected controllers", count);

        match self.find_matching() {
            Some(id) => {
                self.active_gamepad = Some(id);
                info!("Joystick sampler ready, transitioning to Sampling state");
                Ok(self.transition())
            }
            None => {
                warn!("No controller matches headset identity {}", self.identity);
                Err(SamplerError::NoMatchingDevice(self.identity.to_string()))
            }
        }
    }
}

impl JoystickSampler<Sampling> {
    // Drain pending events so gilrs' cached axis values are current
    fn pump_events(&mut self) {
        while let Some(Event { id, event, .. }) = self.gilrs.next_event() {
            if Some(id) != self.active_gamepad {
                continue;
            }
            match event {
                EventType::Disconnected => warn!("Headset controller disconnected"),
                EventType::Connected => info!("Headset controller reconnected"),
                _ => {}
            }
        }
    }

    fn read(&self) -> Result<RawAxisState, SamplerError> {
        let id = self.active_gamepad.ok_or(SamplerError::NotConnected)?;
        let gamepad = self
            .gilrs
            .connected_gamepad(id)
            .ok_or_else(|| SamplerError::AcquisitionLost(id.to_string()))?;

        Ok(RawAxisState {
            x: self.bindings.x.to_raw(gamepad.value(self.bindings.x.channel.into())),
            y: self.bindings.y.to_raw(gamepad.value(self.bindings.y.channel.into())),
            z: self.bindings.z.to_raw(gamepad.value(self.bindings.z.channel.into())),
        })
    }

    fn reacquire(&mut self) {
        match self.find_matching() {
            Some(id) => {
                if Some(id) != self.active_gamepad {
                    info!("Re-acquired headset controller as {}", id);
                }
                self.active_gamepad = Some(id);
            }
            None => debug!("Headset controller still unavailable"),
        }
    }
}

impl AxisSource for JoystickSampler<Sampling> {
    fn poll(&mut self) -> Sample {
        self.pump_events();

        match self.read() {
            Ok(state) => {
                self.last_state = state;
                Sample::Fresh(state)
            }
            Err(e) => {
                debug!("Joystick read failed: {}, re-acquiring", e);
                self.reacquire();
                Sample::Cached(self.last_state)
            }
        }
    }

    fn last_state(&self) -> RawAxisState {
        self.last_state
    }

    fn describe(&self) -> String {
        match self.active_gamepad.and_then(|id| self.gilrs.connected_gamepad(id)) {
            Some(gamepad) => format!("{} ({})", gamepad.name(), self.identity),
            None => format!("disconnected ({})", self.identity),
        }
    }
}
