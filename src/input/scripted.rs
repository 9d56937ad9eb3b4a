//! Replayable axis source
//!
//! Cycles through a fixed list of steps; `None` steps simulate a lost
//! controller so the driver's skip-on-failure path can be exercised without
//! hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::debug;

use super::{AxisSource, RawAxisState, Sample};

#[derive(Debug, Clone)]
pub struct ScriptedAxisSource {
    steps: Vec<Option<RawAxisState>>,
    cursor: usize,
    last_state: RawAxisState,
    polls: Arc<AtomicUsize>,
}

impl ScriptedAxisSource {
    pub fn new(steps: Vec<Option<RawAxisState>>) -> Self {
        Self {
            steps,
            cursor: 0,
            last_state: RawAxisState::default(),
            polls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Source that always succeeds with the given states
    pub fn from_states(states: impl IntoIterator<Item = RawAxisState>) -> Self {
        Self::new(states.into_iter().map(Some).collect())
    }

    /// Slow sweep of all three axes across the raw range
    pub fn sweep(steps: usize) -> Self {
        let steps = steps.max(1);
        let span = i64::from(crate::pose::RAW_AXIS_MAX);
        Self::from_states((0..steps).map(|i| {
            let value = (span * i as i64 / steps as i64) as i32;
            RawAxisState {
                x: value,
                y: value / 2,
                z: crate::pose::RAW_AXIS_MAX - value,
            }
        }))
    }

    /// Shared counter of `poll` calls, readable after the source moved threads
    pub fn poll_counter(&self) -> Arc<AtomicUsize> {
        self.polls.clone()
    }
}

impl AxisSource for ScriptedAxisSource {
    fn poll(&mut self) -> Sample {
        self.polls.fetch_add(1, Ordering::SeqCst);

        let step = if self.steps.is_empty() {
            None
        } else {
            let step = self.steps[self.cursor % self.steps.len()];
            self.cursor = (self.cursor + 1) % self.steps.len();
            step
        };

        match step {
            Some(state) => {
                self.last_state = state;
                Sample::Fresh(state)
            }
            None => {
                debug!("Scripted source simulating acquisition loss");
                Sample::Cached(self.last_state)
            }
        }
    }

    fn last_state(&self) -> RawAxisState {
        self.last_state
    }

    fn describe(&self) -> String {
        format!("scripted source ({} steps)", self.steps.len())
    }
}
