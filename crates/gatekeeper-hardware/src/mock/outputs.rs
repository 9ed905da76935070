//! Recording output doubles for the actuation pins.

use crate::error::{HardwareError, Result};
use crate::traits::{OutputPin, PwmOutput};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct PinState {
    level: bool,
    changes: Vec<bool>,
}

/// Recording binary output line.
///
/// Every level change is appended to a history the handle can inspect, so
/// tests can assert the exact order a sequence drove the pin in.
#[derive(Debug)]
pub struct MockPin {
    state: Arc<Mutex<PinState>>,
}

/// Handle for inspecting a [`MockPin`].
#[derive(Debug, Clone)]
pub struct MockPinHandle {
    state: Arc<Mutex<PinState>>,
}

impl MockPin {
    /// Create a pin (initially low) with its inspection handle.
    pub fn new() -> (Self, MockPinHandle) {
        let state = Arc::new(Mutex::new(PinState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockPinHandle { state },
        )
    }
}

impl MockPinHandle {
    /// Current line level.
    pub fn level(&self) -> bool {
        self.state.lock().unwrap().level
    }

    /// Every level the pin was driven to, in order.
    pub fn changes(&self) -> Vec<bool> {
        self.state.lock().unwrap().changes.clone()
    }
}

impl OutputPin for MockPin {
    async fn set_level(&mut self, high: bool) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.level = high;
        state.changes.push(high);
        Ok(())
    }
}

#[derive(Debug, Default)]
struct PwmState {
    duty: f32,
    history: Vec<f32>,
}

/// Recording PWM channel.
///
/// Enforces the 0.0-1.0 duty contract the way a real driver would, so an
/// out-of-range table entry fails loudly in tests.
#[derive(Debug)]
pub struct MockPwm {
    state: Arc<Mutex<PwmState>>,
}

/// Handle for inspecting a [`MockPwm`].
#[derive(Debug, Clone)]
pub struct MockPwmHandle {
    state: Arc<Mutex<PwmState>>,
}

impl MockPwm {
    /// Create a silent channel with its inspection handle.
    pub fn new() -> (Self, MockPwmHandle) {
        let state = Arc::new(Mutex::new(PwmState::default()));
        (
            Self {
                state: Arc::clone(&state),
            },
            MockPwmHandle { state },
        )
    }
}

impl MockPwmHandle {
    /// Current duty cycle.
    pub fn duty(&self) -> f32 {
        self.state.lock().unwrap().duty
    }

    /// Every duty cycle the channel was set to, in order.
    pub fn history(&self) -> Vec<f32> {
        self.state.lock().unwrap().history.clone()
    }
}

impl PwmOutput for MockPwm {
    async fn set_duty(&mut self, duty: f32) -> Result<()> {
        if !(0.0..=1.0).contains(&duty) {
            return Err(HardwareError::invalid_argument(format!(
                "duty cycle must be 0.0-1.0, got {duty}"
            )));
        }

        let mut state = self.state.lock().unwrap();
        state.duty = duty;
        state.history.push(duty);
        Ok(())
    }
}
