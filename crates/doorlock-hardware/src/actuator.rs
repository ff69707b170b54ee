//! Lock actuator implementations.

use doorlock_core::{LockCommand, LockState};
use tracing::info;

use crate::error::Result;
use crate::traits::{LockActuator, OutputPin};

/// Actuator driving a lock output and a status LED.
///
/// Unlock drives both lines high, Lock drives both low.
#[derive(Debug)]
pub struct PinActuator<P: OutputPin> {
    lock_pin: P,
    status_led: P,
    state: LockState,
}

impl<P: OutputPin> PinActuator<P> {
    /// Create an actuator and drive it to Locked.
    ///
    /// # Errors
    ///
    /// Returns an error if either line cannot be driven.
    pub fn new(lock_pin: P, status_led: P) -> Result<Self> {
        let mut actuator = Self {
            lock_pin,
            status_led,
            state: LockState::Locked,
        };
        actuator.apply(LockCommand::Lock)?;
        Ok(actuator)
    }

    /// Last commanded state.
    pub fn state(&self) -> LockState {
        self.state
    }
}

impl<P: OutputPin> LockActuator for PinActuator<P> {
    fn apply(&mut self, command: LockCommand) -> Result<()> {
        let high = command == LockCommand::Unlock;
        self.lock_pin.set_level(high)?;
        self.status_led.set_level(high)?;
        self.state = command.target_state();
        Ok(())
    }
}

/// Actuator that only logs commands.
///
/// Used by the simulated build where there is no lock to drive.
#[derive(Debug, Default)]
pub struct LogActuator {
    state: LockState,
}

impl LogActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last commanded state.
    pub fn state(&self) -> LockState {
        self.state
    }
}

impl LockActuator for LogActuator {
    fn apply(&mut self, command: LockCommand) -> Result<()> {
        self.state = command.target_state();
        info!(state = %self.state, "lock actuator driven");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPin;

    #[test]
    fn test_pin_actuator_starts_locked() {
        let lock = MockPin::new();
        let led = MockPin::new();
        let actuator = PinActuator::new(lock.clone(), led.clone()).unwrap();

        assert_eq!(actuator.state(), LockState::Locked);
        assert!(!lock.is_high());
        assert!(!led.is_high());
    }

    #[test]
    fn test_pin_actuator_unlock_drives_both_lines_high() {
        let lock = MockPin::new();
        let led = MockPin::new();
        let mut actuator = PinActuator::new(lock.clone(), led.clone()).unwrap();

        actuator.apply(LockCommand::Unlock).unwrap();
        assert!(lock.is_high());
        assert!(led.is_high());
        assert_eq!(actuator.state(), LockState::Unlocked);

        actuator.apply(LockCommand::Lock).unwrap();
        assert!(!lock.is_high());
        assert!(!led.is_high());
    }

    #[test]
    fn test_log_actuator_tracks_state() {
        let mut actuator = LogActuator::new();
        assert!(actuator.state().is_locked());

        actuator.apply(LockCommand::Unlock).unwrap();
        assert_eq!(actuator.state(), LockState::Unlocked);
    }
}
