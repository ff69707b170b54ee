//! Mock lock actuator.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use doorlock_core::{LockCommand, LockState};

use crate::error::{HardwareError, Result};
use crate::traits::LockActuator;

#[derive(Debug, Default)]
struct ActuatorLog {
    commands: Vec<LockCommand>,
    fail_next: bool,
}

/// Actuator that records every command it receives.
///
/// Returns a (MockActuator, MockActuatorHandle) pair; the handle inspects the
/// command history and can inject a failure.
///
/// # Examples
///
/// ```
/// use doorlock_core::LockCommand;
/// use doorlock_hardware::LockActuator;
/// use doorlock_hardware::mock::MockActuator;
///
/// let (mut actuator, handle) = MockActuator::new();
/// actuator.apply(LockCommand::Unlock).unwrap();
///
/// assert_eq!(handle.commands(), vec![LockCommand::Unlock]);
/// ```
#[derive(Debug)]
pub struct MockActuator {
    log: Arc<Mutex<ActuatorLog>>,
}

impl MockActuator {
    pub fn new() -> (Self, MockActuatorHandle) {
        let log = Arc::new(Mutex::new(ActuatorLog::default()));
        (
            Self {
                log: Arc::clone(&log),
            },
            MockActuatorHandle { log },
        )
    }
}

impl LockActuator for MockActuator {
    fn apply(&mut self, command: LockCommand) -> Result<()> {
        let mut log = lock(&self.log);
        if log.fail_next {
            log.fail_next = false;
            return Err(HardwareError::bus("injected actuator failure"));
        }
        log.commands.push(command);
        Ok(())
    }
}

/// Handle for inspecting a [`MockActuator`].
#[derive(Debug, Clone)]
pub struct MockActuatorHandle {
    log: Arc<Mutex<ActuatorLog>>,
}

impl MockActuatorHandle {
    /// Every command applied so far, oldest first.
    pub fn commands(&self) -> Vec<LockCommand> {
        lock(&self.log).commands.clone()
    }

    /// The most recent command, if any.
    pub fn last_command(&self) -> Option<LockCommand> {
        lock(&self.log).commands.last().copied()
    }

    /// State implied by the most recent command (Locked if none).
    pub fn state(&self) -> LockState {
        self.last_command()
            .map_or(LockState::Locked, LockCommand::target_state)
    }

    /// Number of Unlock commands applied.
    pub fn unlock_count(&self) -> usize {
        lock(&self.log)
            .commands
            .iter()
            .filter(|c| **c == LockCommand::Unlock)
            .count()
    }

    /// Make the next `apply` fail without recording the command.
    pub fn fail_next(&self) {
        lock(&self.log).fail_next = true;
    }

    /// Forget recorded commands.
    pub fn clear(&self) {
        lock(&self.log).commands.clear();
    }
}

fn lock(log: &Mutex<ActuatorLog>) -> MutexGuard<'_, ActuatorLog> {
    log.lock().unwrap_or_else(PoisonError::into_inner)
}
