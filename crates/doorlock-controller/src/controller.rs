//! The door control loop.
//!
//! [`DoorController`] wires the reader, the lockout policy, the persisted
//! record, the power-fail latch and the actuator together. The caller owns
//! timing: it calls [`poll`](DoorController::poll) at the poll cadence and
//! [`on_second_elapsed`](DoorController::on_second_elapsed) once per second.
//!
//! ```text
//! poll():
//!   latch set?        -> save record now
//!   tag available?    -> evaluate -> actuator -> save record
//!
//! on_second_elapsed():
//!   lockout running?  -> count down -> save record
//!   unlock held?      -> count down -> relock -> save record
//! ```
//!
//! Storage and actuator failures are logged and never stop the loop; the
//! in-memory record stays authoritative and the next save retries.

use doorlock_core::LockCommand;
use doorlock_core::constants::DEFAULT_UNLOCK_HOLD_SECONDS;
use doorlock_hardware::{LockActuator, PowerFailLatch};
use doorlock_rfid::TagReader;
use doorlock_storage::{ByteStorage, PersistedSecurityState, SecurityStateStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::access::AccessList;
use crate::events::{AccessEvent, AccessLog, DEFAULT_EVENT_LOG_CAPACITY};
use crate::policy::{Evaluation, LockoutPolicy, PolicyConfig, Tick};

/// Controller settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControllerConfig {
    pub policy: PolicyConfig,

    /// Seconds a granted unlock is held before relocking; 0 holds until the
    /// next wrong tag.
    pub unlock_hold_seconds: u16,

    pub event_log_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            policy: PolicyConfig::default(),
            unlock_hold_seconds: DEFAULT_UNLOCK_HOLD_SECONDS,
            event_log_capacity: DEFAULT_EVENT_LOG_CAPACITY,
        }
    }
}

/// Access-control core for one door.
#[derive(Debug)]
pub struct DoorController<R, B, A, L> {
    reader: R,
    store: SecurityStateStore<B>,
    actuator: A,
    access: L,
    latch: PowerFailLatch,
    policy: LockoutPolicy,
    config: ControllerConfig,
    relock_in: Option<u16>,
    events: AccessLog,
}

impl<R, B, A, L> DoorController<R, B, A, L>
where
    R: TagReader,
    B: ByteStorage,
    A: LockActuator,
    L: AccessList,
{
    /// Load the persisted record and bring the door to a known state.
    ///
    /// The record is validated against the configured limits. The lock is
    /// always driven closed at start-up; a record that says `Unlocked` is
    /// rewritten as `Locked`. If the storage cannot be read the controller
    /// starts from the defaults.
    pub fn start(
        reader: R,
        storage: B,
        actuator: A,
        access: L,
        latch: PowerFailLatch,
        config: ControllerConfig,
    ) -> Self {
        let mut store = SecurityStateStore::with_limits(storage, config.policy.limits());
        let record = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "security record unreadable, starting from defaults");
            PersistedSecurityState::default()
        });

        let mut controller = Self {
            reader,
            store,
            actuator,
            access,
            latch,
            policy: LockoutPolicy::from_record(config.policy, record),
            events: AccessLog::with_capacity(config.event_log_capacity),
            config,
            relock_in: None,
        };

        if controller.policy.relock() {
            info!("persisted state was Unlocked, relocking");
            controller.persist();
        }
        controller.drive(LockCommand::Lock);

        let record = controller.policy.record();
        info!(
            state = %controller.policy.state(),
            wrong_attempts = record.wrong_attempts,
            lockout_remaining = record.lockout_seconds_remaining,
            "door controller started"
        );
        controller
    }

    /// One pass of the control loop.
    ///
    /// Returns the evaluation of the tag read during this pass, if any.
    pub fn poll(&mut self) -> Option<Evaluation> {
        if self.latch.take() {
            self.power_fail();
        }

        if !self.reader.tag_available() {
            return None;
        }
        let tag = self.reader.take_tag()?;

        let authorized = !self.policy.is_locked_out() && self.access.is_authorized(&tag);
        let evaluation = self.policy.evaluate(authorized);
        match evaluation {
            Evaluation::Granted => info!(%tag, "access granted"),
            Evaluation::Denied { attempts } => info!(%tag, attempts, "access denied"),
            Evaluation::LockoutStarted { seconds } => {
                warn!(%tag, seconds, "access denied, lockout started");
            }
            Evaluation::Ignored { remaining } => debug!(%tag, remaining, "tag discarded"),
        }

        if let Some(command) = evaluation.command() {
            self.relock_in = match command {
                LockCommand::Unlock if self.config.unlock_hold_seconds > 0 => {
                    Some(self.config.unlock_hold_seconds)
                }
                _ => None,
            };
            self.drive(command);
        }
        if evaluation.changed_record() {
            self.persist();
        }

        self.events.record(AccessEvent::now(tag, evaluation));
        Some(evaluation)
    }

    /// Advance the lockout countdown and the unlock hold by one second.
    pub fn on_second_elapsed(&mut self) -> Tick {
        let tick = self.policy.tick_second();
        if tick != Tick::Idle {
            self.persist();
        }

        if let Some(remaining) = self.relock_in {
            if remaining <= 1 {
                self.relock_in = None;
                if self.policy.relock() {
                    info!("unlock hold expired, relocking");
                    self.drive(LockCommand::Lock);
                    self.persist();
                }
            } else {
                self.relock_in = Some(remaining - 1);
            }
        }

        tick
    }

    /// Save the current record immediately.
    ///
    /// Called from [`poll`](Self::poll) when the power-fail latch is set, and
    /// directly on shutdown. The reader is not touched.
    pub fn power_fail(&mut self) {
        warn!(
            lockout_remaining = self.policy.record().lockout_seconds_remaining,
            "power failure detected, saving state"
        );
        self.persist();
    }

    pub fn policy(&self) -> &LockoutPolicy {
        &self.policy
    }

    pub fn record(&self) -> &PersistedSecurityState {
        self.policy.record()
    }

    pub fn events(&self) -> &AccessLog {
        &self.events
    }

    pub fn latch(&self) -> &PowerFailLatch {
        &self.latch
    }

    pub fn reader_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn store(&self) -> &SecurityStateStore<B> {
        &self.store
    }

    /// Seconds left before an open lock relocks.
    pub fn relock_in(&self) -> Option<u16> {
        self.relock_in
    }

    fn persist(&mut self) -> bool {
        match self.store.save(self.policy.record()) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to save security record");
                false
            }
        }
    }

    fn drive(&mut self, command: LockCommand) {
        if let Err(e) = self.actuator.apply(command) {
            warn!(error = %e, %command, "lock actuator failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AuthorizedTags;
    use doorlock_core::LockState;
    use doorlock_hardware::mock::{MockActuator, MockActuatorHandle};
    use doorlock_rfid::{ScriptedSource, SerialTagReader};
    use doorlock_storage::MemoryStorage;

    type TestController =
        DoorController<SerialTagReader<ScriptedSource>, MemoryStorage, MockActuator, AuthorizedTags>;

    const GOOD: &str = "04:AB:10:9F";

    fn controller(config: ControllerConfig) -> (TestController, MemoryStorage, MockActuatorHandle) {
        let backing = MemoryStorage::new();
        let (actuator, handle) = MockActuator::new();
        let controller = DoorController::start(
            SerialTagReader::new(ScriptedSource::new()),
            backing.clone(),
            actuator,
            AuthorizedTags::parse([GOOD]).unwrap(),
            PowerFailLatch::new(),
            config,
        );
        (controller, backing, handle)
    }

    fn present(controller: &mut TestController, line: &str) -> Option<Evaluation> {
        controller.reader_mut().source_mut().push_line(line);
        controller.poll()
    }

    #[test]
    fn test_start_drives_lock() {
        let (controller, backing, handle) = controller(ControllerConfig::default());

        assert_eq!(handle.commands(), vec![LockCommand::Lock]);
        assert_eq!(*controller.record(), PersistedSecurityState::default());
        assert_eq!(&backing.snapshot()[..5], &[0xA5, 0, 0, 0, 0xA5]);
    }

    #[test]
    fn test_grant_unlocks_and_persists() {
        let (mut controller, backing, handle) = controller(ControllerConfig::default());

        assert_eq!(present(&mut controller, GOOD), Some(Evaluation::Granted));
        assert_eq!(handle.last_command(), Some(LockCommand::Unlock));
        assert_eq!(backing.snapshot()[1], LockState::Unlocked.to_u8());
        assert_eq!(controller.relock_in(), Some(5));
        assert_eq!(controller.events().len(), 1);
    }

    #[test]
    fn test_unlock_hold_relocks() {
        let (mut controller, backing, handle) = controller(ControllerConfig::default());
        present(&mut controller, GOOD);

        for _ in 0..4 {
            controller.on_second_elapsed();
            assert_eq!(handle.state(), LockState::Unlocked);
        }
        controller.on_second_elapsed();

        assert_eq!(handle.state(), LockState::Locked);
        assert_eq!(controller.relock_in(), None);
        assert_eq!(backing.snapshot()[1], LockState::Locked.to_u8());
    }

    #[test]
    fn test_zero_hold_keeps_unlocked() {
        let config = ControllerConfig {
            unlock_hold_seconds: 0,
            ..ControllerConfig::default()
        };
        let (mut controller, _, handle) = controller(config);
        present(&mut controller, GOOD);

        for _ in 0..10 {
            controller.on_second_elapsed();
        }
        assert_eq!(handle.state(), LockState::Unlocked);
    }

    #[test]
    fn test_wrong_tag_cancels_hold() {
        let (mut controller, _, handle) = controller(ControllerConfig::default());
        present(&mut controller, GOOD);

        assert_eq!(
            present(&mut controller, "01:02:03:04"),
            Some(Evaluation::Denied { attempts: 1 })
        );
        assert_eq!(handle.state(), LockState::Locked);
        assert_eq!(controller.relock_in(), None);
    }

    #[test]
    fn test_persisted_unlocked_normalized() {
        let backing = MemoryStorage::new();
        let mut store = SecurityStateStore::new(backing.clone());
        store
            .save(&PersistedSecurityState {
                lock_state: LockState::Unlocked,
                wrong_attempts: 1,
                lockout_seconds_remaining: 0,
            })
            .unwrap();

        let (actuator, handle) = MockActuator::new();
        let controller = DoorController::start(
            SerialTagReader::new(ScriptedSource::new()),
            backing.clone(),
            actuator,
            AuthorizedTags::default(),
            PowerFailLatch::new(),
            ControllerConfig::default(),
        );

        assert_eq!(handle.commands(), vec![LockCommand::Lock]);
        assert_eq!(controller.record().lock_state, LockState::Locked);
        assert_eq!(controller.record().wrong_attempts, 1);
        assert_eq!(&backing.snapshot()[..5], &[0xA5, 0, 1, 0, 0xA5 ^ 1]);
    }

    #[test]
    fn test_save_failure_does_not_stop_loop() {
        let (mut controller, backing, handle) = controller(ControllerConfig::default());
        backing.reject_writes(true);

        assert_eq!(present(&mut controller, GOOD), Some(Evaluation::Granted));
        assert_eq!(handle.state(), LockState::Unlocked);
        assert_eq!(controller.record().lock_state, LockState::Unlocked);
        assert_eq!(backing.snapshot()[1], LockState::Locked.to_u8());

        backing.reject_writes(false);
        controller.power_fail();
        assert_eq!(backing.snapshot()[1], LockState::Unlocked.to_u8());
    }

    #[test]
    fn test_power_fail_leaves_pending_tag_unread() {
        let (mut controller, backing, handle) = controller(ControllerConfig::default());
        controller.reader_mut().source_mut().push_line("01:02:03:04");

        controller.power_fail();

        assert!(controller.events().is_empty());
        assert_eq!(handle.commands(), vec![LockCommand::Lock]);
        assert_eq!(*controller.record(), PersistedSecurityState::default());
        assert_eq!(&backing.snapshot()[..5], &[0xA5, 0, 0, 0, 0xA5]);

        // Still queued for the next pass of the loop.
        assert_eq!(controller.poll(), Some(Evaluation::Denied { attempts: 1 }));
    }

    #[test]
    fn test_actuator_failure_logged() {
        let (mut controller, _, handle) = controller(ControllerConfig::default());
        handle.fail_next();

        assert_eq!(present(&mut controller, GOOD), Some(Evaluation::Granted));
        assert_eq!(controller.record().lock_state, LockState::Unlocked);
    }

    #[test]
    fn test_no_tag_no_event() {
        let (mut controller, _, _) = controller(ControllerConfig::default());
        assert_eq!(controller.poll(), None);
        assert!(controller.events().is_empty());
    }
}
