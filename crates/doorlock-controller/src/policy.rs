//! Wrong-attempt lockout policy.
//!
//! The policy owns the in-memory copy of the persisted security record and
//! decides, for every presented tag and every elapsed second, how that
//! record changes and which command the lock receives.
//!
//! # States
//!
//! - `Active`: tags are evaluated; `lockoutSecondsRemaining == 0`
//! - `LockedOut`: tags are ignored; the countdown is running
//!
//! # Transitions
//!
//! ```text
//! ┌────────┐  wrong tag, attempts reach max   ┌───────────┐
//! │ Active │─────────────────────────────────>│ LockedOut │
//! └────────┘                                  └───────────┘
//!      ^        countdown reaches zero              │
//!      └────────────────────────────────────────────┘
//! ```
//!
//! Entering `LockedOut` sets the countdown to the configured lockout and
//! resets the attempt counter, so each episode starts exactly once.
//!
//! # Examples
//!
//! ```
//! use doorlock_controller::{Evaluation, LockoutPolicy, PolicyConfig, PolicyState};
//!
//! let mut policy = LockoutPolicy::new(PolicyConfig::default());
//!
//! policy.evaluate(false);
//! policy.evaluate(false);
//! assert_eq!(policy.evaluate(false), Evaluation::LockoutStarted { seconds: 30 });
//! assert_eq!(policy.state(), PolicyState::LockedOut);
//!
//! assert_eq!(policy.evaluate(true), Evaluation::Ignored { remaining: 30 });
//! ```

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use doorlock_core::constants::{LOCKOUT_SECONDS, MAX_WRONG_ATTEMPTS};
use doorlock_core::{Error, LockCommand, LockState, Result};
use doorlock_storage::{PersistedSecurityState, RecordLimits};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Maximum number of state transitions kept in history.
const MAX_HISTORY_SIZE: usize = 100;

/// Policy limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Consecutive wrong tags that start a lockout.
    pub max_wrong_attempts: u8,

    /// Lockout duration in seconds.
    pub lockout_seconds: u8,
}

impl PolicyConfig {
    /// # Errors
    ///
    /// `Error::Config` if either limit is zero.
    pub fn new(max_wrong_attempts: u8, lockout_seconds: u8) -> Result<Self> {
        if max_wrong_attempts == 0 {
            return Err(Error::Config("max_wrong_attempts must be at least 1".into()));
        }
        if lockout_seconds == 0 {
            return Err(Error::Config("lockout_seconds must be at least 1".into()));
        }
        Ok(Self {
            max_wrong_attempts,
            lockout_seconds,
        })
    }

    /// Range limits a stored record must satisfy under this policy.
    pub fn limits(&self) -> RecordLimits {
        RecordLimits {
            max_wrong_attempts: self.max_wrong_attempts,
            lockout_seconds: self.lockout_seconds,
        }
    }
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_wrong_attempts: MAX_WRONG_ATTEMPTS,
            lockout_seconds: LOCKOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyState {
    Active,
    LockedOut,
}

impl PolicyState {
    fn of(record: &PersistedSecurityState) -> Self {
        if record.is_locked_out() {
            PolicyState::LockedOut
        } else {
            PolicyState::Active
        }
    }
}

impl fmt::Display for PolicyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyState::Active => write!(f, "Active"),
            PolicyState::LockedOut => write!(f, "LockedOut"),
        }
    }
}

/// A recorded change of [`PolicyState`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyTransition {
    pub from: PolicyState,
    pub to: PolicyState,

    /// Process-local; not serialized.
    #[serde(skip, default = "Instant::now")]
    pub timestamp: Instant,
}

impl PolicyTransition {
    fn new(from: PolicyState, to: PolicyState) -> Self {
        Self {
            from,
            to,
            timestamp: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.timestamp.elapsed()
    }
}

/// Result of evaluating one presented tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Evaluation {
    /// Authorized tag; attempts cleared, lock released.
    Granted,

    /// Unauthorized tag below the limit.
    Denied { attempts: u8 },

    /// Unauthorized tag that reached the limit.
    LockoutStarted { seconds: u8 },

    /// Presented during a lockout; nothing changed.
    Ignored { remaining: u8 },
}

impl Evaluation {
    /// Command for the actuator, if the evaluation produces one.
    pub fn command(&self) -> Option<LockCommand> {
        match self {
            Evaluation::Granted => Some(LockCommand::Unlock),
            Evaluation::Denied { .. } | Evaluation::LockoutStarted { .. } => {
                Some(LockCommand::Lock)
            }
            Evaluation::Ignored { .. } => None,
        }
    }

    /// Whether the record changed and must be saved.
    pub fn changed_record(&self) -> bool {
        !matches!(self, Evaluation::Ignored { .. })
    }
}

/// Result of one elapsed second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// No lockout running.
    Idle,

    /// Lockout still running with `remaining` seconds.
    Countdown { remaining: u8 },

    /// The countdown just reached zero.
    LockoutEnded,
}

/// The lockout state machine.
#[derive(Debug)]
pub struct LockoutPolicy {
    config: PolicyConfig,
    record: PersistedSecurityState,
    state: PolicyState,
    history: VecDeque<PolicyTransition>,
}

impl LockoutPolicy {
    /// Policy starting from the default record.
    pub fn new(config: PolicyConfig) -> Self {
        Self::from_record(config, PersistedSecurityState::default())
    }

    /// Policy resuming from a loaded record; the state follows the
    /// remaining lockout.
    pub fn from_record(config: PolicyConfig, record: PersistedSecurityState) -> Self {
        Self {
            config,
            record,
            state: PolicyState::of(&record),
            history: VecDeque::with_capacity(MAX_HISTORY_SIZE),
        }
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }

    pub fn state(&self) -> PolicyState {
        self.state
    }

    pub fn is_locked_out(&self) -> bool {
        self.state == PolicyState::LockedOut
    }

    /// The record as it should be persisted.
    pub fn record(&self) -> &PersistedSecurityState {
        &self.record
    }

    /// Transitions, oldest first.
    pub fn history(&self) -> &VecDeque<PolicyTransition> {
        &self.history
    }

    /// Apply one presented tag.
    pub fn evaluate(&mut self, authorized: bool) -> Evaluation {
        if self.is_locked_out() {
            debug!(
                remaining = self.record.lockout_seconds_remaining,
                "tag ignored during lockout"
            );
            return Evaluation::Ignored {
                remaining: self.record.lockout_seconds_remaining,
            };
        }

        if authorized {
            self.record.wrong_attempts = 0;
            self.record.lock_state = LockState::Unlocked;
            return Evaluation::Granted;
        }

        self.record.lock_state = LockState::Locked;
        let attempts = self.record.wrong_attempts.saturating_add(1);
        if attempts >= self.config.max_wrong_attempts {
            self.record.wrong_attempts = 0;
            self.record.lockout_seconds_remaining = self.config.lockout_seconds;
            self.transition_to(PolicyState::LockedOut);
            info!(
                seconds = self.config.lockout_seconds,
                "too many wrong attempts, lockout started"
            );
            Evaluation::LockoutStarted {
                seconds: self.config.lockout_seconds,
            }
        } else {
            self.record.wrong_attempts = attempts;
            Evaluation::Denied { attempts }
        }
    }

    /// Advance the lockout countdown by one second.
    pub fn tick_second(&mut self) -> Tick {
        if !self.is_locked_out() {
            return Tick::Idle;
        }

        let remaining = self.record.lockout_seconds_remaining.saturating_sub(1);
        self.record.lockout_seconds_remaining = remaining;
        if remaining > 0 {
            return Tick::Countdown { remaining };
        }

        self.record.wrong_attempts = 0;
        self.transition_to(PolicyState::Active);
        info!("lockout ended");
        Tick::LockoutEnded
    }

    /// Mark the lock as closed. Returns true if it was open.
    pub fn relock(&mut self) -> bool {
        let was_unlocked = !self.record.lock_state.is_locked();
        self.record.lock_state = LockState::Locked;
        was_unlocked
    }

    fn transition_to(&mut self, to: PolicyState) {
        let transition = PolicyTransition::new(self.state, to);
        self.state = to;
        self.history.push_back(transition);
        if self.history.len() > MAX_HISTORY_SIZE {
            self.history.pop_front();
        }
    }
}
