//! Bounded in-memory log of tag presentations.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use doorlock_core::TagIdentifier;
use serde::{Deserialize, Serialize};

use crate::policy::Evaluation;

/// Default number of events retained.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 64;

/// One presented tag and what the policy made of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub at: DateTime<Utc>,
    pub tag: TagIdentifier,
    #[serde(flatten)]
    pub evaluation: Evaluation,
}

impl AccessEvent {
    pub fn now(tag: TagIdentifier, evaluation: Evaluation) -> Self {
        Self {
            at: Utc::now(),
            tag,
            evaluation,
        }
    }
}

/// Ring buffer of the most recent [`AccessEvent`]s.
#[derive(Debug, Clone)]
pub struct AccessLog {
    entries: VecDeque<AccessEvent>,
    capacity: usize,
}

impl AccessLog {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append, dropping the oldest entry when full.
    pub fn record(&mut self, event: AccessEvent) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(event);
    }

    pub fn latest(&self) -> Option<&AccessEvent> {
        self.entries.back()
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &AccessEvent> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for AccessLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}
