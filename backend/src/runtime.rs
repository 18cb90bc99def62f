//! Clock and identity collaborators used by the services.
//!
//! Production code uses [`SystemClock`] and [`UuidGenerator`]; tests swap in
//! [`FixedClock`] and [`SequentialIdGenerator`] for deterministic output.

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::models::{BlockId, DayId, SlotId, TemplateId, WeekId};

/// Source of "now" for timestamping.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Source of fresh unique identifiers.
pub trait IdGenerator: Send + Sync {
    fn next_uuid(&self) -> Uuid;

    fn slot_id(&self) -> SlotId {
        SlotId::new(self.next_uuid())
    }

    fn block_id(&self) -> BlockId {
        BlockId::new(self.next_uuid())
    }

    fn day_id(&self) -> DayId {
        DayId::new(self.next_uuid())
    }

    fn week_id(&self) -> WeekId {
        WeekId::new(self.next_uuid())
    }

    fn template_id(&self) -> TemplateId {
        TemplateId::new(self.next_uuid())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock frozen at a given instant, advanced manually.
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Random v4 identifiers.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_uuid(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Identifiers `1, 2, 3, ...` encoded as UUIDs; never yields nil.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    next: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first.max(1)),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_uuid(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Uuid::from_u128(u128::from(n))
    }
}
