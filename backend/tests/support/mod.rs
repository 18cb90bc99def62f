#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use colortime::db::repositories::LocalRepository;
use colortime::db::repository::FullRepository;
use colortime::models::{Owner, TemplateKey};
use colortime::runtime::{FixedClock, SequentialIdGenerator};
use colortime::services::{ColorTimeService, CreateTemplateSlotRequest, NewSlot};

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

pub const ORG: &str = "org-1";
pub const TERM: &str = "term-2025";
pub const ACTOR: &str = "admin-1";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn hm(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn teacher(id: &str) -> Owner {
    Owner::new(id, "teacher")
}

pub fn new_slot(title: &str, start: NaiveTime, minutes: u32) -> NewSlot {
    NewSlot {
        title: title.to_string(),
        start_time: start,
        duration_minutes: minutes,
        color: "#4a90d9".to_string(),
        note: String::new(),
        localized_titles: Vec::new(),
    }
}

pub fn template_slot(key: TemplateKey, slot: NewSlot) -> CreateTemplateSlotRequest {
    CreateTemplateSlotRequest {
        organization_id: ORG.to_string(),
        term_id: TERM.to_string(),
        key,
        block_id: None,
        slot,
        created_by: ACTOR.to_string(),
    }
}

/// Service over an in-memory repository with a frozen clock and
/// sequential ids.
pub struct Harness {
    pub repo: Arc<LocalRepository>,
    pub clock: Arc<FixedClock>,
    pub service: ColorTimeService,
}

pub fn harness() -> Harness {
    let repo = Arc::new(LocalRepository::new());
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
    ));
    let service = ColorTimeService::with_runtime(
        Arc::clone(&repo) as Arc<dyn FullRepository>,
        clock.clone(),
        Arc::new(SequentialIdGenerator::new()),
    );
    Harness {
        repo,
        clock,
        service,
    }
}
