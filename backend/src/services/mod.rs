//! Service layer: schedule orchestration over a repository.
//!
//! [`ColorTimeService`] composes the engine in [`crate::algorithms`] with a
//! repository, a clock and an id generator. Every operation follows the same
//! shape: read the target document, read its sources, compute, write. A
//! failure before the write leaves stored state untouched.
//!
//! Operations are split by document kind:
//!
//! - [`week`]: get-or-create weeks, slot tracking updates, topics
//! - [`default_day`]: organization default days and their repeat series
//! - [`template`]: weekday/date templates and their application over ranges

pub mod default_day;
pub mod requests;
pub mod template;
pub mod week;

pub use requests::{
    ApplyReport, CreateDefaultSlotRequest, CreateTemplateSlotRequest, DateFailure,
    DuplicateReport, NewSlot, SlotPatch, TemplateSelector, TemplateSlotUpdate,
    UpdateWeekSlotRequest,
};

use std::sync::Arc;

use crate::db::repository::FullRepository;
use crate::runtime::{Clock, IdGenerator, SystemClock, UuidGenerator};

/// Orchestrates the reconciliation engine against persisted documents.
///
/// Cheap to clone; clones share the repository and collaborators.
#[derive(Clone)]
pub struct ColorTimeService {
    repo: Arc<dyn FullRepository>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl ColorTimeService {
    /// Service using the system clock and random v4 ids.
    pub fn new(repo: Arc<dyn FullRepository>) -> Self {
        Self::with_runtime(repo, Arc::new(SystemClock), Arc::new(UuidGenerator))
    }

    pub fn with_runtime(
        repo: Arc<dyn FullRepository>,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        Self { repo, clock, ids }
    }

    pub fn repository(&self) -> &Arc<dyn FullRepository> {
        &self.repo
    }

    /// Check that the repository is reachable.
    pub async fn health_check(&self) -> crate::ScheduleResult<bool> {
        Ok(self.repo.health_check().await?)
    }
}
