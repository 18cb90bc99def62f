//! In-memory local repository implementation.
//!
//! All documents live in memory behind a single lock, giving fast,
//! deterministic and isolated execution for unit tests and local
//! development. Nothing survives the process.

use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

use super::snapshot::Snapshot;
use crate::db::repository::*;
use crate::models::{
    DayId, DefaultDay, Owner, Template, TemplateId, TemplateKey, Tracking, Week, WeekId,
};

/// In-memory local repository.
///
/// Clones share the same underlying data.
///
/// # Example
/// ```ignore
/// use colortime::db::repositories::LocalRepository;
///
/// #[tokio::test]
/// async fn test_week_storage() {
///     let repo = LocalRepository::new();
///     repo.save_week(&week).await.unwrap();
///     assert!(repo.get_week(week.week_id).await.unwrap().is_some());
/// }
/// ```
#[derive(Clone, Default)]
pub struct LocalRepository {
    data: Arc<RwLock<LocalData>>,
}

struct LocalData {
    snapshot: Snapshot,
    // Connection health
    is_healthy: bool,
    // Dates whose default-day saves fail
    failing_dates: HashSet<NaiveDate>,
}

impl Default for LocalData {
    fn default() -> Self {
        Self {
            snapshot: Snapshot::default(),
            is_healthy: true,
            failing_dates: HashSet::new(),
        }
    }
}

impl LocalRepository {
    /// Create a new empty local repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the health status (for testing).
    ///
    /// While unhealthy every operation fails with a connection error.
    pub fn set_healthy(&self, healthy: bool) {
        self.data.write().is_healthy = healthy;
    }

    /// Make saves of default days dated `date` fail (for testing).
    pub fn fail_default_day_saves_on(&self, date: NaiveDate) {
        self.data.write().failing_dates.insert(date);
    }

    /// Number of stored weeks, default days and templates.
    pub fn document_counts(&self) -> (usize, usize, usize) {
        self.data.read().snapshot.counts()
    }

    /// Drop every stored document.
    pub fn clear(&self) {
        self.data.write().snapshot = Snapshot::default();
    }

    fn ensure_healthy(&self, operation: &str) -> RepositoryResult<()> {
        if self.data.read().is_healthy {
            Ok(())
        } else {
            Err(RepositoryError::connection_with_context(
                "local repository is unhealthy",
                ErrorContext::new(operation),
            ))
        }
    }
}

#[async_trait]
impl WeekRepository for LocalRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        Ok(self.data.read().is_healthy)
    }

    async fn find_week(
        &self,
        organization_id: &str,
        owner: &Owner,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Option<Week>> {
        self.ensure_healthy("find_week")?;
        Ok(self.data.read().snapshot.find_week(organization_id, owner, start, end))
    }

    async fn get_week(&self, week_id: WeekId) -> RepositoryResult<Option<Week>> {
        self.ensure_healthy("get_week")?;
        Ok(self.data.read().snapshot.get_week(week_id))
    }

    async fn save_week(&self, week: &Week) -> RepositoryResult<()> {
        self.ensure_healthy("save_week")?;
        self.data.write().snapshot.save_week(week);
        debug!(week_id = %week.week_id, "Saved week");
        Ok(())
    }

    async fn list_weeks_by_tracking(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<Vec<Week>> {
        self.ensure_healthy("list_weeks_by_tracking")?;
        Ok(self
            .data
            .read()
            .snapshot
            .list_weeks_by_tracking(organization_id, owner, label))
    }

    async fn count_tracking_usage(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<usize> {
        self.ensure_healthy("count_tracking_usage")?;
        Ok(self
            .data
            .read()
            .snapshot
            .count_tracking_usage(organization_id, owner, label))
    }
}

#[async_trait]
impl DefaultDayRepository for LocalRepository {
    async fn find_default_day(
        &self,
        organization_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DefaultDay>> {
        self.ensure_healthy("find_default_day")?;
        Ok(self.data.read().snapshot.find_default_day(organization_id, date))
    }

    async fn get_default_day(&self, day_id: DayId) -> RepositoryResult<Option<DefaultDay>> {
        self.ensure_healthy("get_default_day")?;
        Ok(self.data.read().snapshot.get_default_day(day_id))
    }

    async fn list_default_days_in_range(
        &self,
        organization_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<DefaultDay>> {
        self.ensure_healthy("list_default_days_in_range")?;
        Ok(self
            .data
            .read()
            .snapshot
            .list_default_days_in_range(organization_id, start, end))
    }

    async fn list_default_days(&self, organization_id: &str) -> RepositoryResult<Vec<DefaultDay>> {
        self.ensure_healthy("list_default_days")?;
        Ok(self.data.read().snapshot.list_default_days(organization_id))
    }

    async fn save_default_day(&self, day: &DefaultDay) -> RepositoryResult<()> {
        self.ensure_healthy("save_default_day")?;
        let mut data = self.data.write();
        if data.failing_dates.contains(&day.date) {
            return Err(RepositoryError::storage_with_context(
                "injected save failure",
                ErrorContext::new("save_default_day")
                    .with_entity("default_day")
                    .with_entity_id(day.day_id)
                    .with_details(format!("date={}", day.date)),
            ));
        }
        data.snapshot.save_default_day(day);
        debug!(day_id = %day.day_id, date = %day.date, "Saved default day");
        Ok(())
    }

    async fn delete_default_day(&self, day_id: DayId) -> RepositoryResult<bool> {
        self.ensure_healthy("delete_default_day")?;
        Ok(self.data.write().snapshot.delete_default_day(day_id))
    }
}

#[async_trait]
impl TemplateRepository for LocalRepository {
    async fn find_template(
        &self,
        organization_id: &str,
        term_id: &str,
        key: &TemplateKey,
    ) -> RepositoryResult<Option<Template>> {
        self.ensure_healthy("find_template")?;
        Ok(self
            .data
            .read()
            .snapshot
            .find_template(organization_id, term_id, key))
    }

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Option<Template>> {
        self.ensure_healthy("get_template")?;
        Ok(self.data.read().snapshot.get_template(template_id))
    }

    async fn save_template(&self, template: &Template) -> RepositoryResult<()> {
        self.ensure_healthy("save_template")?;
        self.data.write().snapshot.save_template(template);
        debug!(template_id = %template.template_id, key = %template.key, "Saved template");
        Ok(())
    }
}
