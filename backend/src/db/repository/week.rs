//! Repository trait for per-owner weeks.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{Owner, Tracking, Week, WeekId};

/// # Thread Safety
/// Implementations must be `Send + Sync` to work with async Rust.
#[async_trait]
pub trait WeekRepository: Send + Sync {
    /// Check if the backend is healthy.
    ///
    /// # Returns
    /// - `Ok(true)` if healthy
    /// - `Ok(false)` if unhealthy but no error occurred
    async fn health_check(&self) -> RepositoryResult<bool>;

    /// The owner's week whose `[start_date, end_date]` overlaps `[start, end]`.
    ///
    /// At most one such week exists; if several do, the earliest-starting one
    /// is returned.
    async fn find_week(
        &self,
        organization_id: &str,
        owner: &Owner,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Option<Week>>;

    async fn get_week(&self, week_id: WeekId) -> RepositoryResult<Option<Week>>;

    /// Insert or replace a week by `week_id`.
    async fn save_week(&self, week: &Week) -> RepositoryResult<()>;

    /// Every week of the owner containing at least one slot labelled `label`,
    /// ordered by `start_date`.
    async fn list_weeks_by_tracking(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<Vec<Week>>;

    /// Number of the owner's slots labelled `label`.
    async fn count_tracking_usage(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<usize>;
}
