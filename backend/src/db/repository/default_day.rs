//! Repository trait for organization default days.

use async_trait::async_trait;
use chrono::NaiveDate;

use super::error::RepositoryResult;
use crate::models::{DayId, DefaultDay};

#[async_trait]
pub trait DefaultDayRepository: Send + Sync {
    /// The organization's default day for `date`, if one exists.
    async fn find_default_day(
        &self,
        organization_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DefaultDay>>;

    async fn get_default_day(&self, day_id: DayId) -> RepositoryResult<Option<DefaultDay>>;

    /// Default days with `start <= date <= end`, ordered by date.
    async fn list_default_days_in_range(
        &self,
        organization_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<DefaultDay>>;

    /// Every default day of the organization, ordered by date.
    async fn list_default_days(&self, organization_id: &str) -> RepositoryResult<Vec<DefaultDay>>;

    /// Insert or replace a default day by `day_id`.
    async fn save_default_day(&self, day: &DefaultDay) -> RepositoryResult<()>;

    /// Remove a default day; returns whether it existed.
    async fn delete_default_day(&self, day_id: DayId) -> RepositoryResult<bool>;
}
