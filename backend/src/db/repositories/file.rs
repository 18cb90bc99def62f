//! File-backed repository.
//!
//! Keeps the full document set in memory and rewrites a single JSON
//! snapshot (`colortime.json` under the data directory) after every
//! mutation. The snapshot is written to a temporary file and renamed into
//! place, so a crash mid-write leaves the previous snapshot intact.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::snapshot::{Snapshot, SnapshotFile};
use crate::db::repository::*;
use crate::models::{
    DayId, DefaultDay, Owner, Template, TemplateId, TemplateKey, Tracking, Week, WeekId,
};

/// Name of the snapshot file inside the data directory.
pub const SNAPSHOT_FILE: &str = "colortime.json";

pub struct FileRepository {
    path: PathBuf,
    snapshot: RwLock<Snapshot>,
}

impl FileRepository {
    /// Open (or create) the repository stored under `data_dir`.
    pub async fn open(data_dir: impl AsRef<Path>) -> RepositoryResult<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await.map_err(|e| {
            RepositoryError::from(e).with_operation("open_file_repository")
        })?;
        let path = data_dir.join(SNAPSHOT_FILE);

        let snapshot = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let file: SnapshotFile = serde_json::from_slice(&bytes).map_err(|e| {
                    RepositoryError::from(e).with_operation("open_file_repository")
                })?;
                Snapshot::from(file)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Snapshot::default(),
            Err(e) => return Err(RepositoryError::from(e).with_operation("open_file_repository")),
        };

        let (weeks, days, templates) = snapshot.counts();
        info!(
            path = %path.display(),
            weeks,
            default_days = days,
            templates,
            "Opened file repository"
        );

        Ok(Self {
            path,
            snapshot: RwLock::new(snapshot),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, snapshot: &Snapshot, operation: &str) -> RepositoryResult<()> {
        let bytes = serde_json::to_vec_pretty(&snapshot.to_file())
            .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepositoryError::from(e).with_operation(operation))?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "Wrote snapshot");
        Ok(())
    }

    /// Apply `mutate` to a copy of the snapshot and commit it only once the
    /// file write succeeded.
    async fn mutate<T>(
        &self,
        operation: &str,
        mutate: impl FnOnce(&mut Snapshot) -> T,
    ) -> RepositoryResult<T> {
        let mut guard = self.snapshot.write().await;
        let mut next = guard.clone();
        let out = mutate(&mut next);
        self.persist(&next, operation).await?;
        *guard = next;
        Ok(out)
    }
}

#[async_trait]
impl WeekRepository for FileRepository {
    async fn health_check(&self) -> RepositoryResult<bool> {
        match self.path.parent() {
            Some(dir) => Ok(tokio::fs::metadata(dir).await.map(|m| m.is_dir()).unwrap_or(false)),
            None => Ok(false),
        }
    }

    async fn find_week(
        &self,
        organization_id: &str,
        owner: &Owner,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Option<Week>> {
        Ok(self.snapshot.read().await.find_week(organization_id, owner, start, end))
    }

    async fn get_week(&self, week_id: WeekId) -> RepositoryResult<Option<Week>> {
        Ok(self.snapshot.read().await.get_week(week_id))
    }

    async fn save_week(&self, week: &Week) -> RepositoryResult<()> {
        self.mutate("save_week", |s| s.save_week(week)).await
    }

    async fn list_weeks_by_tracking(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<Vec<Week>> {
        Ok(self
            .snapshot
            .read()
            .await
            .list_weeks_by_tracking(organization_id, owner, label))
    }

    async fn count_tracking_usage(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> RepositoryResult<usize> {
        Ok(self
            .snapshot
            .read()
            .await
            .count_tracking_usage(organization_id, owner, label))
    }
}

#[async_trait]
impl DefaultDayRepository for FileRepository {
    async fn find_default_day(
        &self,
        organization_id: &str,
        date: NaiveDate,
    ) -> RepositoryResult<Option<DefaultDay>> {
        Ok(self.snapshot.read().await.find_default_day(organization_id, date))
    }

    async fn get_default_day(&self, day_id: DayId) -> RepositoryResult<Option<DefaultDay>> {
        Ok(self.snapshot.read().await.get_default_day(day_id))
    }

    async fn list_default_days_in_range(
        &self,
        organization_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> RepositoryResult<Vec<DefaultDay>> {
        Ok(self
            .snapshot
            .read()
            .await
            .list_default_days_in_range(organization_id, start, end))
    }

    async fn list_default_days(&self, organization_id: &str) -> RepositoryResult<Vec<DefaultDay>> {
        Ok(self.snapshot.read().await.list_default_days(organization_id))
    }

    async fn save_default_day(&self, day: &DefaultDay) -> RepositoryResult<()> {
        self.mutate("save_default_day", |s| s.save_default_day(day)).await
    }

    async fn delete_default_day(&self, day_id: DayId) -> RepositoryResult<bool> {
        self.mutate("delete_default_day", |s| s.delete_default_day(day_id))
            .await
    }
}

#[async_trait]
impl TemplateRepository for FileRepository {
    async fn find_template(
        &self,
        organization_id: &str,
        term_id: &str,
        key: &TemplateKey,
    ) -> RepositoryResult<Option<Template>> {
        Ok(self
            .snapshot
            .read()
            .await
            .find_template(organization_id, term_id, key))
    }

    async fn get_template(&self, template_id: TemplateId) -> RepositoryResult<Option<Template>> {
        Ok(self.snapshot.read().await.get_template(template_id))
    }

    async fn save_template(&self, template: &Template) -> RepositoryResult<()> {
        self.mutate("save_template", |s| s.save_template(template)).await
    }
}
