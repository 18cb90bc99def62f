//! Week orchestration: materializing weeks from default days and keeping
//! tracking ranks consistent.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::requests::{require, UpdateWeekSlotRequest};
use super::ColorTimeService;
use crate::algorithms::{merge_blocks, normalize_tracking, MergePolicy};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{dates_inclusive, Day, Owner, SlotId, Tracking, Week, WeekId};

impl ColorTimeService {
    /// Get the owner's week overlapping `[start, end]`, creating it if absent,
    /// and reconcile it with the organization's default days.
    ///
    /// A new week spans exactly `[start, end]`. An existing week keeps its own
    /// range; only default days falling inside it are merged. Days with no
    /// default day are left as they are.
    pub async fn get_or_create_week(
        &self,
        organization_id: &str,
        owner: &Owner,
        start: NaiveDate,
        end: NaiveDate,
    ) -> ScheduleResult<Week> {
        let organization_id = require("organization_id", organization_id)?;
        require("owner_id", &owner.owner_id)?;
        require("owner_role", &owner.owner_role)?;
        if end < start {
            return Err(ScheduleError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        let now = self.clock.now();
        let existing = self.repo.find_week(organization_id, owner, start, end).await?;
        let is_new = existing.is_none();
        let mut week = match existing {
            Some(week) => week,
            None => Week {
                week_id: self.ids.week_id(),
                organization_id: organization_id.to_string(),
                owner: owner.clone(),
                start_date: start,
                end_date: end,
                topic_id: None,
                days: dates_inclusive(start, end)
                    .map(|date| Day::empty(self.ids.day_id(), date, now))
                    .collect(),
                created_by: owner.owner_id.clone(),
                created_at: now,
                updated_at: now,
            },
        };

        let defaults = self
            .repo
            .list_default_days_in_range(organization_id, week.start_date, week.end_date)
            .await?;

        let mut changed = false;
        let mut seen = Vec::new();
        for default in &defaults {
            // One default day per date; ignore duplicates beyond the first.
            if seen.contains(&default.date) {
                continue;
            }
            seen.push(default.date);

            if week.day(default.date).is_none() {
                week.days.push(Day::empty(self.ids.day_id(), default.date, now));
                week.days.sort_by_key(|d| d.date);
                changed = true;
            }
            let Some(day) = week.day_mut(default.date) else {
                continue;
            };

            let blocks = std::mem::take(&mut day.blocks);
            let outcome = merge_blocks(
                blocks,
                &default.blocks,
                MergePolicy::DEFAULT_INTO_WEEK,
                self.ids.as_ref(),
                now,
            )?;
            debug!(date = %default.date, stats = ?outcome.stats, "Merged default day into week");
            day.blocks = outcome.blocks;
            if day.topic_id.is_none() && default.topic_id.is_some() {
                day.topic_id = default.topic_id.clone();
                changed = true;
            }
            if outcome.stats.changed() {
                day.updated_at = now;
                changed = true;
            }
        }

        if is_new || changed {
            week.updated_at = now;
            self.repo.save_week(&week).await?;
        }
        info!(
            week_id = %week.week_id,
            owner_id = %owner.owner_id,
            created = is_new,
            changed,
            "Week ready"
        );
        Ok(week)
    }

    /// Set a week slot's tracking label and product.
    ///
    /// A slot gaining its first label is ranked after the owner's existing
    /// slots with that label. Moving a slot from one label to another re-ranks
    /// both labels across the owner's whole history.
    pub async fn update_week_slot(
        &self,
        week_id: WeekId,
        slot_id: SlotId,
        request: UpdateWeekSlotRequest,
    ) -> ScheduleResult<Week> {
        let now = self.clock.now();
        let mut week = self.load_week(week_id).await?;
        let organization_id = week.organization_id.clone();
        let owner = week.owner.clone();

        let previous = week
            .slots()
            .find(|s| s.slot_id == slot_id)
            .map(|s| s.tracking.clone())
            .ok_or_else(|| {
                ScheduleError::not_found(format!("slot {} in week {}", slot_id, week_id))
            })?;
        let label = request.tracking;

        let first_rank = match &previous {
            None => Some(
                self.repo
                    .count_tracking_usage(&organization_id, &owner, &label)
                    .await?
                    + 1,
            ),
            Some(_) => None,
        };

        let slot = week
            .find_slot_mut(slot_id)
            .ok_or_else(|| ScheduleError::not_found(format!("slot {} in week {}", slot_id, week_id)))?;
        slot.tracking = Some(label.clone());
        slot.product_id = request.product_id;
        if let Some(rank) = first_rank {
            slot.use_count = rank as u32;
        }
        slot.updated_at = now;
        week.updated_at = now;
        self.repo.save_week(&week).await?;

        match previous {
            Some(old) if old != label => {
                self.normalize_tracking_usage(&organization_id, &owner, &old)
                    .await?;
                self.normalize_tracking_usage(&organization_id, &owner, &label)
                    .await?;
                info!(%week_id, %slot_id, from = %old, to = %label, "Moved slot between tracking labels");
                self.load_week(week_id).await
            }
            _ => {
                info!(%week_id, %slot_id, tracking = %label, "Updated week slot");
                Ok(week)
            }
        }
    }

    /// Re-rank every slot of the owner labelled `label` by creation time and
    /// persist the weeks whose ranks changed. Returns the number of slots
    /// carrying the label.
    pub async fn normalize_tracking_usage(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> ScheduleResult<usize> {
        let now = self.clock.now();
        let mut weeks = self
            .repo
            .list_weeks_by_tracking(organization_id, owner, label)
            .await?;
        let outcome = normalize_tracking(&mut weeks, label, now);
        for idx in &outcome.changed_weeks {
            let week = &mut weeks[*idx];
            week.updated_at = now;
            self.repo.save_week(week).await?;
        }
        debug!(
            tracking = %label,
            matched = outcome.matched,
            weeks_saved = outcome.changed_weeks.len(),
            "Normalized tracking usage"
        );
        Ok(outcome.matched)
    }

    pub async fn get_week(&self, week_id: WeekId) -> ScheduleResult<Week> {
        self.load_week(week_id).await
    }

    pub async fn set_week_topic(&self, week_id: WeekId, topic_id: &str) -> ScheduleResult<Week> {
        let topic_id = require("topic_id", topic_id)?.to_string();
        self.edit_week(week_id, |week| {
            week.topic_id = Some(topic_id);
            Ok(())
        })
        .await
    }

    pub async fn clear_week_topic(&self, week_id: WeekId) -> ScheduleResult<Week> {
        self.edit_week(week_id, |week| {
            week.topic_id = None;
            Ok(())
        })
        .await
    }

    pub async fn set_day_topic(
        &self,
        week_id: WeekId,
        date: NaiveDate,
        topic_id: &str,
    ) -> ScheduleResult<Week> {
        let topic_id = require("topic_id", topic_id)?.to_string();
        let now = self.clock.now();
        self.edit_week(week_id, |week| {
            let day = week
                .day_mut(date)
                .ok_or_else(|| ScheduleError::not_found(format!("day {} in week {}", date, week_id)))?;
            day.topic_id = Some(topic_id);
            day.updated_at = now;
            Ok(())
        })
        .await
    }

    pub async fn clear_day_topic(&self, week_id: WeekId, date: NaiveDate) -> ScheduleResult<Week> {
        let now = self.clock.now();
        self.edit_week(week_id, |week| {
            let day = week
                .day_mut(date)
                .ok_or_else(|| ScheduleError::not_found(format!("day {} in week {}", date, week_id)))?;
            day.topic_id = None;
            day.updated_at = now;
            Ok(())
        })
        .await
    }

    async fn load_week(&self, week_id: WeekId) -> ScheduleResult<Week> {
        self.repo
            .get_week(week_id)
            .await?
            .ok_or_else(|| ScheduleError::not_found(format!("week {}", week_id)))
    }

    async fn edit_week(
        &self,
        week_id: WeekId,
        edit: impl FnOnce(&mut Week) -> ScheduleResult<()>,
    ) -> ScheduleResult<Week> {
        let mut week = self.load_week(week_id).await?;
        edit(&mut week)?;
        week.updated_at = self.clock.now();
        self.repo.save_week(&week).await?;
        Ok(week)
    }
}
