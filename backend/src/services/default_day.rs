//! Organization default days: authoring, repeat series and maintenance.

use chrono::NaiveDate;
use tracing::{debug, info};

use super::requests::{locate_slot, require, CreateDefaultSlotRequest, SlotPatch};
use super::ColorTimeService;
use crate::algorithms::{ensure_no_conflict, expand, find_conflict, merge_blocks, MergePolicy};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{slots_of, Block, BlockId, DayId, DefaultDay, Slot, SlotId};

impl ColorTimeService {
    /// Author a slot on the organization's default day for `request.date`,
    /// repeating it per `request.repeat`.
    ///
    /// Every occurrence is conflict-checked before anything is written; a
    /// conflict on any date aborts the whole request. Occurrences receive a
    /// copy of the base block merged into whatever they already hold, so
    /// re-running a series never duplicates slots. Blocks and slots that
    /// came from a template match the occurrence's copies of the same
    /// template entries.
    pub async fn create_default_slot(
        &self,
        request: CreateDefaultSlotRequest,
    ) -> ScheduleResult<DefaultDay> {
        let organization_id = require("organization_id", &request.organization_id)?.to_string();
        let created_by = require("created_by", &request.created_by)?.to_string();
        let range = request.slot.validate()?;
        request.repeat.validate(request.date)?;

        let now = self.clock.now();
        let mut base = match self.repo.find_default_day(&organization_id, request.date).await? {
            Some(day) => day,
            None => DefaultDay::empty(
                self.ids.day_id(),
                organization_id.clone(),
                request.date,
                created_by.clone(),
                now,
            ),
        };

        ensure_no_conflict(&range, &base.blocks, None)?;

        let block_idx = match request.block_id {
            Some(block_id) => base
                .blocks
                .iter()
                .position(|b| b.block_id == block_id)
                .ok_or_else(|| {
                    ScheduleError::not_found(format!("block {} on {}", block_id, request.date))
                })?,
            None => {
                base.blocks.push(Block::new(self.ids.block_id()));
                base.blocks.len() - 1
            }
        };
        let block = &mut base.blocks[block_idx];
        let position = block.slots.len() as u32 + 1;
        block
            .slots
            .push(request.slot.build(range, position, self.ids.as_ref(), now));
        let base_block = lineage_of(block);

        if let Some(topic) = &request.topic_id {
            base.topic_id = Some(topic.clone());
        }
        if request.repeat.repeats() {
            base.is_base_template = true;
            base.repeat = request.repeat.clone();
        }
        base.updated_at = now;

        let mut occurrences = Vec::new();
        for date in expand(request.date, &request.repeat).skip(1) {
            let mut day = match self.repo.find_default_day(&organization_id, date).await? {
                Some(day) => day,
                None => DefaultDay::empty(
                    self.ids.day_id(),
                    organization_id.clone(),
                    date,
                    created_by.clone(),
                    now,
                ),
            };
            if day.base_template_id.is_none() && !day.is_base_template {
                day.base_template_id = Some(base.day_id);
            }

            let outcome = merge_blocks(
                std::mem::take(&mut day.blocks),
                std::slice::from_ref(&base_block),
                MergePolicy::REPEAT_INTO_DEFAULT,
                self.ids.as_ref(),
                now,
            )?;
            for cloned_id in &outcome.stats.cloned_slot_ids {
                let Some(clone) = slots_of(&outcome.blocks).find(|s| s.slot_id == *cloned_id) else {
                    continue;
                };
                let candidate = clone.range();
                if let Some(existing) =
                    find_conflict(&candidate, slots_of(&outcome.blocks), Some(*cloned_id))
                {
                    debug!(%date, existing = %existing.slot_id, "Repeated slot conflicts");
                    return Err(ScheduleError::Conflict {
                        candidate,
                        existing: existing.range(),
                        existing_slot_id: existing.slot_id,
                    });
                }
            }
            day.blocks = outcome.blocks;
            day.updated_at = now;
            occurrences.push(day);
        }

        self.repo.save_default_day(&base).await?;
        for day in &occurrences {
            self.repo.save_default_day(day).await?;
        }
        info!(
            day_id = %base.day_id,
            date = %base.date,
            repeated_on = occurrences.len(),
            "Created default slot"
        );
        Ok(base)
    }

    /// The default day for `date`, optionally keeping only titles in `language_id`.
    pub async fn get_default_day(
        &self,
        organization_id: &str,
        date: NaiveDate,
        language_id: Option<u32>,
    ) -> ScheduleResult<DefaultDay> {
        let organization_id = require("organization_id", organization_id)?;
        let mut day = self
            .repo
            .find_default_day(organization_id, date)
            .await?
            .ok_or_else(|| ScheduleError::not_found(format!("default day {}", date)))?;
        if let Some(language_id) = language_id {
            day.retain_language(language_id);
        }
        Ok(day)
    }

    pub async fn list_default_days_in_range(
        &self,
        organization_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        language_id: Option<u32>,
    ) -> ScheduleResult<Vec<DefaultDay>> {
        let organization_id = require("organization_id", organization_id)?;
        if end < start {
            return Err(ScheduleError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        let mut days = self
            .repo
            .list_default_days_in_range(organization_id, start, end)
            .await?;
        if let Some(language_id) = language_id {
            days.iter_mut().for_each(|d| d.retain_language(language_id));
        }
        Ok(days)
    }

    pub async fn list_default_days(&self, organization_id: &str) -> ScheduleResult<Vec<DefaultDay>> {
        let organization_id = require("organization_id", organization_id)?;
        Ok(self.repo.list_default_days(organization_id).await?)
    }

    /// The block of a default day containing `slot_id`.
    pub async fn find_block_by_slot(&self, day_id: DayId, slot_id: SlotId) -> ScheduleResult<Block> {
        let day = self.load_default_day(day_id).await?;
        day.blocks
            .into_iter()
            .find(|b| b.slots.iter().any(|s| s.slot_id == slot_id))
            .ok_or_else(|| ScheduleError::not_found(format!("slot {} in default day {}", slot_id, day_id)))
    }

    /// Partially update one slot; re-timing is conflict-checked against the
    /// rest of the day.
    pub async fn update_default_slot(
        &self,
        day_id: DayId,
        slot_id: SlotId,
        patch: SlotPatch,
    ) -> ScheduleResult<DefaultDay> {
        patch.validate()?;
        let mut day = self.load_default_day(day_id).await?;
        let loc = locate_slot(&day.blocks, slot_id).ok_or_else(|| {
            ScheduleError::not_found(format!("slot {} in default day {}", slot_id, day_id))
        })?;

        let current = day.blocks[loc.block].slots[loc.slot].range();
        let range = patch.new_range(current)?;
        if let Some(range) = &range {
            ensure_no_conflict(range, &day.blocks, Some(slot_id))?;
        }

        let now = self.clock.now();
        patch.apply(&mut day.blocks[loc.block].slots[loc.slot], range, now);
        day.updated_at = now;
        self.repo.save_default_day(&day).await?;
        info!(%day_id, %slot_id, "Updated default slot");
        Ok(day)
    }

    pub async fn delete_default_day(&self, day_id: DayId) -> ScheduleResult<()> {
        if !self.repo.delete_default_day(day_id).await? {
            return Err(ScheduleError::not_found(format!("default day {}", day_id)));
        }
        info!(%day_id, "Deleted default day");
        Ok(())
    }

    /// Remove one slot; the remaining slots of its block are renumbered and
    /// a block left empty is removed.
    pub async fn delete_default_slot(
        &self,
        day_id: DayId,
        slot_id: SlotId,
    ) -> ScheduleResult<DefaultDay> {
        let mut day = self.load_default_day(day_id).await?;
        let loc = locate_slot(&day.blocks, slot_id).ok_or_else(|| {
            ScheduleError::not_found(format!("slot {} in default day {}", slot_id, day_id))
        })?;
        let block = &mut day.blocks[loc.block];
        block.slots.remove(loc.slot);
        block.renumber_sessions();
        if block.slots.is_empty() {
            day.blocks.remove(loc.block);
        }
        day.updated_at = self.clock.now();
        self.repo.save_default_day(&day).await?;
        info!(%day_id, %slot_id, "Deleted default slot");
        Ok(day)
    }

    pub async fn delete_default_block(
        &self,
        day_id: DayId,
        block_id: BlockId,
    ) -> ScheduleResult<DefaultDay> {
        let mut day = self.load_default_day(day_id).await?;
        let idx = day
            .blocks
            .iter()
            .position(|b| b.block_id == block_id)
            .ok_or_else(|| {
                ScheduleError::not_found(format!("block {} in default day {}", block_id, day_id))
            })?;
        day.blocks.remove(idx);
        day.updated_at = self.clock.now();
        self.repo.save_default_day(&day).await?;
        info!(%day_id, %block_id, "Deleted default block");
        Ok(day)
    }

    async fn load_default_day(&self, day_id: DayId) -> ScheduleResult<DefaultDay> {
        self.repo
            .get_default_day(day_id)
            .await?
            .ok_or_else(|| ScheduleError::not_found(format!("default day {}", day_id)))
    }
}

/// `block` keyed by the ids it shares with other layers, so occurrences that
/// already hold copies of the same entries match them instead of cloning.
fn lineage_of(block: &Block) -> Block {
    Block {
        block_id: block.identity_key(),
        prior_block_id: None,
        slots: block
            .slots
            .iter()
            .map(|slot| Slot {
                slot_id: slot.identity_key(),
                prior_slot_id: None,
                ..slot.clone()
            })
            .collect(),
    }
}
