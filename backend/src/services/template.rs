//! Templates: authoring, duplication and application over date ranges.

use chrono::{Datelike, NaiveDate, Weekday};
use std::collections::HashMap;
use tracing::{info, warn};

use super::requests::{
    locate_slot, require, ApplyReport, CreateTemplateSlotRequest, DateFailure, DuplicateReport,
    TemplateSelector, TemplateSlotUpdate,
};
use super::ColorTimeService;
use crate::algorithms::merge::clone_block;
use crate::algorithms::{ensure_no_conflict, merge_blocks, MergePolicy};
use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    dates_inclusive, Block, DefaultDay, SlotId, Template, TemplateId, TemplateKey, WEEKDAYS,
};

impl ColorTimeService {
    /// Add a slot to the template for `(organization, term, key)`, creating
    /// the template on first use.
    pub async fn create_template_slot(
        &self,
        request: CreateTemplateSlotRequest,
    ) -> ScheduleResult<Template> {
        let organization_id = require("organization_id", &request.organization_id)?;
        let term_id = require("term_id", &request.term_id)?;
        let created_by = require("created_by", &request.created_by)?;
        let range = request.slot.validate()?;

        let now = self.clock.now();
        let mut template = match self
            .repo
            .find_template(organization_id, term_id, &request.key)
            .await?
        {
            Some(template) => template,
            None => Template {
                template_id: self.ids.template_id(),
                organization_id: organization_id.to_string(),
                term_id: term_id.to_string(),
                key: request.key,
                blocks: Vec::new(),
                created_by: created_by.to_string(),
                created_at: now,
                updated_at: now,
            },
        };

        ensure_no_conflict(&range, &template.blocks, None)?;

        let block = match request.block_id {
            Some(block_id) => template
                .blocks
                .iter_mut()
                .find(|b| b.block_id == block_id)
                .ok_or_else(|| {
                    ScheduleError::not_found(format!("block {} in template {}", block_id, request.key))
                })?,
            None => {
                template.blocks.push(Block::new(self.ids.block_id()));
                let last = template.blocks.len() - 1;
                &mut template.blocks[last]
            }
        };
        let position = block.slots.len() as u32 + 1;
        block
            .slots
            .push(request.slot.build(range, position, self.ids.as_ref(), now));

        template.updated_at = now;
        self.repo.save_template(&template).await?;
        info!(template_id = %template.template_id, key = %template.key, "Created template slot");
        Ok(template)
    }

    /// Read one template, or all weekday templates (Monday first, missing ones
    /// omitted).
    pub async fn get_templates(
        &self,
        organization_id: &str,
        term_id: &str,
        selector: TemplateSelector,
    ) -> ScheduleResult<Vec<Template>> {
        let organization_id = require("organization_id", organization_id)?;
        let term_id = require("term_id", term_id)?;
        match selector {
            TemplateSelector::Key(key) => {
                let template = self
                    .repo
                    .find_template(organization_id, term_id, &key)
                    .await?
                    .ok_or_else(|| ScheduleError::not_found(format!("template {}", key)))?;
                Ok(vec![template])
            }
            TemplateSelector::Week => {
                let mut by_weekday = self.weekday_templates(organization_id, term_id).await?;
                Ok(WEEKDAYS
                    .iter()
                    .filter_map(|day| by_weekday.remove(day))
                    .collect())
            }
        }
    }

    /// Partially update a template slot and optionally move it to another
    /// block of the same template.
    pub async fn update_template_slot(
        &self,
        template_id: TemplateId,
        slot_id: SlotId,
        update: TemplateSlotUpdate,
    ) -> ScheduleResult<Template> {
        update.patch.validate()?;
        let mut template = self.load_template(template_id).await?;
        let loc = locate_slot(&template.blocks, slot_id).ok_or_else(|| {
            ScheduleError::not_found(format!("slot {} in template {}", slot_id, template_id))
        })?;

        let current = template.blocks[loc.block].slots[loc.slot].range();
        let range = update.patch.new_range(current)?;
        if let Some(range) = &range {
            ensure_no_conflict(range, &template.blocks, Some(slot_id))?;
        }

        let target_block = match update.move_to_block {
            Some(block_id) if block_id != template.blocks[loc.block].block_id => Some(
                template
                    .blocks
                    .iter()
                    .position(|b| b.block_id == block_id)
                    .ok_or_else(|| {
                        ScheduleError::not_found(format!(
                            "block {} in template {}",
                            block_id, template_id
                        ))
                    })?,
            ),
            _ => None,
        };

        let now = self.clock.now();
        update
            .patch
            .apply(&mut template.blocks[loc.block].slots[loc.slot], range, now);

        if let Some(target) = target_block {
            let mut slot = template.blocks[loc.block].slots.remove(loc.slot);
            template.blocks[loc.block].renumber_sessions();
            slot.sessions = template.blocks[target].slots.len() as u32 + 1;
            template.blocks[target].slots.push(slot);
            if template.blocks[loc.block].slots.is_empty() {
                template.blocks.remove(loc.block);
            }
        }

        template.updated_at = now;
        self.repo.save_template(&template).await?;
        info!(%template_id, %slot_id, moved = target_block.is_some(), "Updated template slot");
        Ok(template)
    }

    /// Copy the `origin` template (with fresh ids) to `target`, or to every
    /// weekday after `origin` when no target is given. Existing targets are
    /// left alone.
    pub async fn duplicate_template(
        &self,
        organization_id: &str,
        term_id: &str,
        origin: TemplateKey,
        target: Option<TemplateKey>,
        created_by: &str,
    ) -> ScheduleResult<DuplicateReport> {
        let organization_id = require("organization_id", organization_id)?;
        let term_id = require("term_id", term_id)?;
        let created_by = require("created_by", created_by)?;
        if target == Some(origin) {
            return Err(ScheduleError::validation(
                "cannot duplicate a template onto itself",
            ));
        }

        let source = self
            .repo
            .find_template(organization_id, term_id, &origin)
            .await?
            .ok_or_else(|| ScheduleError::not_found(format!("template {}", origin)))?;
        let targets = match target {
            Some(key) => vec![key],
            None => origin.remaining_weekdays(),
        };

        let now = self.clock.now();
        let mut report = DuplicateReport::default();
        for key in targets {
            if self
                .repo
                .find_template(organization_id, term_id, &key)
                .await?
                .is_some()
            {
                report.skipped.push(key);
                continue;
            }
            let copy = Template {
                template_id: self.ids.template_id(),
                organization_id: organization_id.to_string(),
                term_id: term_id.to_string(),
                key,
                blocks: source
                    .blocks
                    .iter()
                    .map(|b| {
                        let mut block = clone_block(b, self.ids.as_ref(), now);
                        block.prior_block_id = None;
                        block.slots.iter_mut().for_each(|s| s.prior_slot_id = None);
                        block
                    })
                    .collect(),
                created_by: created_by.to_string(),
                created_at: now,
                updated_at: now,
            };
            self.repo.save_template(&copy).await?;
            report.created.push(key);
        }

        info!(
            origin = %origin,
            created = report.created.len(),
            skipped = report.skipped.len(),
            "Duplicated template"
        );
        Ok(report)
    }

    /// Merge templates into the organization's default days for every date
    /// of `[start, end]`.
    ///
    /// A date-keyed template wins over its weekday's template. Dates with no
    /// template are skipped. Dates are processed in order and independently:
    /// a failing date is reported and the rest still run.
    pub async fn apply_template(
        &self,
        organization_id: &str,
        term_id: &str,
        start: NaiveDate,
        end: NaiveDate,
        actor: &str,
    ) -> ScheduleResult<ApplyReport> {
        let organization_id = require("organization_id", organization_id)?;
        let term_id = require("term_id", term_id)?;
        let actor = require("actor", actor)?;
        if end < start {
            return Err(ScheduleError::validation(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }

        let weekdays = self.weekday_templates(organization_id, term_id).await?;

        let mut report = ApplyReport::default();
        for date in dates_inclusive(start, end) {
            match self
                .apply_template_on(organization_id, term_id, date, &weekdays, actor)
                .await
            {
                Ok(true) => report.applied.push(date),
                Ok(false) => report.skipped.push(date),
                Err(e) => {
                    warn!(%date, error = %e, "Failed to apply template");
                    report.failed.push(DateFailure {
                        date,
                        message: e.to_string(),
                    });
                }
            }
        }

        info!(
            organization_id,
            term_id,
            applied = report.applied.len(),
            skipped = report.skipped.len(),
            failed = report.failed.len(),
            "Applied templates"
        );
        Ok(report)
    }

    /// Returns false when no template covers `date`.
    async fn apply_template_on(
        &self,
        organization_id: &str,
        term_id: &str,
        date: NaiveDate,
        weekdays: &HashMap<Weekday, Template>,
        actor: &str,
    ) -> ScheduleResult<bool> {
        let dated = self
            .repo
            .find_template(organization_id, term_id, &TemplateKey::Date(date))
            .await?;
        let Some(template) = dated.as_ref().or_else(|| weekdays.get(&date.weekday())) else {
            return Ok(false);
        };

        let now = self.clock.now();
        let existing = self.repo.find_default_day(organization_id, date).await?;
        let is_new = existing.is_none();
        let mut day = existing.unwrap_or_else(|| {
            DefaultDay::empty(self.ids.day_id(), organization_id, date, actor, now)
        });

        let outcome = merge_blocks(
            std::mem::take(&mut day.blocks),
            &template.blocks,
            MergePolicy::TEMPLATE_INTO_DEFAULT,
            self.ids.as_ref(),
            now,
        )?;
        day.blocks = outcome.blocks;
        if is_new || outcome.stats.changed() {
            day.updated_at = now;
            self.repo.save_default_day(&day).await?;
        }
        Ok(true)
    }

    async fn weekday_templates(
        &self,
        organization_id: &str,
        term_id: &str,
    ) -> ScheduleResult<HashMap<Weekday, Template>> {
        let mut templates = HashMap::new();
        for weekday in WEEKDAYS {
            if let Some(template) = self
                .repo
                .find_template(organization_id, term_id, &TemplateKey::Weekday(weekday))
                .await?
            {
                templates.insert(weekday, template);
            }
        }
        Ok(templates)
    }

    async fn load_template(&self, template_id: TemplateId) -> ScheduleResult<Template> {
        self.repo
            .get_template(template_id)
            .await?
            .ok_or_else(|| ScheduleError::not_found(format!("template {}", template_id)))
    }
}
