//! In-memory document set shared by the local and file repositories.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::models::{
    DayId, DefaultDay, Owner, Template, TemplateId, TemplateKey, Tracking, Week, WeekId,
};

#[derive(Debug, Clone, Default)]
pub(crate) struct Snapshot {
    weeks: HashMap<WeekId, Week>,
    default_days: HashMap<DayId, DefaultDay>,
    templates: HashMap<TemplateId, Template>,
}

/// On-disk layout: plain arrays, sorted for stable diffs.
#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct SnapshotFile {
    #[serde(default)]
    pub weeks: Vec<Week>,
    #[serde(default)]
    pub default_days: Vec<DefaultDay>,
    #[serde(default)]
    pub templates: Vec<Template>,
}

impl From<SnapshotFile> for Snapshot {
    fn from(file: SnapshotFile) -> Self {
        Self {
            weeks: file.weeks.into_iter().map(|w| (w.week_id, w)).collect(),
            default_days: file.default_days.into_iter().map(|d| (d.day_id, d)).collect(),
            templates: file.templates.into_iter().map(|t| (t.template_id, t)).collect(),
        }
    }
}

impl Snapshot {
    pub fn to_file(&self) -> SnapshotFile {
        let mut weeks: Vec<Week> = self.weeks.values().cloned().collect();
        weeks.sort_by_key(|w| (w.organization_id.clone(), w.start_date, w.week_id));
        let mut default_days: Vec<DefaultDay> = self.default_days.values().cloned().collect();
        default_days.sort_by_key(|d| (d.organization_id.clone(), d.date, d.day_id));
        let mut templates: Vec<Template> = self.templates.values().cloned().collect();
        templates.sort_by_key(|t| t.template_id);
        SnapshotFile {
            weeks,
            default_days,
            templates,
        }
    }

    fn owner_weeks<'a>(
        &'a self,
        organization_id: &'a str,
        owner: &'a Owner,
    ) -> impl Iterator<Item = &'a Week> + 'a {
        self.weeks
            .values()
            .filter(move |w| w.organization_id == organization_id && &w.owner == owner)
    }

    pub fn find_week(
        &self,
        organization_id: &str,
        owner: &Owner,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Option<Week> {
        self.owner_weeks(organization_id, owner)
            .filter(|w| w.overlaps(start, end))
            .min_by_key(|w| (w.start_date, w.created_at, w.week_id))
            .cloned()
    }

    pub fn get_week(&self, week_id: WeekId) -> Option<Week> {
        self.weeks.get(&week_id).cloned()
    }

    pub fn save_week(&mut self, week: &Week) {
        self.weeks.insert(week.week_id, week.clone());
    }

    pub fn list_weeks_by_tracking(
        &self,
        organization_id: &str,
        owner: &Owner,
        label: &Tracking,
    ) -> Vec<Week> {
        let mut weeks: Vec<Week> = self
            .owner_weeks(organization_id, owner)
            .filter(|w| w.has_tracking(label))
            .cloned()
            .collect();
        weeks.sort_by_key(|w| (w.start_date, w.created_at, w.week_id));
        weeks
    }

    pub fn count_tracking_usage(&self, organization_id: &str, owner: &Owner, label: &Tracking) -> usize {
        self.owner_weeks(organization_id, owner)
            .flat_map(|w| w.slots())
            .filter(|s| s.tracking.as_ref() == Some(label))
            .count()
    }

    pub fn find_default_day(&self, organization_id: &str, date: NaiveDate) -> Option<DefaultDay> {
        self.default_days
            .values()
            .filter(|d| d.organization_id == organization_id && d.date == date)
            .min_by_key(|d| (d.created_at, d.day_id))
            .cloned()
    }

    pub fn get_default_day(&self, day_id: DayId) -> Option<DefaultDay> {
        self.default_days.get(&day_id).cloned()
    }

    pub fn list_default_days_in_range(
        &self,
        organization_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<DefaultDay> {
        let mut days: Vec<DefaultDay> = self
            .default_days
            .values()
            .filter(|d| d.organization_id == organization_id && d.date >= start && d.date <= end)
            .cloned()
            .collect();
        days.sort_by_key(|d| (d.date, d.created_at));
        days
    }

    pub fn list_default_days(&self, organization_id: &str) -> Vec<DefaultDay> {
        let mut days: Vec<DefaultDay> = self
            .default_days
            .values()
            .filter(|d| d.organization_id == organization_id)
            .cloned()
            .collect();
        days.sort_by_key(|d| (d.date, d.created_at));
        days
    }

    pub fn save_default_day(&mut self, day: &DefaultDay) {
        self.default_days.insert(day.day_id, day.clone());
    }

    pub fn delete_default_day(&mut self, day_id: DayId) -> bool {
        self.default_days.remove(&day_id).is_some()
    }

    pub fn find_template(&self, organization_id: &str, term_id: &str, key: &TemplateKey) -> Option<Template> {
        self.templates
            .values()
            .filter(|t| t.organization_id == organization_id && t.term_id == term_id && &t.key == key)
            .min_by_key(|t| (t.created_at, t.template_id))
            .cloned()
    }

    pub fn get_template(&self, template_id: TemplateId) -> Option<Template> {
        self.templates.get(&template_id).cloned()
    }

    pub fn save_template(&mut self, template: &Template) {
        self.templates.insert(template.template_id, template.clone());
    }

    pub fn counts(&self) -> (usize, usize, usize) {
        (self.weeks.len(), self.default_days.len(), self.templates.len())
    }
}
