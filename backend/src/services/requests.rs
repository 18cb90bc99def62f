//! Inputs and reports of the orchestration operations.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{
    BlockId, LocalizedTitle, RepeatRule, Slot, SlotId, TemplateKey, TimeRange, Tracking,
};
use crate::runtime::IdGenerator;

/// Reject an empty required field.
pub(crate) fn require<'a>(field: &str, value: &'a str) -> ScheduleResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(ScheduleError::validation(format!("{} is required", field)))
    } else {
        Ok(trimmed)
    }
}

/// Content of a slot to author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSlot {
    pub title: String,
    pub start_time: NaiveTime,
    pub duration_minutes: u32,
    pub color: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub localized_titles: Vec<LocalizedTitle>,
}

impl NewSlot {
    pub fn range(&self) -> ScheduleResult<TimeRange> {
        TimeRange::from_start(self.start_time, self.duration_minutes)
    }

    pub(crate) fn validate(&self) -> ScheduleResult<TimeRange> {
        require("title", &self.title)?;
        self.range()
    }

    /// Build the slot at 1-based `position`.
    pub(crate) fn build(
        &self,
        range: TimeRange,
        position: u32,
        ids: &dyn IdGenerator,
        now: DateTime<Utc>,
    ) -> Slot {
        let mut slot = Slot::new(
            ids.slot_id(),
            position,
            self.title.trim(),
            range,
            self.color.clone(),
            now,
        );
        slot.note = self.note.clone();
        slot.localized_titles = self.localized_titles.clone();
        slot
    }
}

/// Author a slot on an organization default day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateDefaultSlotRequest {
    pub organization_id: String,
    pub date: NaiveDate,
    /// Join this existing block; `None` starts a new block.
    #[serde(default)]
    pub block_id: Option<BlockId>,
    pub slot: NewSlot,
    #[serde(default)]
    pub repeat: RepeatRule,
    #[serde(default)]
    pub topic_id: Option<String>,
    pub created_by: String,
}

/// Author a slot on a template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateTemplateSlotRequest {
    pub organization_id: String,
    pub term_id: String,
    pub key: TemplateKey,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    pub slot: NewSlot,
    pub created_by: String,
}

/// Partial update of a slot; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub localized_title: Option<LocalizedTitle>,
}

impl SlotPatch {
    /// The re-timed range, if the patch touches timing.
    pub(crate) fn new_range(&self, current: TimeRange) -> ScheduleResult<Option<TimeRange>> {
        if self.start_time.is_none() && self.duration_minutes.is_none() {
            return Ok(None);
        }
        let start = self.start_time.unwrap_or(current.start);
        let duration = self
            .duration_minutes
            .unwrap_or_else(|| current.duration_minutes());
        TimeRange::from_start(start, duration).map(Some)
    }

    pub(crate) fn validate(&self) -> ScheduleResult<()> {
        if let Some(title) = &self.title {
            require("title", title)?;
        }
        Ok(())
    }

    /// Apply the patch; `range` is the value returned by [`Self::new_range`].
    pub(crate) fn apply(&self, slot: &mut Slot, range: Option<TimeRange>, now: DateTime<Utc>) {
        if let Some(title) = &self.title {
            slot.title = title.trim().to_string();
        }
        if let Some(range) = range {
            slot.set_range(range);
        }
        if let Some(color) = &self.color {
            slot.color = color.clone();
        }
        if let Some(note) = &self.note {
            slot.note = note.clone();
        }
        if let Some(localized) = &self.localized_title {
            slot.upsert_localized_title(localized.clone());
        }
        slot.updated_at = now;
    }
}

/// Update of a template slot, optionally moving it to another block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateSlotUpdate {
    #[serde(flatten)]
    pub patch: SlotPatch,
    #[serde(default)]
    pub move_to_block: Option<BlockId>,
}

/// Tracking and product assignment of a week slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateWeekSlotRequest {
    pub tracking: Tracking,
    #[serde(default)]
    pub product_id: Option<String>,
}

/// Which templates to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateSelector {
    Key(TemplateKey),
    /// All seven weekday templates, Monday first.
    Week,
}

impl std::str::FromStr for TemplateSelector {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("week") {
            Ok(Self::Week)
        } else {
            s.parse().map(Self::Key)
        }
    }
}

/// A date that could not be processed during a range application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateFailure {
    pub date: NaiveDate,
    pub message: String,
}

/// Outcome of applying templates across a date range.
///
/// Dates are independent: `applied` dates were written even if later dates
/// ended up in `failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyReport {
    pub applied: Vec<NaiveDate>,
    /// Dates with no template for their weekday.
    pub skipped: Vec<NaiveDate>,
    pub failed: Vec<DateFailure>,
}

/// Outcome of duplicating a template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateReport {
    pub created: Vec<TemplateKey>,
    /// Targets that already had a template.
    pub skipped: Vec<TemplateKey>,
}

/// Position of a slot inside a block list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotLocation {
    pub block: usize,
    pub slot: usize,
}

pub(crate) fn locate_slot(blocks: &[crate::models::Block], slot_id: SlotId) -> Option<SlotLocation> {
    blocks.iter().enumerate().find_map(|(b, block)| {
        block
            .slots
            .iter()
            .position(|s| s.slot_id == slot_id)
            .map(|s| SlotLocation { block: b, slot: s })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_patch_without_timing_keeps_range() {
        let current = TimeRange::from_start(hm(9, 0), 30).unwrap();
        let patch = SlotPatch {
            title: Some("New".into()),
            ..Default::default()
        };
        assert_eq!(patch.new_range(current).unwrap(), None);
    }

    #[test]
    fn test_patch_duration_only_keeps_start() {
        let current = TimeRange::from_start(hm(9, 0), 30).unwrap();
        let patch = SlotPatch {
            duration_minutes: Some(50),
            ..Default::default()
        };
        let range = patch.new_range(current).unwrap().unwrap();
        assert_eq!(range.start, hm(9, 0));
        assert_eq!(range.end, hm(9, 50));
    }

    #[test]
    fn test_patch_rejects_zero_duration_and_blank_title() {
        let current = TimeRange::from_start(hm(9, 0), 30).unwrap();
        let patch = SlotPatch {
            duration_minutes: Some(0),
            ..Default::default()
        };
        assert!(patch.new_range(current).is_err());

        let patch = SlotPatch {
            title: Some("  ".into()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn test_selector_parse() {
        assert_eq!("week".parse::<TemplateSelector>().unwrap(), TemplateSelector::Week);
        assert!(matches!(
            "tuesday".parse::<TemplateSelector>().unwrap(),
            TemplateSelector::Key(TemplateKey::Weekday(chrono::Weekday::Tue))
        ));
        assert!("fortnight".parse::<TemplateSelector>().is_err());
    }
}
