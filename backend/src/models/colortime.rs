//! Schedule documents: slots, blocks, days, weeks, default days and templates.
//!
//! The same [`Block`]/[`Slot`] shape is shared by every layer, so the
//! reconciliation algorithms can merge any source layer into any target
//! layer without conversion.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::time::{
    parse_date, parse_weekday_name, weekday_name, TimeRange, DATE_FORMAT,
};
use crate::error::{ScheduleError, ScheduleResult};

crate::define_id_type!(SlotId, "slot id");
crate::define_id_type!(BlockId, "block id");
crate::define_id_type!(DayId, "day id");
crate::define_id_type!(WeekId, "week id");
crate::define_id_type!(TemplateId, "template id");

/// Week owner: a user id together with the role it acts in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub owner_id: String,
    pub owner_role: String,
}

impl Owner {
    pub fn new(owner_id: impl Into<String>, owner_role: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            owner_role: owner_role.into(),
        }
    }
}

/// Non-empty label grouping slots for usage ranking.
///
/// An untracked slot carries `None`, never an empty label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Tracking(String);

impl Tracking {
    pub fn new(label: impl Into<String>) -> ScheduleResult<Self> {
        let label = label.into();
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(ScheduleError::validation("tracking is required"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Tracking {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tracking::new(value)
    }
}

impl From<Tracking> for String {
    fn from(value: Tracking) -> Self {
        value.0
    }
}

impl fmt::Display for Tracking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Title of a slot in one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedTitle {
    pub language_id: u32,
    pub title: String,
}

/// The atomic schedulable unit.
///
/// `end_time == start_time + duration_minutes` holds at all times; use
/// [`Slot::set_range`] to re-time a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub slot_id: SlotId,
    /// Source-layer slot this one was cloned or merged from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_slot_id: Option<SlotId>,
    /// 1-based position within the containing block.
    pub sessions: u32,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub localized_titles: Vec<LocalizedTitle>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_minutes: u32,
    pub color: String,
    #[serde(default)]
    pub note: String,
    #[serde(default)]
    pub tracking: Option<Tracking>,
    /// Derived 1-based rank among the owner's slots sharing `tracking`.
    #[serde(default)]
    pub use_count: u32,
    #[serde(default)]
    pub product_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Slot {
    /// Create a user-authored slot (no back-reference, untracked).
    pub fn new(
        slot_id: SlotId,
        sessions: u32,
        title: impl Into<String>,
        range: TimeRange,
        color: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            slot_id,
            prior_slot_id: None,
            sessions,
            title: title.into(),
            localized_titles: Vec::new(),
            start_time: range.start,
            end_time: range.end,
            duration_minutes: range.duration_minutes(),
            color: color.into(),
            note: String::new(),
            tracking: None,
            use_count: 0,
            product_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn range(&self) -> TimeRange {
        TimeRange {
            start: self.start_time,
            end: self.end_time,
        }
    }

    /// Re-time the slot, keeping start, end and duration consistent.
    pub fn set_range(&mut self, range: TimeRange) {
        self.start_time = range.start;
        self.end_time = range.end;
        self.duration_minutes = range.duration_minutes();
    }

    /// Key used to match this slot against a source layer.
    pub fn identity_key(&self) -> SlotId {
        self.prior_slot_id.unwrap_or(self.slot_id)
    }

    /// Add or replace the title for one language.
    pub fn upsert_localized_title(&mut self, localized: LocalizedTitle) {
        match self
            .localized_titles
            .iter_mut()
            .find(|t| t.language_id == localized.language_id)
        {
            Some(existing) => existing.title = localized.title,
            None => self.localized_titles.push(localized),
        }
    }
}

/// Ordered group of slots created together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub block_id: BlockId,
    /// Source-layer block this one was cloned or merged from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_block_id: Option<BlockId>,
    #[serde(default)]
    pub slots: Vec<Slot>,
}

impl Block {
    pub fn new(block_id: BlockId) -> Self {
        Self {
            block_id,
            prior_block_id: None,
            slots: Vec::new(),
        }
    }

    /// Key used to match this block against a source layer.
    pub fn identity_key(&self) -> BlockId {
        self.prior_block_id.unwrap_or(self.block_id)
    }

    /// Renumber `sessions` as 1-based positions.
    pub fn renumber_sessions(&mut self) {
        for (idx, slot) in self.slots.iter_mut().enumerate() {
            slot.sessions = idx as u32 + 1;
        }
    }
}

/// Every slot across a day's blocks.
pub fn slots_of(blocks: &[Block]) -> impl Iterator<Item = &Slot> {
    blocks.iter().flat_map(|b| b.slots.iter())
}

/// Find a slot by id across a day's blocks.
pub fn find_slot_mut(blocks: &mut [Block], slot_id: SlotId) -> Option<&mut Slot> {
    blocks
        .iter_mut()
        .flat_map(|b| b.slots.iter_mut())
        .find(|s| s.slot_id == slot_id)
}

/// One calendar date's blocks inside a [`Week`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Day {
    pub day_id: DayId,
    pub date: NaiveDate,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Day {
    pub fn empty(day_id: DayId, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            day_id,
            date,
            topic_id: None,
            blocks: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// An owner's materialized schedule for `[start_date, end_date]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Week {
    pub week_id: WeekId,
    pub organization_id: String,
    pub owner: Owner,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub days: Vec<Day>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Week {
    /// Whether `[start, end]` intersects this week's range.
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        self.start_date <= end && self.end_date >= start
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.iter().find(|d| d.date == date)
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut Day> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.days.iter().flat_map(|d| slots_of(&d.blocks))
    }

    pub fn find_slot_mut(&mut self, slot_id: SlotId) -> Option<&mut Slot> {
        self.days
            .iter_mut()
            .find_map(|d| find_slot_mut(&mut d.blocks, slot_id))
    }

    /// Whether any slot of this week carries `label`.
    pub fn has_tracking(&self, label: &Tracking) -> bool {
        self.slots().any(|s| s.tracking.as_ref() == Some(label))
    }
}

/// Repeat cadence of a default day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatType {
    #[default]
    None,
    Daily,
    Weekly,
    Monthly,
    Custom,
}

impl FromStr for RepeatType {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "none" => Ok(Self::None),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            "custom" => Ok(Self::Custom),
            other => Err(ScheduleError::validation(format!(
                "unknown repeat type '{}' (use none, daily, weekly, monthly or custom)",
                other
            ))),
        }
    }
}

/// How a base day regenerates across future dates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepeatRule {
    #[serde(rename = "type", default)]
    pub repeat_type: RepeatType,
    #[serde(default = "default_interval")]
    pub interval: u32,
    #[serde(default)]
    pub until: Option<NaiveDate>,
    /// Day offsets from the base date, used by `custom`.
    #[serde(default)]
    pub custom_offsets: Vec<i64>,
}

fn default_interval() -> u32 {
    1
}

impl Default for RepeatRule {
    fn default() -> Self {
        Self::none()
    }
}

impl RepeatRule {
    pub fn none() -> Self {
        Self {
            repeat_type: RepeatType::None,
            interval: 1,
            until: None,
            custom_offsets: Vec::new(),
        }
    }

    /// Check the rule against the date it repeats from.
    pub fn validate(&self, base_date: NaiveDate) -> ScheduleResult<()> {
        if self.interval == 0 {
            return Err(ScheduleError::validation(
                "repeat interval must be at least 1",
            ));
        }
        if let Some(until) = self.until {
            if until < base_date {
                return Err(ScheduleError::validation(format!(
                    "repeat until {} is before base date {}",
                    until, base_date
                )));
            }
        }
        if self.repeat_type == RepeatType::Custom && self.custom_offsets.iter().any(|o| *o < 0) {
            return Err(ScheduleError::validation(
                "custom repeat offsets must not be negative",
            ));
        }
        Ok(())
    }

    /// Whether the rule can produce dates beyond the base date.
    pub fn repeats(&self) -> bool {
        self.repeat_type != RepeatType::None && self.until.is_some()
    }
}

/// Organization-wide schedule for one date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultDay {
    pub day_id: DayId,
    pub organization_id: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub topic_id: Option<String>,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub is_base_template: bool,
    #[serde(default)]
    pub repeat: RepeatRule,
    /// Base day whose repeat rule generated this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_template_id: Option<DayId>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DefaultDay {
    pub fn empty(
        day_id: DayId,
        organization_id: impl Into<String>,
        date: NaiveDate,
        created_by: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            day_id,
            organization_id: organization_id.into(),
            date,
            topic_id: None,
            blocks: Vec::new(),
            is_base_template: false,
            repeat: RepeatRule::none(),
            base_template_id: None,
            created_by: created_by.into(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Keep only titles in `language_id` on every slot.
    pub fn retain_language(&mut self, language_id: u32) {
        for slot in self.blocks.iter_mut().flat_map(|b| b.slots.iter_mut()) {
            slot.localized_titles.retain(|t| t.language_id == language_id);
        }
    }
}

/// Address of a template: a weekday name or a literal date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TemplateKey {
    Weekday(Weekday),
    Date(NaiveDate),
}

impl TemplateKey {
    /// Weekday keys following this one, up to Sunday.
    pub fn remaining_weekdays(&self) -> Vec<TemplateKey> {
        match self {
            TemplateKey::Weekday(day) => {
                let mut keys = Vec::new();
                let mut next = day.succ();
                while next != Weekday::Mon {
                    keys.push(TemplateKey::Weekday(next));
                    next = next.succ();
                }
                keys
            }
            TemplateKey::Date(_) => Vec::new(),
        }
    }
}

impl FromStr for TemplateKey {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(day) = parse_weekday_name(s) {
            return Ok(TemplateKey::Weekday(day));
        }
        parse_date(s, "template date")
            .map(TemplateKey::Date)
            .map_err(|_| {
                ScheduleError::validation(format!(
                    "invalid template key '{}' (use a weekday name or YYYY-MM-DD)",
                    s
                ))
            })
    }
}

impl TryFrom<String> for TemplateKey {
    type Error = ScheduleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TemplateKey> for String {
    fn from(value: TemplateKey) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateKey::Weekday(day) => f.write_str(weekday_name(*day)),
            TemplateKey::Date(date) => write!(f, "{}", date.format(DATE_FORMAT)),
        }
    }
}

/// Reusable pattern keyed by `(organization, term, key)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub template_id: TemplateId,
    pub organization_id: String,
    pub term_id: String,
    pub key: TemplateKey,
    #[serde(default)]
    pub blocks: Vec<Block>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_tracking_rejects_blank_and_trims() {
        assert!(Tracking::new("   ").is_err());
        assert_eq!(Tracking::new(" math ").unwrap().as_str(), "math");
    }

    #[test]
    fn test_tracking_deserialize_rejects_empty() {
        let ok: Tracking = serde_json::from_str("\"reading\"").unwrap();
        assert_eq!(ok.as_str(), "reading");
        assert!(serde_json::from_str::<Tracking>("\"\"").is_err());
    }

    #[test]
    fn test_id_parse_rejects_nil_and_garbage() {
        assert!(SlotId::parse("not-a-uuid").is_err());
        assert!(SlotId::parse(&Uuid::nil().to_string()).is_err());
        let id = Uuid::from_u128(42);
        assert_eq!(SlotId::parse(&id.to_string()).unwrap(), SlotId::new(id));
    }

    #[test]
    fn test_repeat_type_from_str() {
        assert_eq!("".parse::<RepeatType>().unwrap(), RepeatType::None);
        assert_eq!("Weekly".parse::<RepeatType>().unwrap(), RepeatType::Weekly);
        assert!("yearly".parse::<RepeatType>().is_err());
    }

    #[test]
    fn test_repeat_rule_validation() {
        let base = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut rule = RepeatRule {
            repeat_type: RepeatType::Daily,
            interval: 0,
            until: Some(base),
            custom_offsets: vec![],
        };
        assert!(rule.validate(base).is_err());
        rule.interval = 2;
        assert!(rule.validate(base).is_ok());
        rule.until = base.pred_opt();
        assert!(rule.validate(base).is_err());
    }

    #[test]
    fn test_template_key_parse_and_display() {
        let key: TemplateKey = "Monday".parse().unwrap();
        assert_eq!(key, TemplateKey::Weekday(Weekday::Mon));
        assert_eq!(key.to_string(), "monday");

        let key: TemplateKey = "2025-09-01".parse().unwrap();
        assert_eq!(key.to_string(), "2025-09-01");

        assert!("someday".parse::<TemplateKey>().is_err());
    }

    #[test]
    fn test_remaining_weekdays() {
        let keys = TemplateKey::Weekday(Weekday::Fri).remaining_weekdays();
        let names: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(names, vec!["saturday", "sunday"]);
        assert!(TemplateKey::Weekday(Weekday::Sun)
            .remaining_weekdays()
            .is_empty());
    }

    #[test]
    fn test_slot_set_range_keeps_duration_consistent() {
        let now = Utc::now();
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let mut slot = Slot::new(
            SlotId::new(Uuid::from_u128(1)),
            1,
            "Reading",
            TimeRange::from_start(start, 30).unwrap(),
            "#ff0000",
            now,
        );
        assert_eq!(slot.duration_minutes, 30);
        slot.set_range(TimeRange::from_start(start, 45).unwrap());
        assert_eq!(slot.duration_minutes, 45);
        assert_eq!(slot.end_time, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
    }
}
