//! Tracking usage normalization.
//!
//! The usage rank of a slot is its 1-based position, by creation time,
//! among all of an owner's slots carrying the same tracking label. Ranks are
//! always recomputed from the full matching set; no counter is stored.

use chrono::{DateTime, Utc};

use crate::models::{Tracking, Week};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NormalizeOutcome {
    /// Number of slots carrying the label.
    pub matched: usize,
    /// Indexes (into the input slice) of weeks with at least one rank change.
    pub changed_weeks: Vec<usize>,
}

/// Re-rank every slot labelled `label` across `weeks`.
///
/// Ties on `created_at` keep the order in which slots appear in `weeks`.
/// A slot whose rank changes gets `updated_at = now`.
pub fn normalize_tracking(weeks: &mut [Week], label: &Tracking, now: DateTime<Utc>) -> NormalizeOutcome {
    // (created_at, week index, day index, block index, slot index)
    let mut matches = Vec::new();
    for (w, week) in weeks.iter().enumerate() {
        for (d, day) in week.days.iter().enumerate() {
            for (b, block) in day.blocks.iter().enumerate() {
                for (s, slot) in block.slots.iter().enumerate() {
                    if slot.tracking.as_ref() == Some(label) {
                        matches.push((slot.created_at, w, d, b, s));
                    }
                }
            }
        }
    }
    matches.sort_by_key(|m| m.0);

    let mut changed_weeks = Vec::new();
    for (rank, (_, w, d, b, s)) in matches.iter().enumerate() {
        let slot = &mut weeks[*w].days[*d].blocks[*b].slots[*s];
        let use_count = rank as u32 + 1;
        if slot.use_count != use_count {
            slot.use_count = use_count;
            slot.updated_at = now;
            if !changed_weeks.contains(w) {
                changed_weeks.push(*w);
            }
        }
    }
    changed_weeks.sort_unstable();

    NormalizeOutcome {
        matched: matches.len(),
        changed_weeks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Block, BlockId, Day, DayId, Owner, Slot, SlotId, TimeRange, WeekId};
    use chrono::{Duration, NaiveDate, NaiveTime, TimeZone};
    use uuid::Uuid;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap()
    }

    fn tracked_slot(id: u128, label: Option<&str>, created_at: DateTime<Utc>, use_count: u32) -> Slot {
        let start = NaiveTime::from_hms_opt(9, 0, 0).unwrap() + Duration::hours(id as i64 % 10);
        let mut slot = Slot::new(
            SlotId::new(Uuid::from_u128(id)),
            1,
            "slot",
            TimeRange::from_start(start, 30).unwrap(),
            "#000000",
            created_at,
        );
        slot.tracking = label.map(|l| Tracking::new(l).unwrap());
        slot.use_count = use_count;
        slot
    }

    fn week(id: u128, start: NaiveDate, slots: Vec<Slot>) -> Week {
        let mut block = Block::new(BlockId::new(Uuid::from_u128(id * 1000)));
        block.slots = slots;
        let mut day = Day::empty(DayId::new(Uuid::from_u128(id * 1000 + 1)), start, t0());
        day.blocks.push(block);
        Week {
            week_id: WeekId::new(Uuid::from_u128(id)),
            organization_id: "org".to_string(),
            owner: Owner::new("u1", "student"),
            start_date: start,
            end_date: start + Duration::days(6),
            topic_id: None,
            days: vec![day],
            created_by: "u1".to_string(),
            created_at: t0(),
            updated_at: t0(),
        }
    }

    fn ranks(weeks: &[Week], label: &str) -> Vec<(u128, u32)> {
        let mut out: Vec<_> = weeks
            .iter()
            .flat_map(|w| w.slots())
            .filter(|s| s.tracking.as_ref().map(|t| t.as_str()) == Some(label))
            .map(|s| (s.slot_id.value().as_u128(), s.use_count))
            .collect();
        out.sort();
        out
    }

    #[test]
    fn test_ranks_follow_creation_order_across_weeks() {
        let label = Tracking::new("reading").unwrap();
        let d1 = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        // T3 sits in the first week, T1 and T2 in the second.
        let mut weeks = vec![
            week(1, d1, vec![tracked_slot(3, Some("reading"), t0() + Duration::hours(3), 1)]),
            week(
                2,
                d2,
                vec![
                    tracked_slot(1, Some("reading"), t0() + Duration::hours(1), 7),
                    tracked_slot(2, Some("reading"), t0() + Duration::hours(2), 7),
                    tracked_slot(4, Some("math"), t0(), 9),
                ],
            ),
        ];

        let out = normalize_tracking(&mut weeks, &label, t0());
        assert_eq!(out.matched, 3);
        assert_eq!(ranks(&weeks, "reading"), vec![(1, 1), (2, 2), (3, 3)]);
        assert_eq!(ranks(&weeks, "math"), vec![(4, 9)]);
        assert_eq!(out.changed_weeks, vec![0, 1]);
    }

    #[test]
    fn test_equal_timestamps_keep_iteration_order() {
        let label = Tracking::new("reading").unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut weeks = vec![week(
            1,
            d,
            vec![
                tracked_slot(9, Some("reading"), t0(), 0),
                tracked_slot(5, Some("reading"), t0(), 0),
            ],
        )];
        normalize_tracking(&mut weeks, &label, t0());
        let slots: Vec<_> = weeks[0].slots().map(|s| (s.slot_id.value().as_u128(), s.use_count)).collect();
        assert_eq!(slots, vec![(9, 1), (5, 2)]);
    }

    #[test]
    fn test_rerun_is_idempotent_and_reports_no_changes() {
        let label = Tracking::new("reading").unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut weeks = vec![week(
            1,
            d,
            vec![
                tracked_slot(1, Some("reading"), t0() + Duration::hours(2), 0),
                tracked_slot(2, Some("reading"), t0(), 0),
            ],
        )];
        normalize_tracking(&mut weeks, &label, t0());
        let snapshot = weeks.clone();
        let again = normalize_tracking(&mut weeks, &label, t0() + Duration::days(1));
        assert_eq!(weeks, snapshot);
        assert!(again.changed_weeks.is_empty());
    }

    #[test]
    fn test_no_matches_changes_nothing() {
        let label = Tracking::new("art").unwrap();
        let d = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let mut weeks = vec![week(1, d, vec![tracked_slot(1, None, t0(), 0)])];
        let out = normalize_tracking(&mut weeks, &label, t0());
        assert_eq!(out, NormalizeOutcome::default());
    }
}
