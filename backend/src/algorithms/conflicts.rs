//! Slot conflict detection.
//!
//! Two time ranges conflict when they overlap as half-open intervals, or
//! when any endpoint of one equals any endpoint of the other. Back-to-back
//! slots meeting at the same instant are therefore rejected. The check is
//! Day-scoped and only gates insertions and re-timings; existing data is
//! never re-validated.

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Block, Slot, SlotId, TimeRange};

/// Whether two ranges conflict.
pub fn ranges_conflict(a: &TimeRange, b: &TimeRange) -> bool {
    a.overlaps(b) || a.shares_endpoint(b)
}

/// First slot in `slots` that conflicts with `candidate`, skipping `exclude`.
pub fn find_conflict<'a, I>(candidate: &TimeRange, slots: I, exclude: Option<SlotId>) -> Option<&'a Slot>
where
    I: IntoIterator<Item = &'a Slot>,
{
    slots
        .into_iter()
        .filter(|slot| Some(slot.slot_id) != exclude)
        .find(|slot| ranges_conflict(candidate, &slot.range()))
}

/// Whether `candidate` conflicts with any slot across `blocks`.
pub fn conflicts(candidate: &TimeRange, blocks: &[Block], exclude: Option<SlotId>) -> bool {
    find_conflict(candidate, blocks.iter().flat_map(|b| b.slots.iter()), exclude).is_some()
}

/// Fail with [`ScheduleError::Conflict`] naming the offending slot.
pub fn ensure_no_conflict(
    candidate: &TimeRange,
    blocks: &[Block],
    exclude: Option<SlotId>,
) -> ScheduleResult<()> {
    match find_conflict(candidate, blocks.iter().flat_map(|b| b.slots.iter()), exclude) {
        Some(existing) => Err(ScheduleError::Conflict {
            candidate: *candidate,
            existing: existing.range(),
            existing_slot_id: existing.slot_id,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BlockId;
    use chrono::{NaiveTime, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn range(a: (u32, u32), b: (u32, u32)) -> TimeRange {
        TimeRange::new(hm(a.0, a.1), hm(b.0, b.1)).unwrap()
    }

    fn day_with(slot_ranges: &[TimeRange]) -> Vec<Block> {
        slot_ranges
            .iter()
            .enumerate()
            .map(|(i, r)| {
                let mut block = Block::new(BlockId::new(Uuid::from_u128(100 + i as u128)));
                block.slots.push(Slot::new(
                    SlotId::new(Uuid::from_u128(1 + i as u128)),
                    1,
                    "slot",
                    *r,
                    "#000000",
                    Utc::now(),
                ));
                block
            })
            .collect()
    }

    #[test]
    fn test_boundary_examples() {
        let blocks = day_with(&[range((9, 0), (9, 30))]);
        assert!(conflicts(&range((9, 15), (9, 45)), &blocks, None));
        assert!(conflicts(&range((9, 30), (10, 0)), &blocks, None));
        assert!(!conflicts(&range((9, 31), (10, 0)), &blocks, None));
    }

    #[test]
    fn test_scans_every_block_of_the_day() {
        let blocks = day_with(&[range((8, 0), (8, 30)), range((13, 0), (14, 0))]);
        assert!(conflicts(&range((13, 30), (13, 45)), &blocks, None));
        assert!(!conflicts(&range((10, 0), (11, 0)), &blocks, None));
    }

    #[test]
    fn test_exclude_skips_edited_slot() {
        let blocks = day_with(&[range((9, 0), (9, 30))]);
        let own = blocks[0].slots[0].slot_id;
        assert!(!conflicts(&range((9, 0), (9, 30)), &blocks, Some(own)));
        assert!(conflicts(&range((9, 0), (9, 30)), &blocks, None));
    }

    #[test]
    fn test_ensure_reports_existing_range() {
        let blocks = day_with(&[range((9, 0), (9, 30))]);
        match ensure_no_conflict(&range((9, 15), (9, 45)), &blocks, None) {
            Err(ScheduleError::Conflict { existing, existing_slot_id, .. }) => {
                assert_eq!(existing, range((9, 0), (9, 30)));
                assert_eq!(existing_slot_id, blocks[0].slots[0].slot_id);
            }
            other => panic!("expected conflict, got {:?}", other),
        }
    }

    fn range_strategy() -> impl Strategy<Value = TimeRange> {
        (0u32..1380, 1u32..60).prop_map(|(start, len)| {
            let start = NaiveTime::from_num_seconds_from_midnight_opt(start * 60, 0).unwrap();
            TimeRange::from_start(start, len).unwrap()
        })
    }

    proptest! {
        #[test]
        fn prop_conflict_is_symmetric(a in range_strategy(), b in range_strategy()) {
            prop_assert_eq!(ranges_conflict(&a, &b), ranges_conflict(&b, &a));
        }

        #[test]
        fn prop_self_excluded_never_conflicts(a in range_strategy()) {
            let blocks = day_with(&[a]);
            let own = blocks[0].slots[0].slot_id;
            prop_assert!(!conflicts(&a, &blocks, Some(own)));
            prop_assert!(conflicts(&a, &blocks, None));
        }
    }
}
