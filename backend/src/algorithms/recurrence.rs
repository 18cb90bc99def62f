//! Recurrence expansion.
//!
//! [`expand`] turns a base date and a [`RepeatRule`] into the dates on which
//! the base day's content should also exist. The sequence is finite, starts
//! with the base date, and is strictly increasing. A rule without `until`
//! yields only the base date, whatever its type.

use chrono::{Duration, Months, NaiveDate};

use crate::models::{RepeatRule, RepeatType};

/// Lazy, restartable sequence of occurrence dates.
#[derive(Debug, Clone)]
pub struct Occurrences {
    base: NaiveDate,
    repeat_type: RepeatType,
    interval: u32,
    until: Option<NaiveDate>,
    offsets: Vec<i64>,
    step: u32,
    done: bool,
}

/// Expand `base` according to `rule`.
pub fn expand(base: NaiveDate, rule: &RepeatRule) -> Occurrences {
    let mut offsets: Vec<i64> = rule
        .custom_offsets
        .iter()
        .copied()
        .filter(|o| *o > 0)
        .collect();
    offsets.sort_unstable();
    offsets.dedup();

    Occurrences {
        base,
        repeat_type: rule.repeat_type,
        interval: rule.interval.max(1),
        until: rule.until,
        offsets,
        step: 0,
        done: false,
    }
}

impl Occurrences {
    /// The `k`-th candidate date (k = 0 is the base), before the `until` cut.
    fn candidate(&self, k: u32) -> Option<NaiveDate> {
        if k == 0 {
            return Some(self.base);
        }
        match self.repeat_type {
            RepeatType::None => None,
            RepeatType::Daily => self
                .base
                .checked_add_signed(Duration::days(i64::from(k) * i64::from(self.interval))),
            RepeatType::Weekly => self
                .base
                .checked_add_signed(Duration::days(7 * i64::from(k) * i64::from(self.interval))),
            // Always measured from the base so a clamped day-of-month (Jan 31 -> Feb 28)
            // does not carry into later months.
            RepeatType::Monthly => self
                .base
                .checked_add_months(Months::new(k.checked_mul(self.interval)?)),
            RepeatType::Custom => {
                let offset = *self.offsets.get(k as usize - 1)?;
                self.base.checked_add_signed(Duration::days(offset))
            }
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        if self.done {
            return None;
        }
        let k = self.step;
        self.step += 1;

        if k == 0 {
            if self.until.is_none() {
                self.done = true;
            }
            return Some(self.base);
        }

        let until = self.until?;
        match self.candidate(k) {
            Some(date) if date <= until => Some(date),
            _ => {
                self.done = true;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rule(repeat_type: RepeatType, interval: u32, until: Option<NaiveDate>) -> RepeatRule {
        RepeatRule {
            repeat_type,
            interval,
            until,
            custom_offsets: Vec::new(),
        }
    }

    #[test]
    fn test_none_yields_base_only() {
        let base = ymd(2025, 3, 10);
        let dates: Vec<_> = expand(base, &rule(RepeatType::None, 1, Some(ymd(2025, 4, 1)))).collect();
        assert_eq!(dates, vec![base]);
    }

    #[test]
    fn test_daily_with_interval() {
        let base = ymd(2025, 3, 10);
        let dates: Vec<_> = expand(base, &rule(RepeatType::Daily, 2, Some(ymd(2025, 3, 15)))).collect();
        assert_eq!(dates, vec![ymd(2025, 3, 10), ymd(2025, 3, 12), ymd(2025, 3, 14)]);
    }

    #[test]
    fn test_weekly_includes_until_when_aligned() {
        let base = ymd(2025, 3, 10);
        let dates: Vec<_> = expand(base, &rule(RepeatType::Weekly, 1, Some(ymd(2025, 3, 24)))).collect();
        assert_eq!(dates, vec![ymd(2025, 3, 10), ymd(2025, 3, 17), ymd(2025, 3, 24)]);
    }

    #[test]
    fn test_monthly_clamps_without_drift() {
        let base = ymd(2025, 1, 31);
        let dates: Vec<_> = expand(base, &rule(RepeatType::Monthly, 1, Some(ymd(2025, 4, 30)))).collect();
        assert_eq!(
            dates,
            vec![ymd(2025, 1, 31), ymd(2025, 2, 28), ymd(2025, 3, 31), ymd(2025, 4, 30)]
        );
    }

    #[test]
    fn test_monthly_without_until_is_base_only() {
        let base = ymd(2025, 1, 15);
        let dates: Vec<_> = expand(base, &rule(RepeatType::Monthly, 1, None)).collect();
        assert_eq!(dates, vec![base]);
    }

    #[test]
    fn test_custom_offsets_sorted_deduped_and_cut() {
        let base = ymd(2025, 3, 10);
        let mut r = rule(RepeatType::Custom, 1, Some(ymd(2025, 3, 20)));
        r.custom_offsets = vec![7, 0, 3, 3, 30];
        let dates: Vec<_> = expand(base, &r).collect();
        assert_eq!(dates, vec![ymd(2025, 3, 10), ymd(2025, 3, 13), ymd(2025, 3, 17)]);
    }

    #[test]
    fn test_sequence_is_restartable() {
        let base = ymd(2025, 3, 10);
        let occurrences = expand(base, &rule(RepeatType::Daily, 1, Some(ymd(2025, 3, 12))));
        let first: Vec<_> = occurrences.clone().collect();
        let second: Vec<_> = occurrences.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
    }

    fn repeat_type_strategy() -> impl Strategy<Value = RepeatType> {
        prop_oneof![
            Just(RepeatType::None),
            Just(RepeatType::Daily),
            Just(RepeatType::Weekly),
            Just(RepeatType::Monthly),
            Just(RepeatType::Custom),
        ]
    }

    proptest! {
        #[test]
        fn prop_bounded_increasing_base_first(
            base_offset in 0i64..3650,
            span in 0i64..400,
            interval in 1u32..6,
            repeat_type in repeat_type_strategy(),
            offsets in proptest::collection::vec(-5i64..120, 0..8),
        ) {
            let base = ymd(2020, 1, 1) + Duration::days(base_offset);
            let until = base + Duration::days(span);
            let r = RepeatRule { repeat_type, interval, until: Some(until), custom_offsets: offsets };
            let dates: Vec<_> = expand(base, &r).collect();

            prop_assert_eq!(dates[0], base);
            prop_assert!(dates.iter().all(|d| *d <= until));
            prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        }

        #[test]
        fn prop_no_until_yields_base_only(
            base_offset in 0i64..3650,
            interval in 1u32..6,
            repeat_type in repeat_type_strategy(),
            offsets in proptest::collection::vec(1i64..60, 0..5),
        ) {
            let base = ymd(2020, 1, 1) + Duration::days(base_offset);
            let r = RepeatRule { repeat_type, interval, until: None, custom_offsets: offsets };
            let dates: Vec<_> = expand(base, &r).collect();
            prop_assert_eq!(dates, vec![base]);
        }
    }
}
