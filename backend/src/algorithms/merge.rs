//! Identity-preserving merge of a source schedule layer into a target layer.
//!
//! Target entities are matched to source entities by identity key: the
//! target's back-reference (`prior_block_id` / `prior_slot_id`) when set,
//! else its own id. Source entities are keyed by their own id.
//!
//! - matched blocks keep the target identity and get a slot-level merge
//! - unmatched source entities are cloned with fresh ids and a back-reference
//! - unmatched target entities are dropped or kept per [`OrphanPolicy`]
//!
//! Output order follows the source, with kept orphans appended in their
//! original order. Merging the same source twice yields the same result as
//! merging it once.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

use crate::error::{ScheduleError, ScheduleResult};
use crate::models::{Block, BlockId, Slot, SlotId};
use crate::runtime::IdGenerator;

/// What happens to target entities with no source counterpart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrphanPolicy {
    DropOrphans,
    KeepOrphans,
}

/// What happens to the content of a matched slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedSlotPolicy {
    /// The target slot is kept exactly as it is.
    PreserveTarget,
    /// Title, time range and color are taken from the source.
    OverwriteStructure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergePolicy {
    pub orphans: OrphanPolicy,
    pub matched: MatchedSlotPolicy,
}

impl MergePolicy {
    /// Organization default day into a user's week day.
    pub const DEFAULT_INTO_WEEK: MergePolicy = MergePolicy {
        orphans: OrphanPolicy::DropOrphans,
        matched: MatchedSlotPolicy::PreserveTarget,
    };

    /// Weekday template into an organization default day.
    pub const TEMPLATE_INTO_DEFAULT: MergePolicy = MergePolicy {
        orphans: OrphanPolicy::KeepOrphans,
        matched: MatchedSlotPolicy::OverwriteStructure,
    };

    /// Base default day block into one of its repeated occurrences.
    pub const REPEAT_INTO_DEFAULT: MergePolicy = MergePolicy {
        orphans: OrphanPolicy::KeepOrphans,
        matched: MatchedSlotPolicy::PreserveTarget,
    };
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeStats {
    pub matched_blocks: usize,
    pub cloned_blocks: usize,
    pub dropped_blocks: usize,
    pub kept_blocks: usize,
    pub matched_slots: usize,
    pub overwritten_slots: usize,
    pub dropped_slots: usize,
    pub kept_slots: usize,
    /// Slots whose position in their block moved.
    pub renumbered_slots: usize,
    /// Ids of freshly cloned slots, in output order.
    pub cloned_slot_ids: Vec<SlotId>,
}

impl MergeStats {
    /// Whether the merge changed anything in the target.
    pub fn changed(&self) -> bool {
        self.cloned_blocks > 0
            || self.dropped_blocks > 0
            || self.overwritten_slots > 0
            || self.dropped_slots > 0
            || self.renumbered_slots > 0
            || !self.cloned_slot_ids.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub blocks: Vec<Block>,
    pub stats: MergeStats,
}

/// Merge `source` into `target` under `policy`.
///
/// Fails with a validation error, before producing anything, when either
/// side carries a nil id or two entities of one side share an identity key.
pub fn merge_blocks(
    target: Vec<Block>,
    source: &[Block],
    policy: MergePolicy,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
) -> ScheduleResult<MergeOutcome> {
    validate_side(&target, "target", true)?;
    validate_side(source, "source", false)?;

    let mut stats = MergeStats::default();
    let mut remaining: Vec<Option<Block>> = target.into_iter().map(Some).collect();
    let index: HashMap<BlockId, usize> = remaining
        .iter()
        .enumerate()
        .filter_map(|(i, b)| b.as_ref().map(|b| (b.identity_key(), i)))
        .collect();

    let mut merged = Vec::with_capacity(source.len());
    for source_block in source {
        let matched = index
            .get(&source_block.block_id)
            .and_then(|i| remaining[*i].take());
        match matched {
            Some(target_block) => {
                stats.matched_blocks += 1;
                merged.push(merge_block(target_block, source_block, policy, ids, now, &mut stats));
            }
            None => {
                stats.cloned_blocks += 1;
                let clone = clone_block(source_block, ids, now);
                stats
                    .cloned_slot_ids
                    .extend(clone.slots.iter().map(|s| s.slot_id));
                merged.push(clone);
            }
        }
    }

    for orphan in remaining.into_iter().flatten() {
        match policy.orphans {
            OrphanPolicy::KeepOrphans => {
                stats.kept_blocks += 1;
                merged.push(orphan);
            }
            OrphanPolicy::DropOrphans => stats.dropped_blocks += 1,
        }
    }

    Ok(MergeOutcome {
        blocks: merged,
        stats,
    })
}

fn merge_block(
    mut target: Block,
    source: &Block,
    policy: MergePolicy,
    ids: &dyn IdGenerator,
    now: DateTime<Utc>,
    stats: &mut MergeStats,
) -> Block {
    let mut remaining: Vec<Option<Slot>> = std::mem::take(&mut target.slots)
        .into_iter()
        .map(Some)
        .collect();
    let index: HashMap<SlotId, usize> = remaining
        .iter()
        .enumerate()
        .filter_map(|(i, s)| s.as_ref().map(|s| (s.identity_key(), i)))
        .collect();

    let mut slots = Vec::with_capacity(source.slots.len());
    for source_slot in &source.slots {
        let matched = index
            .get(&source_slot.slot_id)
            .and_then(|i| remaining[*i].take());
        match matched {
            Some(mut target_slot) => {
                stats.matched_slots += 1;
                if policy.matched == MatchedSlotPolicy::OverwriteStructure
                    && overwrite_structure(&mut target_slot, source_slot, now)
                {
                    stats.overwritten_slots += 1;
                }
                slots.push(target_slot);
            }
            None => {
                let clone = clone_slot(source_slot, slots.len() as u32 + 1, ids, now);
                stats.cloned_slot_ids.push(clone.slot_id);
                slots.push(clone);
            }
        }
    }

    for orphan in remaining.into_iter().flatten() {
        match policy.orphans {
            OrphanPolicy::KeepOrphans => {
                stats.kept_slots += 1;
                slots.push(orphan);
            }
            OrphanPolicy::DropOrphans => stats.dropped_slots += 1,
        }
    }

    target.slots = slots;
    let before: Vec<u32> = target.slots.iter().map(|s| s.sessions).collect();
    target.renumber_sessions();
    stats.renumbered_slots += target
        .slots
        .iter()
        .zip(before)
        .filter(|(s, old)| s.sessions != *old)
        .count();
    target
}

/// Copy the source's structural fields onto `target`; true when anything changed.
fn overwrite_structure(target: &mut Slot, source: &Slot, now: DateTime<Utc>) -> bool {
    let changed = target.title != source.title
        || target.start_time != source.start_time
        || target.end_time != source.end_time
        || target.duration_minutes != source.duration_minutes
        || target.color != source.color;
    if changed {
        target.title = source.title.clone();
        target.set_range(source.range());
        target.color = source.color.clone();
        target.updated_at = now;
    }
    changed
}

/// Clone a source block with fresh ids, pointing back at the source.
pub fn clone_block(source: &Block, ids: &dyn IdGenerator, now: DateTime<Utc>) -> Block {
    Block {
        block_id: ids.block_id(),
        prior_block_id: Some(source.block_id),
        slots: source
            .slots
            .iter()
            .enumerate()
            .map(|(i, s)| clone_slot(s, i as u32 + 1, ids, now))
            .collect(),
    }
}

/// Clone a source slot with a fresh id at 1-based `position`.
///
/// Owner-scoped fields (tracking, usage rank, product) are not carried over.
pub fn clone_slot(source: &Slot, position: u32, ids: &dyn IdGenerator, now: DateTime<Utc>) -> Slot {
    Slot {
        slot_id: ids.slot_id(),
        prior_slot_id: Some(source.slot_id),
        sessions: position,
        tracking: None,
        use_count: 0,
        product_id: None,
        created_at: now,
        updated_at: now,
        ..source.clone()
    }
}

fn validate_side(blocks: &[Block], side: &str, by_identity_key: bool) -> ScheduleResult<()> {
    let mut block_keys = HashSet::new();
    for block in blocks {
        if block.block_id.is_nil() || block.prior_block_id.is_some_and(|id| id.is_nil()) {
            return Err(ScheduleError::validation(format!(
                "{} block has a malformed id",
                side
            )));
        }
        let key = if by_identity_key {
            block.identity_key()
        } else {
            block.block_id
        };
        if !block_keys.insert(key) {
            return Err(ScheduleError::validation(format!(
                "{} blocks share identity {}",
                side, key
            )));
        }

        let mut slot_keys = HashSet::new();
        for slot in &block.slots {
            if slot.slot_id.is_nil() || slot.prior_slot_id.is_some_and(|id| id.is_nil()) {
                return Err(ScheduleError::validation(format!(
                    "{} slot in block {} has a malformed id",
                    side, block.block_id
                )));
            }
            let key = if by_identity_key {
                slot.identity_key()
            } else {
                slot.slot_id
            };
            if !slot_keys.insert(key) {
                return Err(ScheduleError::validation(format!(
                    "{} slots in block {} share identity {}",
                    side, block.block_id, key
                )));
            }
        }
    }
    Ok(())
}
