//! The reconciliation engine.
//!
//! Pure functions over schedule documents; nothing here performs I/O.
//!
//! # Components
//!
//! - [`recurrence`]: expands a base date and a repeat rule into occurrence dates
//! - [`conflicts`]: gates new or re-timed slots against a day's existing slots
//! - [`merge`]: identity-preserving merge of a source layer into a target layer
//! - [`tracking`]: recomputes usage ranks for a tracking label

pub mod conflicts;
pub mod merge;
pub mod recurrence;
pub mod tracking;

pub use conflicts::{conflicts, ensure_no_conflict, find_conflict};
pub use merge::{merge_blocks, MatchedSlotPolicy, MergeOutcome, MergePolicy, MergeStats, OrphanPolicy};
pub use recurrence::{expand, Occurrences};
pub use tracking::{normalize_tracking, NormalizeOutcome};
