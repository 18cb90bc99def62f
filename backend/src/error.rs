//! Typed failures of the scheduling engine and its orchestration.

use crate::db::repository::RepositoryError;
use crate::models::{SlotId, TimeRange};

/// Result type for engine and service operations.
pub type ScheduleResult<T> = Result<T, ScheduleError>;

/// Error type for engine and service operations.
///
/// Every variant is raised before the write of the document being changed,
/// except `Persistence`, which reports a failed write itself.
#[derive(Debug, thiserror::Error)]
pub enum ScheduleError {
    /// Malformed id, missing required field, unparsable date/time or a
    /// non-positive duration.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Referenced week, day, template, slot or block is absent.
    #[error("Not found: {0}")]
    NotFound(String),

    /// A new or re-timed slot overlaps (or touches) an existing slot.
    #[error("Time slot {candidate} conflicts with existing slot {existing_slot_id} ({existing})")]
    Conflict {
        candidate: TimeRange,
        existing: TimeRange,
        existing_slot_id: SlotId,
    },

    /// Repository failure, surfaced as-is.
    #[error("Persistence error: {0}")]
    Persistence(#[from] RepositoryError),
}

impl ScheduleError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Stable machine-readable code for the error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict { .. } => "CONFLICT",
            Self::Persistence(_) => "REPOSITORY_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use uuid::Uuid;

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_conflict_message_names_both_ranges() {
        let err = ScheduleError::Conflict {
            candidate: TimeRange::new(hm(9, 15), hm(9, 45)).unwrap(),
            existing: TimeRange::new(hm(9, 0), hm(9, 30)).unwrap(),
            existing_slot_id: SlotId::new(Uuid::from_u128(7)),
        };
        let msg = err.to_string();
        assert!(msg.contains("09:15-09:45"));
        assert!(msg.contains("09:00-09:30"));
        assert_eq!(err.code(), "CONFLICT");
    }

    #[test]
    fn test_repository_error_converts_to_persistence() {
        let err: ScheduleError = RepositoryError::storage("disk full").into();
        assert!(matches!(err, ScheduleError::Persistence(_)));
        assert_eq!(err.code(), "REPOSITORY_ERROR");
    }
}
