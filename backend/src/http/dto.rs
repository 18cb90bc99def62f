//! Data Transfer Objects for the HTTP API.
//!
//! Query parameters carry dates as raw strings so malformed values come back
//! as the engine's validation errors rather than axum's rejection text.
//! Bodies that author documents omit the author; it comes from the
//! `x-user-id` header.

use serde::{Deserialize, Serialize};

use crate::models::{BlockId, RepeatRule, TemplateKey};
use crate::services::{CreateDefaultSlotRequest, CreateTemplateSlotRequest, NewSlot};

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: String,
}

/// GET /v1/weeks
#[derive(Debug, Clone, Deserialize)]
pub struct WeekQuery {
    pub organization_id: String,
    #[serde(default = "default_owner_role")]
    pub owner_role: String,
    pub start: String,
    pub end: String,
}

fn default_owner_role() -> String {
    "teacher".to_string()
}

/// GET /v1/default-days
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultDayQuery {
    pub organization_id: String,
    /// Single date; absent lists every default day of the organization.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub language_id: Option<u32>,
}

/// GET /v1/default-days/range
#[derive(Debug, Clone, Deserialize)]
pub struct DefaultDayRangeQuery {
    pub organization_id: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub language_id: Option<u32>,
}

/// GET /v1/templates
#[derive(Debug, Clone, Deserialize)]
pub struct TemplateQuery {
    pub organization_id: String,
    pub term_id: String,
    /// Weekday name, `YYYY-MM-DD`, or `week` for all weekday templates.
    #[serde(default = "default_selector")]
    pub selector: String,
}

fn default_selector() -> String {
    "week".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct TopicBody {
    pub topic_id: String,
}

/// POST /v1/default-days/slots
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDefaultSlotBody {
    pub organization_id: String,
    pub date: String,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    pub slot: NewSlot,
    #[serde(default)]
    pub repeat: RepeatRule,
    #[serde(default)]
    pub topic_id: Option<String>,
}

impl CreateDefaultSlotBody {
    pub fn into_request(self, actor: String) -> crate::ScheduleResult<CreateDefaultSlotRequest> {
        Ok(CreateDefaultSlotRequest {
            organization_id: self.organization_id,
            date: crate::models::parse_date(&self.date, "date")?,
            block_id: self.block_id,
            slot: self.slot,
            repeat: self.repeat,
            topic_id: self.topic_id,
            created_by: actor,
        })
    }
}

/// POST /v1/templates/slots
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateSlotBody {
    pub organization_id: String,
    pub term_id: String,
    pub key: TemplateKey,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    pub slot: NewSlot,
}

impl CreateTemplateSlotBody {
    pub fn into_request(self, actor: String) -> CreateTemplateSlotRequest {
        CreateTemplateSlotRequest {
            organization_id: self.organization_id,
            term_id: self.term_id,
            key: self.key,
            block_id: self.block_id,
            slot: self.slot,
            created_by: actor,
        }
    }
}

/// POST /v1/templates/duplicate
#[derive(Debug, Clone, Deserialize)]
pub struct DuplicateTemplateBody {
    pub organization_id: String,
    pub term_id: String,
    pub origin: TemplateKey,
    /// Absent duplicates onto every weekday after `origin`.
    #[serde(default)]
    pub target: Option<TemplateKey>,
}

/// POST /v1/templates/apply
#[derive(Debug, Clone, Deserialize)]
pub struct ApplyTemplateBody {
    pub organization_id: String,
    pub term_id: String,
    pub start: String,
    pub end: String,
}

/// Count-only response for bulk maintenance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeResponse {
    pub tracking: String,
    pub weeks_updated: usize,
}

/// POST /v1/weeks/normalize
#[derive(Debug, Clone, Deserialize)]
pub struct NormalizeBody {
    pub organization_id: String,
    #[serde(default = "default_owner_role")]
    pub owner_role: String,
    pub tracking: crate::models::Tracking,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_slot_body_defaults_and_conversion() {
        let body: CreateDefaultSlotBody = serde_json::from_value(serde_json::json!({
            "organization_id": "org-1",
            "date": "2025-03-10",
            "slot": {
                "title": "Reading",
                "start_time": "09:00:00",
                "duration_minutes": 30,
                "color": "#ff0000"
            }
        }))
        .unwrap();
        assert!(body.block_id.is_none());
        assert!(!body.repeat.repeats());

        let request = body.into_request("teacher-7".into()).unwrap();
        assert_eq!(request.created_by, "teacher-7");
        assert_eq!(request.date.to_string(), "2025-03-10");
    }

    #[test]
    fn test_default_slot_body_rejects_bad_date() {
        let body: CreateDefaultSlotBody = serde_json::from_value(serde_json::json!({
            "organization_id": "org-1",
            "date": "10/03/2025",
            "slot": {
                "title": "Reading",
                "start_time": "09:00:00",
                "duration_minutes": 30,
                "color": "#ff0000"
            }
        }))
        .unwrap();
        assert!(body.into_request("t".into()).is_err());
    }

    #[test]
    fn test_template_query_selects_week_by_default() {
        let query: TemplateQuery = serde_json::from_value(serde_json::json!({
            "organization_id": "org-1",
            "term_id": "term-1"
        }))
        .unwrap();
        assert_eq!(query.selector, "week");
    }
}
