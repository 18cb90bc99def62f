//! HTTP handlers for the REST API.
//!
//! Each handler corresponds to an API endpoint and delegates to
//! [`crate::services::ColorTimeService`] for business logic.

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::NaiveDate;

use super::dto::{
    ApplyTemplateBody, CreateDefaultSlotBody, CreateTemplateSlotBody, DefaultDayQuery,
    DefaultDayRangeQuery, DuplicateTemplateBody, HealthResponse, NormalizeBody,
    NormalizeResponse, TemplateQuery, TopicBody, WeekQuery,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::{
    parse_date, parse_date_range, Block, BlockId, DayId, DefaultDay, Owner, SlotId, Template,
    TemplateId, Week, WeekId,
};
use crate::services::{
    ApplyReport, DuplicateReport, SlotPatch, TemplateSelector, TemplateSlotUpdate,
    UpdateWeekSlotRequest,
};

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Header naming the acting user.
pub const USER_HEADER: &str = "x-user-id";

fn actor(headers: &HeaderMap) -> Result<String, AppError> {
    headers
        .get(USER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| AppError::Unauthorized(format!("missing {} header", USER_HEADER)))
}

fn path_date(raw: &str) -> Result<NaiveDate, AppError> {
    Ok(parse_date(raw, "date")?)
}

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let db_status = match state.service.health_check().await {
        Ok(true) => "connected".to_string(),
        Ok(false) => "disconnected".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        database: db_status,
    }))
}

// =============================================================================
// Weeks
// =============================================================================

/// GET /v1/weeks
///
/// The caller's week covering `[start, end]`, created from the organization's
/// default days on first access.
pub async fn get_or_create_week(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<WeekQuery>,
) -> HandlerResult<Week> {
    let owner = Owner::new(actor(&headers)?, query.owner_role);
    let (start, end) = parse_date_range(&query.start, &query.end)?;
    let week = state
        .service
        .get_or_create_week(&query.organization_id, &owner, start, end)
        .await?;
    Ok(Json(week))
}

/// GET /v1/weeks/{week_id}
pub async fn get_week(
    State(state): State<AppState>,
    Path(week_id): Path<WeekId>,
) -> HandlerResult<Week> {
    Ok(Json(state.service.get_week(week_id).await?))
}

/// PUT /v1/weeks/{week_id}/slots/{slot_id}
pub async fn update_week_slot(
    State(state): State<AppState>,
    Path((week_id, slot_id)): Path<(WeekId, SlotId)>,
    Json(request): Json<UpdateWeekSlotRequest>,
) -> HandlerResult<Week> {
    Ok(Json(
        state
            .service
            .update_week_slot(week_id, slot_id, request)
            .await?,
    ))
}

/// POST /v1/weeks/normalize
///
/// Re-rank every use of a tracking label across the caller's weeks.
pub async fn normalize_tracking(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<NormalizeBody>,
) -> HandlerResult<NormalizeResponse> {
    let owner = Owner::new(actor(&headers)?, body.owner_role);
    let weeks_updated = state
        .service
        .normalize_tracking_usage(&body.organization_id, &owner, &body.tracking)
        .await?;
    Ok(Json(NormalizeResponse {
        tracking: body.tracking.to_string(),
        weeks_updated,
    }))
}

/// PUT /v1/weeks/{week_id}/topic
pub async fn set_week_topic(
    State(state): State<AppState>,
    Path(week_id): Path<WeekId>,
    Json(body): Json<TopicBody>,
) -> HandlerResult<Week> {
    Ok(Json(
        state.service.set_week_topic(week_id, &body.topic_id).await?,
    ))
}

/// DELETE /v1/weeks/{week_id}/topic
pub async fn clear_week_topic(
    State(state): State<AppState>,
    Path(week_id): Path<WeekId>,
) -> HandlerResult<Week> {
    Ok(Json(state.service.clear_week_topic(week_id).await?))
}

/// PUT /v1/weeks/{week_id}/days/{date}/topic
pub async fn set_day_topic(
    State(state): State<AppState>,
    Path((week_id, date)): Path<(WeekId, String)>,
    Json(body): Json<TopicBody>,
) -> HandlerResult<Week> {
    let date = path_date(&date)?;
    Ok(Json(
        state
            .service
            .set_day_topic(week_id, date, &body.topic_id)
            .await?,
    ))
}

/// DELETE /v1/weeks/{week_id}/days/{date}/topic
pub async fn clear_day_topic(
    State(state): State<AppState>,
    Path((week_id, date)): Path<(WeekId, String)>,
) -> HandlerResult<Week> {
    let date = path_date(&date)?;
    Ok(Json(state.service.clear_day_topic(week_id, date).await?))
}

// =============================================================================
// Default days
// =============================================================================

/// POST /v1/default-days/slots
pub async fn create_default_slot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateDefaultSlotBody>,
) -> Result<(StatusCode, Json<DefaultDay>), AppError> {
    let request = body.into_request(actor(&headers)?)?;
    let day = state.service.create_default_slot(request).await?;
    Ok((StatusCode::CREATED, Json(day)))
}

/// GET /v1/default-days
///
/// One day when `date` is given, otherwise every default day of the
/// organization.
pub async fn get_default_days(
    State(state): State<AppState>,
    Query(query): Query<DefaultDayQuery>,
) -> HandlerResult<Vec<DefaultDay>> {
    let days = match &query.date {
        Some(raw) => {
            let date = parse_date(raw, "date")?;
            vec![
                state
                    .service
                    .get_default_day(&query.organization_id, date, query.language_id)
                    .await?,
            ]
        }
        None => {
            let mut days = state.service.list_default_days(&query.organization_id).await?;
            if let Some(language_id) = query.language_id {
                days.iter_mut().for_each(|d| d.retain_language(language_id));
            }
            days
        }
    };
    Ok(Json(days))
}

/// GET /v1/default-days/range
pub async fn list_default_days_in_range(
    State(state): State<AppState>,
    Query(query): Query<DefaultDayRangeQuery>,
) -> HandlerResult<Vec<DefaultDay>> {
    let (start, end) = parse_date_range(&query.start, &query.end)?;
    Ok(Json(
        state
            .service
            .list_default_days_in_range(&query.organization_id, start, end, query.language_id)
            .await?,
    ))
}

/// DELETE /v1/default-days/{day_id}
pub async fn delete_default_day(
    State(state): State<AppState>,
    Path(day_id): Path<DayId>,
) -> Result<StatusCode, AppError> {
    state.service.delete_default_day(day_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /v1/default-days/{day_id}/slots/{slot_id}/block
pub async fn find_block_by_slot(
    State(state): State<AppState>,
    Path((day_id, slot_id)): Path<(DayId, SlotId)>,
) -> HandlerResult<Block> {
    Ok(Json(state.service.find_block_by_slot(day_id, slot_id).await?))
}

/// PATCH /v1/default-days/{day_id}/slots/{slot_id}
pub async fn update_default_slot(
    State(state): State<AppState>,
    Path((day_id, slot_id)): Path<(DayId, SlotId)>,
    Json(patch): Json<SlotPatch>,
) -> HandlerResult<DefaultDay> {
    Ok(Json(
        state
            .service
            .update_default_slot(day_id, slot_id, patch)
            .await?,
    ))
}

/// DELETE /v1/default-days/{day_id}/slots/{slot_id}
pub async fn delete_default_slot(
    State(state): State<AppState>,
    Path((day_id, slot_id)): Path<(DayId, SlotId)>,
) -> HandlerResult<DefaultDay> {
    Ok(Json(
        state.service.delete_default_slot(day_id, slot_id).await?,
    ))
}

/// DELETE /v1/default-days/{day_id}/blocks/{block_id}
pub async fn delete_default_block(
    State(state): State<AppState>,
    Path((day_id, block_id)): Path<(DayId, BlockId)>,
) -> HandlerResult<DefaultDay> {
    Ok(Json(
        state.service.delete_default_block(day_id, block_id).await?,
    ))
}

// =============================================================================
// Templates
// =============================================================================

/// POST /v1/templates/slots
pub async fn create_template_slot(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<CreateTemplateSlotBody>,
) -> Result<(StatusCode, Json<Template>), AppError> {
    let request = body.into_request(actor(&headers)?);
    let template = state.service.create_template_slot(request).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /v1/templates
pub async fn get_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
) -> HandlerResult<Vec<Template>> {
    let selector: TemplateSelector = query.selector.parse()?;
    Ok(Json(
        state
            .service
            .get_templates(&query.organization_id, &query.term_id, selector)
            .await?,
    ))
}

/// PATCH /v1/templates/{template_id}/slots/{slot_id}
pub async fn update_template_slot(
    State(state): State<AppState>,
    Path((template_id, slot_id)): Path<(TemplateId, SlotId)>,
    Json(update): Json<TemplateSlotUpdate>,
) -> HandlerResult<Template> {
    Ok(Json(
        state
            .service
            .update_template_slot(template_id, slot_id, update)
            .await?,
    ))
}

/// POST /v1/templates/duplicate
pub async fn duplicate_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<DuplicateTemplateBody>,
) -> HandlerResult<DuplicateReport> {
    let actor = actor(&headers)?;
    Ok(Json(
        state
            .service
            .duplicate_template(
                &body.organization_id,
                &body.term_id,
                body.origin,
                body.target,
                &actor,
            )
            .await?,
    ))
}

/// POST /v1/templates/apply
///
/// Per-date failures are reported in the body; the request itself succeeds.
pub async fn apply_template(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<ApplyTemplateBody>,
) -> HandlerResult<ApplyReport> {
    let actor = actor(&headers)?;
    let (start, end) = parse_date_range(&body.start, &body.end)?;
    Ok(Json(
        state
            .service
            .apply_template(&body.organization_id, &body.term_id, start, end, &actor)
            .await?,
    ))
}
