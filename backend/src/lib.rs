//! # Colortime Backend
//!
//! Scheduling engine for organization "color time" slots: small calendar
//! blocks with a title, color, time range and a tracking label.
//!
//! Three layers of schedule data interact here: an organization-wide
//! **default** pattern (one document per date), reusable **templates** keyed
//! by weekday and term, and materialized per-user **weeks** that users edit.
//! The engine reconciles those layers while keeping slot identities stable.
//!
//! ## Architecture
//!
//! - [`models`]: Domain types (slots, blocks, days, weeks, templates, repeat rules)
//! - [`algorithms`]: Pure reconciliation logic (recurrence, conflicts, merge, tracking)
//! - [`db`]: Repository traits, local/file implementations, factory and config
//! - [`services`]: Orchestration of the algorithms over a repository
//! - [`http`]: Axum-based HTTP server and request handlers
//!
//! ## Data flow
//!
//! ```text
//! Template ──apply_template──▶ DefaultDay ──get_or_create_week──▶ Week
//!                               ▲
//!              create_default_slot (+ repeat rule)
//! ```

// Allow large error types - RepositoryError contains rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod db;
pub mod error;
pub mod models;
pub mod runtime;
pub mod services;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{ScheduleError, ScheduleResult};
