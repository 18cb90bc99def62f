//! Repository trait definitions for schedule documents.
//!
//! Persistence is split per document kind so implementations stay focused:
//!
//! - [`error`]: Error types for repository operations
//! - [`week`]: per-owner materialized weeks
//! - [`default_day`]: organization default days
//! - [`template`]: weekday/date templates
//!
//! All operations are atomic at the single-document level. Lookups return
//! `Ok(None)` for absent documents; deciding whether absence is an error is
//! left to the caller.
//!
//! ```ignore
//! async fn reconcile<R: FullRepository + ?Sized>(repo: &R) -> RepositoryResult<()> {
//!     let day = repo.find_default_day("org-1", date).await?;
//!     let week = repo.find_week("org-1", &owner, start, end).await?;
//!     Ok(())
//! }
//! ```

pub mod default_day;
pub mod error;
pub mod template;
pub mod week;

pub use default_day::DefaultDayRepository;
pub use error::{ErrorContext, RepositoryError, RepositoryResult};
pub use template::TemplateRepository;
pub use week::WeekRepository;

/// Composite trait bound for a complete repository implementation.
pub trait FullRepository: WeekRepository + DefaultDayRepository + TemplateRepository {}

// Any type implementing all three traits is a FullRepository.
impl<T> FullRepository for T where T: WeekRepository + DefaultDayRepository + TemplateRepository {}
