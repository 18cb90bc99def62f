//! Persistence for schedule documents.
//!
//! The engine never talks to storage directly; services go through the
//! repository traits defined here, so backends can be swapped freely.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  HTTP handlers / binaries                               │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  services::ColorTimeService - orchestration             │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//! ┌───────────────────▼─────────────────────────────────────┐
//! │  repository traits - week / default day / template      │
//! └───────────────────┬─────────────────────────────────────┘
//!                     │
//!     ┌───────────────┴──────────────┐
//!     │ LocalRepository  (in-memory) │
//!     │ FileRepository   (JSON file) │
//!     └──────────────────────────────┘
//! ```

pub mod factory;
pub mod repo_config;
pub mod repositories;
pub mod repository;

pub use factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
pub use repo_config::{FileSettings, RepositoryConfig};
#[cfg(feature = "file-repo")]
pub use repositories::FileRepository;
pub use repositories::LocalRepository;
pub use repository::{
    DefaultDayRepository, ErrorContext, FullRepository, RepositoryError, RepositoryResult,
    TemplateRepository, WeekRepository,
};

use anyhow::{Context, Result};
use std::sync::{Arc, OnceLock};
use tokio::runtime::Runtime;

/// Global repository instance initialized once per process.
static REPOSITORY: OnceLock<Arc<dyn FullRepository>> = OnceLock::new();

/// Pick the backend: `repository.toml` if present, else the environment.
async fn create_selected_repository() -> RepositoryResult<Arc<dyn FullRepository>> {
    match RepositoryConfig::from_default_location() {
        Ok(config) => {
            let repo_type = config.repository_type()?;
            RepositoryFactory::create(repo_type, Some(&config.file.data_dir)).await
        }
        Err(_) => RepositoryFactory::from_env().await,
    }
}

/// Initialize the global repository singleton.
///
/// Must not be called from inside a tokio runtime; async callers should use
/// [`init_repository_async`].
pub fn init_repository() -> Result<()> {
    if REPOSITORY.get().is_some() {
        return Ok(());
    }

    let runtime = Runtime::new().context("Failed to create async runtime for repository init")?;
    let repo = runtime
        .block_on(create_selected_repository())
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    Ok(())
}

/// Initialize the global repository singleton from an async context.
pub async fn init_repository_async() -> Result<&'static Arc<dyn FullRepository>> {
    if let Some(repo) = REPOSITORY.get() {
        return Ok(repo);
    }

    let repo = create_selected_repository()
        .await
        .map_err(|e| anyhow::Error::msg(e.to_string()))?;
    let _ = REPOSITORY.set(repo);
    REPOSITORY
        .get()
        .context("Repository not initialized after init_repository_async()")
}

/// Get a reference to the global repository instance.
pub fn get_repository() -> Result<&'static Arc<dyn FullRepository>> {
    if REPOSITORY.get().is_none() {
        init_repository()?;
    }

    REPOSITORY
        .get()
        .context("Repository not initialized. Call init_repository() first.")
}
