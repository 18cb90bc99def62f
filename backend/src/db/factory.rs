//! Repository factory for dependency injection.
//!
//! Picks and constructs a repository backend from runtime configuration.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use super::repo_config::{FileSettings, RepositoryConfig};
use super::repositories::LocalRepository;
use super::repository::{FullRepository, RepositoryError, RepositoryResult};

/// Repository type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepositoryType {
    /// In-memory local repository
    Local,
    /// JSON snapshot on disk
    File,
}

impl FromStr for RepositoryType {
    type Err = String;

    /// Parse repository type from string ("local", "memory", "file", "json").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "memory" => Ok(Self::Local),
            "file" | "json" => Ok(Self::File),
            _ => Err(format!("Unknown repository type: {}", s)),
        }
    }
}

impl RepositoryType {
    /// Get repository type from environment variable.
    ///
    /// Reads `REPOSITORY_TYPE`. Falls back to File when `COLORTIME_DATA_DIR`
    /// is set, otherwise Local.
    pub fn from_env() -> Self {
        if let Ok(val) = std::env::var("REPOSITORY_TYPE") {
            return val.parse().unwrap_or(Self::Local);
        }

        if std::env::var(super::repo_config::DATA_DIR_ENV).is_ok() {
            Self::File
        } else {
            Self::Local
        }
    }
}

/// Repository factory for creating repository instances.
///
/// # Example
/// ```ignore
/// use colortime::db::{RepositoryFactory, RepositoryType};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let local = RepositoryFactory::create_local();
///     let on_disk = RepositoryFactory::create(RepositoryType::File, Some("./data".as_ref())).await?;
///     Ok(())
/// }
/// ```
pub struct RepositoryFactory;

impl RepositoryFactory {
    /// Create a repository instance based on type.
    ///
    /// `data_dir` is only used by the file backend; `None` falls back to
    /// `COLORTIME_DATA_DIR` or `./data`.
    pub async fn create(
        repo_type: RepositoryType,
        data_dir: Option<&Path>,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        match repo_type {
            RepositoryType::Local => Ok(Self::create_local()),
            RepositoryType::File => {
                let dir = data_dir
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| FileSettings::from_env().data_dir);
                Self::create_file(&dir).await
            }
        }
    }

    /// Create an in-memory local repository.
    pub fn create_local() -> Arc<dyn FullRepository> {
        Arc::new(LocalRepository::new())
    }

    /// Create a file-backed repository under `data_dir`.
    #[cfg(feature = "file-repo")]
    pub async fn create_file(data_dir: &Path) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo = super::repositories::FileRepository::open(data_dir).await?;
        Ok(Arc::new(repo))
    }

    #[cfg(not(feature = "file-repo"))]
    pub async fn create_file(data_dir: &Path) -> RepositoryResult<Arc<dyn FullRepository>> {
        let _ = data_dir;
        Err(RepositoryError::configuration(
            "File repository feature not enabled",
        ))
    }

    /// Create repository from environment configuration.
    pub async fn from_env() -> RepositoryResult<Arc<dyn FullRepository>> {
        Self::create(RepositoryType::from_env(), None).await
    }

    /// Create repository from a TOML configuration file.
    pub async fn from_config_file<P: AsRef<Path>>(
        config_path: P,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_file(config_path)?;
        Self::from_repository_config(&config).await
    }

    /// Create repository from the default configuration file location.
    pub async fn from_default_config() -> RepositoryResult<Arc<dyn FullRepository>> {
        let config = RepositoryConfig::from_default_location()?;
        Self::from_repository_config(&config).await
    }

    async fn from_repository_config(
        config: &RepositoryConfig,
    ) -> RepositoryResult<Arc<dyn FullRepository>> {
        let repo_type = config.repository_type()?;
        Self::create(repo_type, Some(&config.file.data_dir)).await
    }
}

/// Builder for configuring repository creation.
///
/// # Example
/// ```ignore
/// use colortime::db::{RepositoryBuilder, RepositoryType};
///
/// let repo = RepositoryBuilder::new()
///     .repository_type(RepositoryType::File)
///     .data_dir("/var/lib/colortime")
///     .build()
///     .await?;
/// ```
pub struct RepositoryBuilder {
    repo_type: RepositoryType,
    data_dir: Option<PathBuf>,
}

impl RepositoryBuilder {
    /// Create a new repository builder; the type defaults from the environment.
    pub fn new() -> Self {
        Self {
            repo_type: RepositoryType::from_env(),
            data_dir: None,
        }
    }

    pub fn repository_type(mut self, repo_type: RepositoryType) -> Self {
        self.repo_type = repo_type;
        self
    }

    pub fn data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = Some(data_dir.into());
        self
    }

    /// Load configuration from environment variables.
    pub fn from_env(mut self) -> Self {
        self.repo_type = RepositoryType::from_env();
        if self.repo_type == RepositoryType::File {
            self.data_dir = Some(FileSettings::from_env().data_dir);
        }
        self
    }

    /// Load configuration from a TOML file.
    pub fn from_config_file<P: AsRef<Path>>(
        mut self,
        config_path: P,
    ) -> Result<Self, RepositoryError> {
        let config = RepositoryConfig::from_file(config_path)?;
        self.repo_type = config.repository_type()?;
        self.data_dir = Some(config.file.data_dir);
        Ok(self)
    }

    /// Load configuration from the default `repository.toml` location.
    pub fn from_default_config(mut self) -> Result<Self, RepositoryError> {
        let config = RepositoryConfig::from_default_location()?;
        self.repo_type = config.repository_type()?;
        self.data_dir = Some(config.file.data_dir);
        Ok(self)
    }

    /// Build the repository instance.
    pub async fn build(self) -> RepositoryResult<Arc<dyn FullRepository>> {
        RepositoryFactory::create(self.repo_type, self.data_dir.as_deref()).await
    }
}

impl Default for RepositoryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_type_from_str() {
        assert_eq!(
            RepositoryType::from_str("local").unwrap(),
            RepositoryType::Local
        );
        assert_eq!(
            RepositoryType::from_str("File").unwrap(),
            RepositoryType::File
        );
        assert_eq!(
            RepositoryType::from_str("json").unwrap(),
            RepositoryType::File
        );
        assert!(RepositoryType::from_str("postgres").is_err());
    }

    #[tokio::test]
    async fn test_create_local_repository() {
        let repo = RepositoryFactory::create_local();
        assert!(repo.health_check().await.unwrap());
    }

    #[tokio::test]
    async fn test_builder_local_repository() {
        let repo = RepositoryBuilder::new()
            .repository_type(RepositoryType::Local)
            .build()
            .await
            .unwrap();

        assert!(repo.health_check().await.unwrap());
    }
}
