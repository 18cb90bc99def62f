//! Tests for db::factory and db::repo_config - repository selection and configuration.

mod support;

use std::str::FromStr;

use colortime::db::factory::{RepositoryBuilder, RepositoryFactory, RepositoryType};
use colortime::db::repo_config::{FileSettings, RepositoryConfig, DATA_DIR_ENV};
use colortime::db::{DefaultDayRepository, WeekRepository};

#[test]
fn test_repository_type_from_str_aliases() {
    assert_eq!(RepositoryType::from_str("LOCAL").unwrap(), RepositoryType::Local);
    assert_eq!(RepositoryType::from_str("memory").unwrap(), RepositoryType::Local);
    assert_eq!(RepositoryType::from_str("file").unwrap(), RepositoryType::File);
    assert_eq!(RepositoryType::from_str(" JSON ").unwrap(), RepositoryType::File);
}

#[test]
fn test_repository_type_from_str_invalid() {
    let result = RepositoryType::from_str("postgres");
    assert!(result.is_err());
    assert!(result.unwrap_err().contains("Unknown repository type"));
}

#[test]
fn test_repository_type_from_env_default() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", None), (DATA_DIR_ENV, None)], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[test]
fn test_repository_type_from_env_with_data_dir() {
    support::with_scoped_env(
        &[("REPOSITORY_TYPE", None), (DATA_DIR_ENV, Some("/tmp/colortime"))],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::File);
        },
    );
}

#[test]
fn test_repository_type_env_overrides_data_dir() {
    support::with_scoped_env(
        &[
            ("REPOSITORY_TYPE", Some("local")),
            (DATA_DIR_ENV, Some("/tmp/colortime")),
        ],
        || {
            assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
        },
    );
}

#[test]
fn test_repository_type_from_env_invalid_falls_back_to_local() {
    support::with_scoped_env(&[("REPOSITORY_TYPE", Some("cassandra"))], || {
        assert_eq!(RepositoryType::from_env(), RepositoryType::Local);
    });
}

#[test]
fn test_file_settings_from_env() {
    support::with_scoped_env(&[(DATA_DIR_ENV, Some("  /srv/colortime  "))], || {
        assert_eq!(
            FileSettings::from_env().data_dir,
            std::path::PathBuf::from("/srv/colortime")
        );
    });
    support::with_scoped_env(&[(DATA_DIR_ENV, None)], || {
        assert_eq!(FileSettings::from_env(), FileSettings::default());
    });
}

#[test]
fn test_config_file_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("repository.toml");
    std::fs::write(
        &path,
        r#"
[repository]
type = "file"

[file]
data_dir = "/var/lib/colortime"
"#,
    )
    .unwrap();

    let config = RepositoryConfig::from_file(&path).unwrap();
    assert_eq!(config.repository_type().unwrap(), RepositoryType::File);
    assert_eq!(
        config.file.data_dir,
        std::path::PathBuf::from("/var/lib/colortime")
    );
}

#[test]
fn test_config_file_errors() {
    let tmp = tempfile::tempdir().unwrap();
    let missing = RepositoryConfig::from_file(tmp.path().join("nope.toml")).unwrap_err();
    assert!(missing.to_string().contains("Failed to read config file"));

    let path = tmp.path().join("bad.toml");
    std::fs::write(&path, "[repository]\ntype = \"mongo\"\n").unwrap();
    let config = RepositoryConfig::from_file(&path).unwrap();
    assert!(config.repository_type().is_err());
}

#[tokio::test]
async fn test_factory_creates_local() {
    let repo = RepositoryFactory::create(RepositoryType::Local, None)
        .await
        .unwrap();
    assert!(repo.health_check().await.unwrap());
}

#[cfg(feature = "file-repo")]
#[tokio::test]
async fn test_factory_from_config_file_creates_file_repository() {
    let tmp = tempfile::tempdir().unwrap();
    let data_dir = tmp.path().join("data");
    let path = tmp.path().join("repository.toml");
    std::fs::write(
        &path,
        format!(
            "[repository]\ntype = \"file\"\n\n[file]\ndata_dir = \"{}\"\n",
            data_dir.display().to_string().replace('\\', "\\\\")
        ),
    )
    .unwrap();

    let repo = RepositoryFactory::from_config_file(&path).await.unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(repo.list_default_days("org").await.unwrap().is_empty());
    assert!(data_dir.is_dir());
}

#[cfg(feature = "file-repo")]
#[tokio::test]
async fn test_builder_from_env_uses_data_dir() {
    let tmp = tempfile::tempdir().unwrap();
    let dir = tmp.path().join("env-data");
    let dir_str = dir.display().to_string();

    let builder = support::with_scoped_env(
        &[("REPOSITORY_TYPE", Some("file")), (DATA_DIR_ENV, Some(dir_str.as_str()))],
        || RepositoryBuilder::new().from_env(),
    );
    let repo = builder.build().await.unwrap();
    assert!(repo.health_check().await.unwrap());
    assert!(dir.is_dir());
}

#[tokio::test]
async fn test_builder_explicit_local() {
    let repo = RepositoryBuilder::new()
        .repository_type(RepositoryType::Local)
        .build()
        .await
        .unwrap();
    assert!(repo.list_default_days("org").await.unwrap().is_empty());
}
