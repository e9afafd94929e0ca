use clap::Parser;
use dupscan::cli::Cli;
use dupscan::config::{Config, ConfigError};
use dupscan::report::ReportFormat;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

/// Clear all DUPSCAN_* environment variables to avoid interference.
fn clear_env() {
    for (key, _) in std::env::vars() {
        if key.starts_with("DUPSCAN_") {
            std::env::remove_var(key);
        }
    }
}

#[test]
fn test_config_load_from_toml() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        r#"
min_size = 4096
workers = 3
queue_capacity = 7
output_dir = "/tmp/reports"
format = "json"
skip_errors = true
"#,
    )
    .unwrap();

    let config = Config::load(Some(&path)).unwrap();

    assert_eq!(config.min_size, 4096);
    assert_eq!(config.workers, Some(3));
    assert_eq!(config.queue_capacity, 7);
    assert_eq!(config.output_dir, PathBuf::from("/tmp/reports"));
    assert_eq!(config.format, ReportFormat::Json);
    assert!(config.skip_errors);
    assert!(!config.follow_symlinks);
}

#[test]
fn test_config_partial_file_keeps_defaults() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 10\n").unwrap();

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.min_size, 10);
    assert_eq!(config.workers, None);
    assert_eq!(config.queue_capacity, Config::default().queue_capacity);
}

#[test]
fn test_config_missing_default_file_uses_defaults() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();

    let config = Config::load_from_path(&dir.path().join("absent.toml")).unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_missing_explicit_file_is_error() {
    let dir = tempdir().unwrap();
    let result = Config::load(Some(&dir.path().join("absent.toml")));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}

#[test]
fn test_config_invalid_toml_is_error() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = \"lots\"\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn test_config_zero_workers_rejected() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 0\n").unwrap();

    assert!(matches!(
        Config::load_from_path(&path),
        Err(ConfigError::Invalid { key: "workers", .. })
    ));
}

#[test]
fn test_env_overrides_file() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 10\nformat = \"text\"\n").unwrap();

    std::env::set_var("DUPSCAN_MIN_SIZE", "20");
    std::env::set_var("DUPSCAN_FORMAT", "json");
    let config = Config::load_from_path(&path);
    clear_env();

    let config = config.unwrap();
    assert_eq!(config.min_size, 20);
    assert_eq!(config.format, ReportFormat::Json);
}

#[test]
fn test_hierarchy_defaults_file_env_cli() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    clear_env();
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "min_size = 10\nworkers = 2\nqueue_capacity = 5\n").unwrap();

    std::env::set_var("DUPSCAN_WORKERS", "6");
    let config = Config::load_from_path(&path);
    clear_env();
    let mut config = config.unwrap();

    let cli = Cli::try_parse_from(["dupscan", "--workers", "9"]).unwrap();
    config.apply_cli(&cli);

    assert_eq!(config.min_size, 10);
    assert_eq!(config.queue_capacity, 5);
    assert_eq!(config.workers, Some(9));
}

#[test]
fn test_figment_layers_directly() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "follow_symlinks = true\n").unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("DUPSCAN_TEST_UNUSED_"))
        .extract()
        .unwrap();

    assert!(config.follow_symlinks);
    assert_eq!(config.min_size, 0);
}
