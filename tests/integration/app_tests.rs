use clap::Parser;
use dupscan::cli::Cli;
use dupscan::error::ExitCode;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

/// Build a CLI invocation that ignores any user config file.
fn cli(config: &Path, extra: &[&str]) -> Cli {
    let mut args = vec![
        "dupscan".to_string(),
        "--config".to_string(),
        config.display().to_string(),
        "--no-progress".to_string(),
        "-q".to_string(),
    ];
    args.extend(extra.iter().map(ToString::to_string));
    Cli::try_parse_from(args).unwrap()
}

fn reports_in(dir: &Path) -> Vec<PathBuf> {
    let mut reports: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("duplicates-"))
        })
        .collect();
    reports.sort();
    reports
}

#[test]
fn test_run_app_writes_report() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let out = dir.path().join("out");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"X").unwrap();
    fs::write(data.join("b.txt"), b"X").unwrap();
    fs::write(data.join("c.txt"), b"Y").unwrap();
    fs::write(data.join("d.txt"), b"XX").unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let code = dupscan::run_app(cli(
        &config,
        &[
            "--dir",
            &data.display().to_string(),
            "--output-dir",
            &out.display().to_string(),
            "--minsize",
            "0",
            "--workers",
            "3",
        ],
    ))
    .unwrap();

    assert_eq!(code, ExitCode::Success);
    let reports = reports_in(&out);
    assert_eq!(reports.len(), 1);
    let content = fs::read_to_string(&reports[0]).unwrap();
    assert_eq!(
        content,
        format!(
            "{},{}\n",
            data.join("a.txt").display(),
            data.join("b.txt").display()
        )
    );
}

#[test]
fn test_run_app_config_file_sets_format() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("one"), b"same").unwrap();
    fs::write(data.join("two"), b"same").unwrap();
    let out = dir.path().join("out");
    let config = dir.path().join("config.toml");
    fs::write(
        &config,
        format!("format = \"json\"\noutput_dir = {:?}\n", out.display().to_string()),
    )
    .unwrap();

    let code = dupscan::run_app(cli(&config, &["--dir", &data.display().to_string()])).unwrap();

    assert_eq!(code, ExitCode::Success);
    let reports = reports_in(&out);
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].extension().unwrap(), "json");
}

#[test]
fn test_run_app_missing_dir_is_general_error() {
    let _lock = crate::ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let out = dir.path().join("out");
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();

    let err = dupscan::run_app(cli(
        &config,
        &[
            "--dir",
            &dir.path().join("missing").display().to_string(),
            "--output-dir",
            &out.display().to_string(),
        ],
    ))
    .unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!out.exists());
}

#[test]
fn test_run_app_missing_config_is_error() {
    let dir = tempdir().unwrap();
    let err = dupscan::run_app(cli(&dir.path().join("absent.toml"), &[])).unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
}

#[cfg(unix)]
#[test]
fn test_run_app_skip_errors_is_partial_success() {
    use std::os::unix::fs::PermissionsExt;

    let _lock = crate::ENV_MUTEX.lock().unwrap();
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    let out = dir.path().join("out");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a"), b"dup").unwrap();
    fs::write(data.join("b"), b"dup").unwrap();
    let locked = data.join("c");
    fs::write(&locked, b"dup").unwrap();
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();
    if fs::read(&locked).is_ok() {
        return;
    }
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    let data_arg = data.display().to_string();
    let out_arg = out.display().to_string();

    let err = dupscan::run_app(cli(&config, &["--dir", &data_arg, "--output-dir", &out_arg]))
        .unwrap_err();
    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(!out.exists());

    let code = dupscan::run_app(cli(
        &config,
        &["--dir", &data_arg, "--output-dir", &out_arg, "--skip-errors"],
    ))
    .unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(reports_in(&out).len(), 1);

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o644)).unwrap();
}
