use dupscan::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, ScanSummary};
use dupscan::report::{ReportFormat, ReportWriter};
use std::fs;
use tempfile::{tempdir, TempDir};

fn scan_fixture() -> (TempDir, Vec<DuplicateSet>, ScanSummary) {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("a.txt"), b"X").unwrap();
    fs::write(data.join("b.txt"), b"X").unwrap();
    fs::write(data.join("c.txt"), b"Y").unwrap();
    fs::write(data.join("d.txt"), b"XX").unwrap();

    let finder = DuplicateFinder::new(FinderConfig::default().with_workers(2));
    let (sets, summary) = finder.find_duplicates(&data).unwrap();
    (dir, sets, summary)
}

#[test]
fn test_text_report_lists_each_group_on_one_line() {
    let (dir, sets, summary) = scan_fixture();
    let out = dir.path().join("reports");

    let path = ReportWriter::new(&out, ReportFormat::Text)
        .write(&sets, &summary)
        .unwrap();

    let name = path.file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("duplicates-"));
    assert!(name.ends_with(".txt"));

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 1);

    let data = dir.path().join("data");
    let expected = format!(
        "{},{}",
        data.join("a.txt").display(),
        data.join("b.txt").display()
    );
    assert_eq!(lines[0], expected);
    assert!(!lines[0].ends_with(','));
}

#[test]
fn test_empty_result_still_writes_report() {
    let dir = tempdir().unwrap();
    let data = dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("only.txt"), b"alone").unwrap();

    let (sets, summary) = DuplicateFinder::with_defaults()
        .find_duplicates(&data)
        .unwrap();
    let path = ReportWriter::new(dir.path(), ReportFormat::Text)
        .write(&sets, &summary)
        .unwrap();

    assert!(path.exists());
    assert_eq!(fs::read_to_string(&path).unwrap(), "");
}

#[test]
fn test_json_report_matches_scan() {
    let (dir, sets, summary) = scan_fixture();

    let path = ReportWriter::new(dir.path(), ReportFormat::Json)
        .write(&sets, &summary)
        .unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(value["summary"]["total_files"], 4);
    assert_eq!(value["summary"]["candidate_files"], 3);
    assert_eq!(value["summary"]["duplicate_groups"], 1);
    assert_eq!(value["groups"][0]["paths"].as_array().unwrap().len(), 2);
    assert_eq!(value["groups"][0]["digest"], sets[0].digest.as_str());
}

#[test]
fn test_consecutive_reports_do_not_collide() {
    let (dir, sets, summary) = scan_fixture();
    let writer = ReportWriter::new(dir.path(), ReportFormat::Text);

    let first = writer.write(&sets, &summary).unwrap();
    let second = writer.write(&sets, &summary).unwrap();

    assert_ne!(first, second);
    assert!(first.exists());
    assert!(second.exists());
}
