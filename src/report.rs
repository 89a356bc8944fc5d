// src/report.rs

use crate::error::ReportError;
use crate::model::{RepositoryMetrics, COLUMNS};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Writes the batch to `out_path`, creating parent directories. A `.json`
/// extension selects JSON; anything else is CSV.
pub fn write_report(out_path: &Path, batch: &[RepositoryMetrics]) -> Result<(), ReportError> {
    if let Some(parent) = out_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut writer = BufWriter::new(File::create(out_path)?);

    let is_json = out_path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        serde_json::to_writer_pretty(&mut writer, batch)?;
        writeln!(writer)?;
    } else {
        write_csv(&mut writer, batch)?;
    }
    writer.flush()?;
    Ok(())
}

/// CSV with a header row even when the batch is empty
pub fn write_csv<W: Write>(out: W, batch: &[RepositoryMetrics]) -> Result<(), ReportError> {
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(out);
    writer.write_record(COLUMNS)?;
    for record in batch {
        writer.serialize(record)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Status;
    use chrono::DateTime;

    fn sample() -> Vec<RepositoryMetrics> {
        let mut ok = RepositoryMetrics::new("https://github.com/foo/bar", "foo/bar", Status::Ok);
        ok.commits_count = Some(12);
        ok.contributors_count = Some(3);
        ok.first_commit_iso = Some(DateTime::parse_from_rfc3339("2020-01-01T10:00:00+02:00").unwrap());
        ok.avg_lines_changed_per_commit = Some(4.5);
        ok.default_branch = Some("main".to_string());
        let failed = RepositoryMetrics::failed("not a url", "invalid GitHub URL");
        vec![ok, failed]
    }

    #[test]
    fn csv_has_fixed_columns_and_empty_cells() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], COLUMNS.join(","));
        assert_eq!(
            lines[1],
            "https://github.com/foo/bar,foo/bar,3,12,2020-01-01T10:00:00+02:00,,,4.5,main,,OK"
        );
        assert_eq!(lines[2], "not a url,,,,,,,,,,ERROR: invalid GitHub URL");
    }

    #[test]
    fn empty_batch_still_has_header() {
        let mut buf = Vec::new();
        write_csv(&mut buf, &[]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap().trim_end(), COLUMNS.join(","));
    }

    #[test]
    fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out/nested/report.csv");
        write_report(&path, &sample()).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 3);
    }

    #[test]
    fn json_extension_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.JSON");
        write_report(&path, &sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        let rows = value.as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["repo_slug"], "foo/bar");
        assert_eq!(rows[0]["commits_count"], 12);
        assert!(rows[1]["total_lines"].is_null());
        assert_eq!(rows[1]["clone_status"], "ERROR: invalid GitHub URL");
    }
}
