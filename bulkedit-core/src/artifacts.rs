//! Report artifacts written at the end of a run.

use crate::ports::WritePort;
use anyhow::Context;
use bulkedit_render::render_report_md;
use bulkedit_types::report::ExecutionReport;
use camino::Utf8Path;

pub const REPORT_JSON: &str = "report.json";
pub const REPORT_MD: &str = "report.md";

/// Write `report.json` and `report.md` to the output directory.
pub fn write_report_artifacts(
    report: &ExecutionReport,
    out_dir: &Utf8Path,
    writer: &dyn WritePort,
) -> anyhow::Result<()> {
    writer.create_dir_all(out_dir)?;

    let mut report_json = serde_json::to_string_pretty(report).context("serialize report")?;
    report_json.push('\n');
    writer.write_file(&out_dir.join(REPORT_JSON), report_json.as_bytes())?;

    let report_md = render_report_md(report);
    writer.write_file(&out_dir.join(REPORT_MD), report_md.as_bytes())?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bulkedit_types::report::{ReportRunInfo, ReportToolInfo};
    use camino::Utf8PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingWriter {
        files: Mutex<Vec<(Utf8PathBuf, String)>>,
        dirs: Mutex<Vec<Utf8PathBuf>>,
    }

    impl WritePort for RecordingWriter {
        fn write_file(&self, path: &Utf8Path, contents: &[u8]) -> anyhow::Result<()> {
            self.files.lock().expect("lock").push((
                path.to_path_buf(),
                String::from_utf8_lossy(contents).into_owned(),
            ));
            Ok(())
        }

        fn create_dir_all(&self, path: &Utf8Path) -> anyhow::Result<()> {
            self.dirs.lock().expect("lock").push(path.to_path_buf());
            Ok(())
        }
    }

    fn report() -> ExecutionReport {
        ExecutionReport::new(
            ReportToolInfo {
                name: "bulkedit".into(),
                version: "0.1.0".into(),
            },
            ReportRunInfo {
                run_id: "run-1".into(),
                started_at: "2024-01-01T00:00:00Z".into(),
                ended_at: None,
                duration_ms: None,
            },
            true,
        )
    }

    #[test]
    fn writes_json_and_markdown() {
        let writer = RecordingWriter::default();
        let out = Utf8PathBuf::from("artifacts/bulkedit");
        write_report_artifacts(&report(), &out, &writer).expect("write artifacts");

        assert_eq!(*writer.dirs.lock().expect("lock"), vec![out.clone()]);

        let files = writer.files.lock().expect("lock");
        let names: Vec<&str> = files.iter().filter_map(|(p, _)| p.file_name()).collect();
        assert_eq!(names, vec![REPORT_JSON, REPORT_MD]);

        let json: serde_json::Value = serde_json::from_str(&files[0].1).expect("json");
        assert_eq!(json["schema"], "bulkedit.report.v1");
        assert_eq!(json["dry_run"], true);
        assert!(files[1].1.contains("dry-run"));
    }
}
