//! Delimited rendering of application exports.
//!
//! Fields are quoted only when they need it (delimiter, quote or line break),
//! so ordinary rows stay plain. Records end with `\n` and the file has no
//! trailing newline.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use crate::common::JobPostingId;
use crate::domains::applications::ApplicationExportRow;

pub const EXPORT_COLUMNS: [&str; 5] = ["id", "candidate_id", "stage", "fit_score", "created_at"];

pub const DELIMITER: u8 = b',';

pub const CONTENT_TYPE: &str = "text/csv";

/// Header record followed by one record per row.
pub fn render_applications_csv(rows: &[ApplicationExportRow]) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer
        .write_record(EXPORT_COLUMNS)
        .context("failed to write export header")?;
    for row in rows {
        writer
            .write_record(record(row))
            .with_context(|| format!("failed to write export row {}", row.id))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush export: {}", e.error()))?;
    let mut rendered = String::from_utf8(bytes).context("export is not valid UTF-8")?;
    if rendered.ends_with('\n') {
        rendered.pop();
    }
    Ok(rendered)
}

fn record(row: &ApplicationExportRow) -> [String; 5] {
    [
        row.id.to_string(),
        row.candidate_id.to_string(),
        row.stage.clone(),
        row.fit_score.map(|s| s.to_string()).unwrap_or_default(),
        row.created_at.to_rfc3339(),
    ]
}

/// Object path for an export. The millisecond timestamp keeps repeated
/// exports of the same posting apart.
pub fn export_path(job_id: JobPostingId, at: DateTime<Utc>) -> String {
    format!("exports/job_{}_{}.csv", job_id, at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ApplicationId, CandidateId};
    use chrono::TimeZone;

    fn row(fit_score: Option<i32>) -> ApplicationExportRow {
        ApplicationExportRow {
            id: ApplicationId::parse("6f1c2a8e-0000-4000-8000-000000000001").unwrap(),
            candidate_id: CandidateId::parse("6f1c2a8e-0000-4000-8000-000000000002").unwrap(),
            stage: "screening".to_string(),
            fit_score,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap(),
        }
    }

    #[test]
    fn test_no_rows_renders_header_only() {
        assert_eq!(
            render_applications_csv(&[]).unwrap(),
            "id,candidate_id,stage,fit_score,created_at"
        );
    }

    #[test]
    fn test_rows_follow_header() {
        let csv = render_applications_csv(&[row(Some(82))]).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[1],
            "6f1c2a8e-0000-4000-8000-000000000001,6f1c2a8e-0000-4000-8000-000000000002,screening,82,2024-03-01T12:30:00+00:00"
        );
    }

    #[test]
    fn test_missing_fit_score_is_empty() {
        let csv = render_applications_csv(&[row(None)]).unwrap();
        let fields: Vec<&str> = csv.lines().nth(1).unwrap().split(',').collect();
        assert_eq!(fields[3], "");
        assert_eq!(fields.len(), EXPORT_COLUMNS.len());
    }

    fn with_stage(stage: &str) -> ApplicationExportRow {
        ApplicationExportRow {
            stage: stage.to_string(),
            ..row(Some(70))
        }
    }

    fn parse(rendered: &str) -> Vec<csv::StringRecord> {
        csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(rendered.as_bytes())
            .records()
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn test_stage_with_delimiter_is_quoted() {
        let rendered = render_applications_csv(&[with_stage("phone screen, round 2")]).unwrap();
        assert!(rendered.contains(",\"phone screen, round 2\","));

        let records = parse(&rendered);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].len(), EXPORT_COLUMNS.len());
        assert_eq!(&records[1][2], "phone screen, round 2");
    }

    #[test]
    fn test_stage_with_quote_and_newline_round_trips() {
        let rendered =
            render_applications_csv(&[with_stage("offer \"pending\""), with_stage("on\nhold")])
                .unwrap();
        assert!(rendered.contains("\"offer \"\"pending\"\"\""));

        let records = parse(&rendered);
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.len() == EXPORT_COLUMNS.len()));
        assert_eq!(&records[1][2], "offer \"pending\"");
        assert_eq!(&records[2][2], "on\nhold");
    }

    #[test]
    fn test_export_path_uses_posting_and_millis() {
        let posting = JobPostingId::parse("6f1c2a8e-0000-4000-8000-0000000000aa").unwrap();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(
            export_path(posting, at),
            "exports/job_6f1c2a8e-0000-4000-8000-0000000000aa_1700000000123.csv"
        );
    }
}
