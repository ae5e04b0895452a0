//! Machine-readable output for the global `--json` flag.

use anyhow::Result;
use serde::Serialize;

/// Pretty-print a value (analytics report, session, config view) as JSON
/// on stdout. Reports keep their wire field names, so `mna show --json`
/// emits the same shape the backend returned.
pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::report::AnalyticsReport;

    #[test]
    fn report_serializes_with_wire_field_names() {
        let report: AnalyticsReport = serde_json::from_str(
            r#"{
                "total_duration": 3.0,
                "num_participants": 1,
                "total_segments": 1,
                "engagement_score": 5.0,
                "speaker_summaries": {"Speaker 0": "Brief."},
                "transcriptions": [{"Speaker": "Speaker 0", "Transcription": "Hi."}]
            }"#,
        )
        .unwrap();
        let json = serde_json::to_string_pretty(&report).unwrap();
        assert!(json.contains("\"Speaker\": \"Speaker 0\""));
        assert!(json.contains("\"total_duration\": 3.0"));
    }
}
