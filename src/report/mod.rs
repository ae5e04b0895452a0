use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One diarized transcript line. Field names follow the backend's JSON
/// (capitalized keys), kept verbatim so the JSON export round-trips.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptLine {
    #[serde(rename = "Speaker")]
    pub speaker: String,
    #[serde(rename = "Transcription")]
    pub text: String,
}

/// The analytics payload returned by `/upload/`. Immutable once parsed;
/// `speaker_summaries` preserves the backend's key order.
///
/// The backend guarantees that every summarized speaker also appears in
/// `transcriptions`; we do not re-check that here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Meeting length in minutes.
    pub total_duration: f64,
    pub num_participants: u32,
    pub total_segments: u32,
    /// Backend-computed interactivity metric, 0–10.
    pub engagement_score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_summary: Option<String>,
    pub speaker_summaries: IndexMap<String, String>,
    pub transcriptions: Vec<TranscriptLine>,
}

impl AnalyticsReport {
    /// Read a previously saved report from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read report: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Not a valid analytics report: {}", path.display()))
    }

    /// Save the raw payload as pretty JSON so it can be re-rendered or exported later.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write report: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = r#"{
        "total_duration": 42.5,
        "num_participants": 2,
        "total_segments": 3,
        "engagement_score": 7.4,
        "meeting_summary": "Roadmap planning for Q3.",
        "speaker_summaries": {
            "Speaker 1": "Discussed roadmap.",
            "Speaker 0": "Raised budget concerns."
        },
        "transcriptions": [
            {"Speaker": "Speaker 1", "Transcription": "Let's start with the roadmap."},
            {"Speaker": "Speaker 0", "Transcription": "What about the budget?"},
            {"Speaker": "Speaker 1", "Transcription": "We'll get to that."}
        ]
    }"#;

    #[test]
    fn parses_backend_payload_with_capitalized_line_keys() {
        let report: AnalyticsReport = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(report.num_participants, 2);
        assert_eq!(report.transcriptions.len(), 3);
        assert_eq!(report.transcriptions[0].speaker, "Speaker 1");
        assert_eq!(report.transcriptions[1].text, "What about the budget?");
    }

    #[test]
    fn speaker_summaries_keep_payload_order() {
        let report: AnalyticsReport = serde_json::from_str(SAMPLE).unwrap();
        let keys: Vec<&String> = report.speaker_summaries.keys().collect();
        assert_eq!(keys, ["Speaker 1", "Speaker 0"]);
    }

    #[test]
    fn save_and_load_round_trip() {
        let report: AnalyticsReport = serde_json::from_str(SAMPLE).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        report.save(&path).unwrap();
        let loaded = AnalyticsReport::load(&path).unwrap();
        assert_eq!(loaded, report);
    }

    #[test]
    fn missing_summary_is_none() {
        let json = r#"{
            "total_duration": 1.0,
            "num_participants": 1,
            "total_segments": 1,
            "engagement_score": 5.0,
            "speaker_summaries": {},
            "transcriptions": []
        }"#;
        let report: AnalyticsReport = serde_json::from_str(json).unwrap();
        assert!(report.meeting_summary.is_none());
    }
}
