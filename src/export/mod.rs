pub mod pdf;

use std::fmt::Write as _;
use thiserror::Error;

use crate::report::AnalyticsReport;

/// Width of the `====` section rules in the Word-compatible export.
const SECTION_RULE_WIDTH: usize = 42;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to encode report as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to build PDF: {0}")]
    Pdf(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Text,
    Json,
    Word,
    Pdf,
}

impl ExportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ExportFormat::Text),
            "json" => Some(ExportFormat::Json),
            "word" | "doc" => Some(ExportFormat::Word),
            "pdf" => Some(ExportFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Json => "json",
            ExportFormat::Word => "doc",
            ExportFormat::Pdf => "pdf",
        }
    }

    /// `.doc` carries the legacy word-processor type so host applications
    /// hand it to a compatible editor.
    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain",
            ExportFormat::Json => "application/json",
            ExportFormat::Word => "application/msword",
            ExportFormat::Pdf => "application/pdf",
        }
    }

    pub fn file_name(&self) -> String {
        format!("meeting-analytics.{}", self.extension())
    }
}

/// How the engagement score appears in the overview block: the plain-text
/// export shows the raw value, the document formats round to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ScorePrecision {
    Raw,
    OneDecimal,
}

/// The fixed section order every format renders: overview metrics, meeting
/// summary, speaker summaries in payload order, then the transcript.
/// Formats differ only in how they decorate these sections.
pub(crate) struct Sections<'a> {
    pub overview: Vec<(&'static str, String)>,
    pub summary: &'a str,
    pub speakers: Vec<(&'a str, &'a str)>,
    pub transcript: Vec<(&'a str, &'a str)>,
}

impl<'a> Sections<'a> {
    pub fn from_report(report: &'a AnalyticsReport, score: ScorePrecision) -> Self {
        let engagement = match score {
            ScorePrecision::Raw => report.engagement_score.to_string(),
            ScorePrecision::OneDecimal => format!("{:.1}", report.engagement_score),
        };
        Sections {
            overview: vec![
                ("Duration", format!("{} minutes", report.total_duration)),
                ("Participants", report.num_participants.to_string()),
                ("Segments", report.total_segments.to_string()),
                ("Engagement Score", engagement),
            ],
            summary: report.meeting_summary.as_deref().unwrap_or(""),
            speakers: report
                .speaker_summaries
                .iter()
                .map(|(speaker, summary)| (speaker.as_str(), summary.as_str()))
                .collect(),
            transcript: report
                .transcriptions
                .iter()
                .map(|line| (line.speaker.as_str(), line.text.as_str()))
                .collect(),
        }
    }
}

/// Render a report in the requested format. Pure and synchronous; the
/// caller decides where the bytes go.
pub fn render(report: &AnalyticsReport, format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Text => Ok(render_text(report).into_bytes()),
        ExportFormat::Json => Ok(render_json(report)?.into_bytes()),
        ExportFormat::Word => Ok(render_word(report).into_bytes()),
        ExportFormat::Pdf => pdf::render_pdf(report),
    }
}

fn render_text(report: &AnalyticsReport) -> String {
    let s = Sections::from_report(report, ScorePrecision::Raw);
    let mut out = String::from("Meeting Analytics Report\n\n");

    for (label, value) in &s.overview {
        writeln!(out, "{label}: {value}").ok();
    }
    out.push('\n');

    writeln!(out, "Meeting Summary:\n{}", s.summary).ok();
    out.push('\n');

    out.push_str("Speaker Summaries:\n");
    for (speaker, summary) in &s.speakers {
        writeln!(out, "{speaker}:\n{summary}").ok();
        out.push('\n');
    }

    out.push_str("\nTranscriptions:\n");
    for (speaker, text) in &s.transcript {
        writeln!(out, "{speaker}: {text}").ok();
    }
    out
}

/// Faithful pretty-printed (2-space indent) round-trip of the payload.
fn render_json(report: &AnalyticsReport) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn section_rule() -> String {
    "=".repeat(SECTION_RULE_WIDTH)
}

fn word_heading(out: &mut String, title: &str) {
    let rule = section_rule();
    writeln!(out, "{rule}").ok();
    writeln!(out, "{title}").ok();
    writeln!(out, "{rule}").ok();
}

fn render_word(report: &AnalyticsReport) -> String {
    let s = Sections::from_report(report, ScorePrecision::OneDecimal);
    let mut out = String::from("Meeting Analytics Report\n\n");

    word_heading(&mut out, "MEETING OVERVIEW");
    for (label, value) in &s.overview {
        writeln!(out, "{label}: {value}").ok();
    }
    out.push('\n');

    word_heading(&mut out, "MEETING SUMMARY");
    writeln!(out, "{}", s.summary).ok();
    out.push('\n');

    word_heading(&mut out, "SPEAKER SUMMARIES");
    for (speaker, summary) in &s.speakers {
        writeln!(out, "{}", speaker.to_uppercase()).ok();
        writeln!(out, "{summary}").ok();
        out.push('\n');
    }

    word_heading(&mut out, "FULL TRANSCRIPTION");
    for (speaker, text) in &s.transcript {
        writeln!(out, "{}", speaker.to_uppercase()).ok();
        writeln!(out, "{text}").ok();
        out.push('\n');
    }
    out
}
