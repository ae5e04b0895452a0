//! Paginated PDF rendering of an analytics report: title, overview metrics,
//! wrapped summary paragraph, then speaker-summary and transcription tables.
//! Uses printpdf's builtin Helvetica faces so no font files ship with the
//! binary; line wrapping is done by display width, which is close enough
//! for a proportional face at report sizes.

use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
};
use unicode_width::UnicodeWidthStr;

use super::{ExportError, ScorePrecision, Sections};
use crate::report::AnalyticsReport;

// A4 geometry in millimeters, cursor measured from the top edge.
const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN: f32 = 20.0;
/// Start a new page when less than this remains before a table.
const BOTTOM_GUARD: f32 = 40.0;

const BODY_LINE: f32 = 7.0;
const TABLE_LINE: f32 = 5.0;
const SPEAKER_COL_W: f32 = 45.0;
const TEXT_COL_X: f32 = MARGIN + SPEAKER_COL_W + 5.0;
const TEXT_COL_W: f32 = PAGE_W - MARGIN - TEXT_COL_X;

const TITLE_SIZE: f32 = 20.0;
const HEADING_SIZE: f32 = 14.0;
const BODY_SIZE: f32 = 12.0;
const TABLE_SIZE: f32 = 10.0;

pub fn render_pdf(report: &AnalyticsReport) -> Result<Vec<u8>, ExportError> {
    let sections = Sections::from_report(report, ScorePrecision::OneDecimal);
    let mut pdf = PdfWriter::new()?;

    pdf.text(MARGIN, "Meeting Analytics Report", TITLE_SIZE, true);
    pdf.advance(15.0);

    for (label, value) in &sections.overview {
        pdf.text(MARGIN, &format!("{label}: {value}"), BODY_SIZE, false);
        pdf.advance(BODY_LINE);
    }
    pdf.advance(8.0);

    pdf.text(MARGIN, "Meeting Summary", HEADING_SIZE, true);
    pdf.advance(BODY_LINE);
    for line in wrap(sections.summary, chars_for(PAGE_W - 2.0 * MARGIN, BODY_SIZE)) {
        pdf.text(MARGIN, &line, BODY_SIZE, false);
        pdf.advance(BODY_LINE);
    }
    pdf.advance(10.0);

    pdf.table("Speaker Summaries", "Summary", &sections.speakers);
    pdf.advance(15.0);

    pdf.table("Full Transcription", "Transcription", &sections.transcript);

    pdf.finish()
}

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    /// Cursor offset from the top of the current page, in mm.
    y: f32,
}

impl PdfWriter {
    fn new() -> Result<Self, ExportError> {
        let (doc, page, layer_idx) =
            PdfDocument::new("Meeting Analytics Report", Mm(PAGE_W), Mm(PAGE_H), "content");
        let regular = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(|e| ExportError::Pdf(e.to_string()))?;
        let layer = doc.get_page(page).get_layer(layer_idx);
        Ok(PdfWriter {
            doc,
            layer,
            regular,
            bold,
            y: MARGIN,
        })
    }

    fn new_page(&mut self) {
        let (page, layer_idx) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "content");
        self.layer = self.doc.get_page(page).get_layer(layer_idx);
        self.y = MARGIN;
    }

    fn advance(&mut self, mm: f32) {
        self.y += mm;
    }

    /// Page-break when too close to the bottom edge.
    fn break_if_low(&mut self) {
        if PAGE_H - self.y < BOTTOM_GUARD {
            self.new_page();
        }
    }

    fn text(&mut self, x: f32, s: &str, size: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.regular };
        self.layer
            .use_text(s, size, Mm(x), Mm(PAGE_H - self.y), font);
    }

    fn table_header(&mut self, second_col: &str) {
        self.text(MARGIN, "Speaker", TABLE_SIZE, true);
        self.text(TEXT_COL_X, second_col, TABLE_SIZE, true);
        self.advance(TABLE_LINE + 2.0);
    }

    /// Two-column table; each row wraps its text cell and the header is
    /// re-drawn after a page break.
    fn table(&mut self, title: &str, second_col: &str, rows: &[(&str, &str)]) {
        self.break_if_low();
        self.text(MARGIN, title, HEADING_SIZE, true);
        self.advance(10.0);
        self.table_header(second_col);

        for (speaker, text) in rows {
            let lines = wrap(text, chars_for(TEXT_COL_W, TABLE_SIZE));
            let row_height = lines.len() as f32 * TABLE_LINE + 2.0;
            if self.y + row_height > PAGE_H - MARGIN {
                self.new_page();
                self.table_header(second_col);
            }
            self.text(MARGIN, speaker, TABLE_SIZE, false);
            for line in &lines {
                self.text(TEXT_COL_X, line, TABLE_SIZE, false);
                self.advance(TABLE_LINE);
            }
            self.advance(2.0);
        }
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        self.doc
            .save_to_bytes()
            .map_err(|e| ExportError::Pdf(e.to_string()))
    }
}

/// Approximate character budget for a column at a given font size.
fn chars_for(width_mm: f32, font_size: f32) -> usize {
    // Average Helvetica glyph advance is roughly half the em size;
    // 1 pt = 0.3528 mm.
    let glyph_mm = font_size * 0.5 * 0.3528;
    ((width_mm / glyph_mm) as usize).max(1)
}

/// Greedy word wrap on display width. A single overlong word gets its own
/// line rather than being split.
fn wrap(text: &str, max_width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut width = 0;

    for word in text.split_whitespace() {
        let w = UnicodeWidthStr::width(word);
        if width == 0 {
            current = word.to_string();
            width = w;
        } else if width + 1 + w <= max_width {
            current.push(' ');
            current.push_str(word);
            width += 1 + w;
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
            width = w;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::TranscriptLine;
    use indexmap::IndexMap;

    fn report(lines: usize) -> AnalyticsReport {
        let mut summaries = IndexMap::new();
        summaries.insert("Speaker 0".to_string(), "Kept things moving.".to_string());
        AnalyticsReport {
            total_duration: 12.0,
            num_participants: 1,
            total_segments: lines as u32,
            engagement_score: 6.0,
            meeting_summary: Some("A short meeting about wrapping and pagination.".to_string()),
            speaker_summaries: summaries,
            transcriptions: (0..lines)
                .map(|i| TranscriptLine {
                    speaker: "Speaker 0".to_string(),
                    text: format!("Line {i}: some spoken words that take up room on the page."),
                })
                .collect(),
        }
    }

    #[test]
    fn produces_a_pdf_header() {
        let bytes = render_pdf(&report(3)).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 500);
    }

    #[test]
    fn long_transcripts_grow_the_document() {
        let small = render_pdf(&report(2)).unwrap();
        let large = render_pdf(&report(400)).unwrap();
        assert!(large.len() > small.len());
    }

    #[test]
    fn wrap_respects_width_budget() {
        let lines = wrap("one two three four five six", 9);
        assert_eq!(lines, ["one two", "three", "four five", "six"]);
        for line in &lines {
            assert!(UnicodeWidthStr::width(line.as_str()) <= 9);
        }
    }

    #[test]
    fn wrap_of_empty_text_is_one_blank_line() {
        assert_eq!(wrap("", 20), [""]);
    }

    #[test]
    fn overlong_word_is_not_split() {
        let lines = wrap("tiny incomprehensibilities", 10);
        assert_eq!(lines, ["tiny", "incomprehensibilities"]);
    }
}
