use unicode_width::UnicodeWidthStr;

use crate::report::AnalyticsReport;

/// Format a duration in minutes to a human-readable string.
pub fn format_duration(minutes: f64) -> String {
    let total_secs = (minutes * 60.0) as u64;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    if h > 0 {
        format!("{h}h{m:02}m")
    } else if m > 0 {
        format!("{m}m{s:02}s")
    } else {
        format!("{s}s")
    }
}

/// Truncate a string to fit within max_width (respecting unicode width).
fn truncate(s: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(s) <= max_width {
        return s.to_string();
    }
    let mut result = String::new();
    let mut width = 0;
    for ch in s.chars() {
        let cw = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if width + cw + 3 > max_width {
            while result.ends_with(' ') {
                result.pop();
            }
            result.push_str("...");
            break;
        }
        result.push(ch);
        width += cw;
    }
    result
}

/// Render the analytics view: overview metrics, summary, per-speaker
/// summaries, and the transcript grouped by consecutive speaker.
pub fn print_report(report: &AnalyticsReport) {
    println!("Meeting Analytics");
    println!(
        "  Duration:     {} ({} min)",
        format_duration(report.total_duration),
        report.total_duration
    );
    println!("  Participants: {}", report.num_participants);
    println!("  Segments:     {}", report.total_segments);
    println!("  Engagement:   {:.1} / 10", report.engagement_score);

    if let Some(ref summary) = report.meeting_summary {
        if !summary.is_empty() {
            println!("\nMeeting Summary:");
            for line in summary.lines() {
                println!("  {line}");
            }
        }
    }

    if !report.speaker_summaries.is_empty() {
        println!("\nSpeaker Summaries:");
        for (speaker, summary) in &report.speaker_summaries {
            println!("  {speaker}:");
            for line in summary.lines() {
                println!("    {line}");
            }
        }
    }

    if report.transcriptions.is_empty() {
        return;
    }

    println!("\nFull Transcription:\n");
    let mut last_speaker = "";
    for line in &report.transcriptions {
        if line.speaker != last_speaker {
            if !last_speaker.is_empty() {
                println!();
            }
            println!("  {}:", line.speaker);
            last_speaker = &line.speaker;
        }
        println!("    {}", line.text);
    }
}

/// One-line confirmation after a successful upload.
pub fn print_upload_summary(report: &AnalyticsReport) {
    println!(
        "Analyzed {} of audio: {} speakers, {} segments, engagement {:.1}/10",
        format_duration(report.total_duration),
        report.num_participants,
        report.total_segments,
        report.engagement_score,
    );
}

/// Selected-file line shown before the upload starts.
pub fn print_selected_file(name: &str, size: u64) {
    println!(
        "  {} ({:.2} MB)",
        truncate(name, 60),
        size as f64 / (1024.0 * 1024.0)
    );
}
