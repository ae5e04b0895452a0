use anyhow::{Context, Result};
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::debug;

use crate::api::ApiClient;
use crate::report::AnalyticsReport;
use crate::validate::{validate_audio_file, ValidationError};

/// Message shown for any failed upload. The backend's own error detail is
/// logged but never surfaced.
pub const GENERIC_UPLOAD_ERROR: &str = "Upload failed. Please try again.";

/// What we know about a selected recording before it is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMeta {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl FileMeta {
    /// Describe a file on disk: name and size from the filesystem, MIME
    /// from the extension (the CLI stand-in for a browser's file picker).
    pub fn from_path(path: &Path) -> Result<Self> {
        let meta = std::fs::metadata(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        if !meta.is_file() {
            anyhow::bail!("Not a file: {}", path.display());
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("recording")
            .to_string();
        let mime = match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("mp3") => "audio/mpeg",
            _ => "application/octet-stream",
        };
        Ok(FileMeta {
            name,
            size: meta.len(),
            mime: mime.to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStatus {
    Idle,
    Uploading,
    Success,
    Error,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    #[error("No file selected")]
    NoFileSelected,
    #[error("An upload is already in progress")]
    Busy,
    #[error("Upload failed. Please try again.")]
    Failed,
}

/// Derives a display percentage from byte-level progress callbacks.
/// The reported value is round(sent*100/total), clamped to [0, 100], and
/// never decreases even if the transport reports a regressing byte count.
#[derive(Debug, Default)]
pub struct ProgressMeter {
    percent: u8,
}

impl ProgressMeter {
    pub fn observe(&mut self, bytes_sent: u64, bytes_total: u64) -> u8 {
        let pct = if bytes_total == 0 {
            0
        } else {
            ((bytes_sent * 100 + bytes_total / 2) / bytes_total).min(100) as u8
        };
        if pct > self.percent {
            self.percent = pct;
        }
        self.percent
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }
}

/// The file-selection → upload → success/error state machine. One upload
/// attempt per user action; the transition into Uploading is only reachable
/// from Idle, so a second request can never be outstanding.
///
/// The meter is shared with the in-flight request's progress callback, so
/// `progress_percent` reflects bytes on the wire while status is Uploading.
#[derive(Debug)]
pub struct UploadSession {
    selected: Option<FileMeta>,
    status: UploadStatus,
    progress: Arc<Mutex<ProgressMeter>>,
    error: Option<String>,
}

impl Default for UploadSession {
    fn default() -> Self {
        Self::new()
    }
}

impl UploadSession {
    pub fn new() -> Self {
        UploadSession {
            selected: None,
            status: UploadStatus::Idle,
            progress: Arc::new(Mutex::new(ProgressMeter::default())),
            error: None,
        }
    }

    pub fn status(&self) -> UploadStatus {
        self.status
    }

    pub fn selected_file(&self) -> Option<&FileMeta> {
        self.selected.as_ref()
    }

    pub fn progress_percent(&self) -> u8 {
        self.progress.lock().map(|m| m.percent()).unwrap_or(0)
    }

    fn progress_handle(&self) -> Arc<Mutex<ProgressMeter>> {
        Arc::clone(&self.progress)
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Record a chosen file after validating it. An invalid file sets the
    /// error message but leaves the status untouched, same as an invalid
    /// drop on the web drop zone.
    pub fn select(&mut self, file: FileMeta) -> Result<(), UploadError> {
        if self.status != UploadStatus::Idle {
            return Err(UploadError::Busy);
        }
        self.error = None;
        if let Err(e) = validate_audio_file(&file) {
            self.error = Some(e.to_string());
            return Err(e.into());
        }
        self.selected = Some(file);
        Ok(())
    }

    fn begin(&mut self) -> Result<(), UploadError> {
        match self.status {
            UploadStatus::Idle if self.selected.is_none() => Err(UploadError::NoFileSelected),
            UploadStatus::Idle => {
                self.status = UploadStatus::Uploading;
                self.progress = Arc::new(Mutex::new(ProgressMeter::default()));
                self.error = None;
                Ok(())
            }
            _ => Err(UploadError::Busy),
        }
    }

    fn complete(&mut self) {
        self.status = UploadStatus::Success;
        if let Ok(mut meter) = self.progress.lock() {
            meter.percent = 100;
        }
    }

    fn fail(&mut self) {
        self.status = UploadStatus::Error;
        self.error = Some(GENERIC_UPLOAD_ERROR.to_string());
    }

    /// "Try again" / "upload another file": back to a clean Idle state.
    pub fn reset(&mut self) {
        self.selected = None;
        self.status = UploadStatus::Idle;
        self.progress = Arc::new(Mutex::new(ProgressMeter::default()));
        self.error = None;
    }

    /// Drive the selected file through a single upload attempt.
    /// `on_progress` receives the monotonic display percentage.
    pub fn run(
        &mut self,
        client: &ApiClient,
        path: &Path,
        mut on_progress: impl FnMut(u8) + Send + 'static,
    ) -> Result<AnalyticsReport, UploadError> {
        self.begin()?;

        let cb_meter = self.progress_handle();
        let callback = Box::new(move |sent: u64, total: u64| {
            let pct = match cb_meter.lock() {
                Ok(mut m) => m.observe(sent, total),
                Err(_) => return,
            };
            on_progress(pct);
        });

        match client.upload_recording(path, callback) {
            Ok(report) => {
                self.complete();
                Ok(report)
            }
            Err(e) => {
                debug!("Upload failed: {e}");
                self.fail();
                Err(UploadError::Failed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mp3(size: u64) -> FileMeta {
        FileMeta {
            name: "meeting.mp3".to_string(),
            size,
            mime: "audio/mpeg".to_string(),
        }
    }

    #[test]
    fn selecting_a_valid_file_stays_idle() {
        let mut session = UploadSession::new();
        session.select(mp3(5 * 1024 * 1024)).unwrap();

        assert_eq!(session.status(), UploadStatus::Idle);
        let file = session.selected_file().unwrap();
        assert_eq!(file.name, "meeting.mp3");
        assert_eq!(file.size, 5_242_880);
        assert!(session.error_message().is_none());
    }

    #[test]
    fn invalid_selection_sets_error_without_status_change() {
        let mut session = UploadSession::new();
        let wav = FileMeta {
            name: "meeting.wav".to_string(),
            size: 1024,
            mime: "audio/wav".to_string(),
        };
        assert!(session.select(wav).is_err());
        assert_eq!(session.status(), UploadStatus::Idle);
        assert_eq!(session.error_message(), Some("Please upload a valid MP3 file"));
        assert!(session.selected_file().is_none());
    }

    #[test]
    fn valid_selection_clears_previous_error() {
        let mut session = UploadSession::new();
        let _ = session.select(mp3(21 * 1024 * 1024));
        assert!(session.error_message().is_some());
        session.select(mp3(1024)).unwrap();
        assert!(session.error_message().is_none());
    }

    #[test]
    fn begin_requires_a_selected_file() {
        let mut session = UploadSession::new();
        assert!(matches!(session.begin(), Err(UploadError::NoFileSelected)));

        session.select(mp3(1024)).unwrap();
        session.begin().unwrap();
        assert_eq!(session.status(), UploadStatus::Uploading);
        assert!(matches!(session.begin(), Err(UploadError::Busy)));
    }

    #[test]
    fn failure_keeps_selected_file_and_sets_generic_message() {
        let mut session = UploadSession::new();
        session.select(mp3(1024)).unwrap();
        session.begin().unwrap();
        session.fail();

        assert_eq!(session.status(), UploadStatus::Error);
        assert_eq!(session.error_message(), Some(GENERIC_UPLOAD_ERROR));
        assert!(session.selected_file().is_some());
    }

    #[test]
    fn progress_is_visible_on_the_session_while_uploading() {
        let mut session = UploadSession::new();
        session.select(mp3(1024)).unwrap();
        session.begin().unwrap();

        // The transport callback feeds the same meter the session reads.
        let meter = session.progress_handle();
        meter.lock().unwrap().observe(512, 1024);

        assert_eq!(session.status(), UploadStatus::Uploading);
        assert_eq!(session.progress_percent(), 50);

        meter.lock().unwrap().observe(1024, 1024);
        assert_eq!(session.progress_percent(), 100);
    }

    #[test]
    fn success_leaves_progress_at_100() {
        let mut session = UploadSession::new();
        session.select(mp3(1024)).unwrap();
        session.begin().unwrap();
        session.complete();

        assert_eq!(session.status(), UploadStatus::Success);
        assert_eq!(session.progress_percent(), 100);
    }

    #[test]
    fn reset_returns_to_clean_idle() {
        let mut session = UploadSession::new();
        session.select(mp3(1024)).unwrap();
        session.begin().unwrap();
        session.fail();

        session.reset();
        assert_eq!(session.status(), UploadStatus::Idle);
        assert!(session.selected_file().is_none());
        assert!(session.error_message().is_none());
        assert_eq!(session.progress_percent(), 0);
    }

    #[test]
    fn progress_is_rounded_and_bounded() {
        let mut meter = ProgressMeter::default();
        assert_eq!(meter.observe(0, 200), 0);
        assert_eq!(meter.observe(1, 200), 1); // 0.5% rounds up
        assert_eq!(meter.observe(100, 200), 50);
        assert_eq!(meter.observe(199, 200), 100); // 99.5% rounds up
        assert_eq!(meter.observe(250, 200), 100); // clamped
    }

    #[test]
    fn progress_never_decreases() {
        let mut meter = ProgressMeter::default();
        assert_eq!(meter.observe(80, 100), 80);
        assert_eq!(meter.observe(40, 100), 80);
        assert_eq!(meter.observe(90, 100), 90);
    }

    #[test]
    fn zero_total_reports_zero() {
        let mut meter = ProgressMeter::default();
        assert_eq!(meter.observe(0, 0), 0);
    }
}
