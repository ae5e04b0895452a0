use reqwest::blocking::{multipart, Client, Response};
use reqwest::header::AUTHORIZATION;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::report::AnalyticsReport;
use crate::upload::FileMeta;

/// Byte-level progress callback: (bytes_sent, bytes_total).
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send + 'static>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{message}")]
    Rejected { status: u16, message: String },
    #[error("failed to read {path}: {source}")]
    File {
        path: String,
        source: std::io::Error,
    },
}

#[derive(Debug, Deserialize)]
pub struct RegisterResponse {
    pub token: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user_id: i64,
    pub username: String,
}

/// Blocking HTTP client for the analysis backend. The token is read-only
/// here; storing and clearing it is the session store's job.
pub struct ApiClient {
    base_url: String,
    token: Option<String>,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Self {
        ApiClient {
            base_url: base_url.into(),
            token,
            client: Client::new(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// POST /register/ with {username, email, password}. The backend
    /// reports failures under a "detail" key.
    pub fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let body = serde_json::json!({
            "username": username,
            "email": email,
            "password": password,
        });
        let resp = self
            .client
            .post(self.endpoint("/register/"))
            .json(&body)
            .send()?;
        parse_response(resp, "detail")
    }

    /// POST /login/ with {username, password}. Failures come back under "error".
    pub fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = serde_json::json!({
            "username": username,
            "password": password,
        });
        let resp = self
            .client
            .post(self.endpoint("/login/"))
            .json(&body)
            .send()?;
        parse_response(resp, "error")
    }

    /// Best-effort POST /logout/. Failures are logged and swallowed; the
    /// caller has already cleared local state by the time this runs.
    pub fn logout(&self, token: &str) {
        let result = self
            .client
            .post(self.endpoint("/logout/"))
            .header(AUTHORIZATION, format!("Token {token}"))
            .send();
        match result {
            Ok(resp) if resp.status().is_success() => debug!("Server acknowledged logout"),
            Ok(resp) => debug!("Server logout returned {}", resp.status()),
            Err(e) => debug!("Server logout failed: {e}"),
        }
    }

    /// Multipart POST /upload/ streaming the recording through a counting
    /// reader so `on_progress` sees every chunk leave. One attempt, no
    /// retries, transport-default timeouts.
    pub fn upload_recording(
        &self,
        path: &Path,
        on_progress: ProgressFn,
    ) -> Result<AnalyticsReport, ApiError> {
        let meta = FileMeta::from_path(path).map_err(|e| ApiError::File {
            path: path.display().to_string(),
            source: std::io::Error::other(e),
        })?;
        let file = std::fs::File::open(path).map_err(|e| ApiError::File {
            path: path.display().to_string(),
            source: e,
        })?;

        let reader = ProgressReader::new(file, meta.size, on_progress);
        let part = multipart::Part::reader_with_length(reader, meta.size)
            .file_name(meta.name)
            .mime_str(&meta.mime)?;
        let form = multipart::Form::new().part("file", part);

        let mut request = self.client.post(self.endpoint("/upload/")).multipart(form);
        if let Some(ref token) = self.token {
            request = request.header(AUTHORIZATION, format!("Token {token}"));
        }

        let resp = request.send()?;
        parse_response(resp, "detail")
    }
}

fn parse_response<T: DeserializeOwned>(resp: Response, error_key: &str) -> Result<T, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json()?);
    }
    let body = resp.text().unwrap_or_default();
    Err(ApiError::Rejected {
        status: status.as_u16(),
        message: failure_message(status.as_u16(), &body, error_key),
    })
}

/// Pull the backend's message out of an error body, falling back to the
/// bare status code when the body isn't the expected JSON shape.
fn failure_message(status: u16, body: &str, error_key: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get(error_key)
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| format!("Server returned status {status}"))
}

/// Wraps a reader and reports cumulative bytes read to a callback.
struct ProgressReader<R> {
    inner: R,
    sent: u64,
    total: u64,
    on_progress: ProgressFn,
}

impl<R: Read> ProgressReader<R> {
    fn new(inner: R, total: u64, on_progress: ProgressFn) -> Self {
        ProgressReader {
            inner,
            sent: 0,
            total,
            on_progress,
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sent += n as u64;
            (self.on_progress)(self.sent, self.total);
        }
        Ok(n)
    }
}
