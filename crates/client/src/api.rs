//! REST API client for the studio backend.
//!
//! Wraps every HTTP endpoint the client talks to (generation submission,
//! status polling, edit config, regeneration, media upload and AI image
//! generation) using [`reqwest`].

use std::path::Path;
use std::time::Duration;

use mecca_core::editor::{RegenerateBody, VideoConfig};
use mecca_core::generation::{GenerateRequest, MovieQuote, MovieQuoteList};
use mecca_core::task::TaskSnapshot;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;

/// HTTP client for one backend instance.
#[derive(Clone)]
pub struct StudioApi {
    pub(crate) client: reqwest::Client,
    pub(crate) base_url: String,
    regenerate_timeout: Duration,
    pub(crate) thumbnail_timeout: Duration,
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Response of `POST /api/generate`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    /// Server-assigned task identifier.
    pub task_id: String,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    /// Sentences the backend will narrate (echoed for theme/other formats).
    #[serde(default)]
    pub sentences: Vec<String>,
}

/// Response of `GET /api/video/{id}/config`.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigEnvelope {
    pub config: VideoConfig,
    #[serde(default)]
    pub video_exists: bool,
    #[serde(default)]
    pub video_path: Option<String>,
}

/// Response of `POST /api/video/{id}/regenerate`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegenerateResponse {
    pub video_path: String,
    /// Seconds the backend spent rendering.
    #[serde(default)]
    pub processing_time: Option<f64>,
}

/// Response of `POST /api/video/{id}/upload-media/{index}`.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    pub file_path: String,
    #[serde(default)]
    pub file_type: String,
}

/// Response of the `generate-*-image` endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ImageResponse {
    pub image_path: String,
    #[serde(default)]
    pub message: String,
}

/// Which image an AI generation call replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Clip(usize),
    Intro,
    Outro,
}

impl ImageTarget {
    fn path_suffix(self) -> String {
        match self {
            ImageTarget::Clip(index) => format!("generate-clip-image/{index}"),
            ImageTarget::Intro => "generate-intro-image".to_string(),
            ImageTarget::Outro => "generate-outro-image".to_string(),
        }
    }
}

/// Downloadable artifacts of a finished task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadKind {
    Video,
    Metadata,
}

impl DownloadKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DownloadKind::Video => "video",
            DownloadKind::Metadata => "metadata",
        }
    }
}

#[derive(Serialize)]
struct PromptBody<'a> {
    prompt: &'a str,
}

/// Body shape the backend uses for failures.
#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from the REST API layer.
#[derive(Debug, thiserror::Error)]
pub enum StudioApiError {
    /// The HTTP request itself failed (network, DNS, TLS, decoding).
    #[error("HTTP request failed: {0}")]
    Request(reqwest::Error),

    /// The request did not complete within its timeout.
    #[error("Request timed out")]
    Timeout,

    /// The backend returned a non-2xx status code.
    #[error("Studio API error ({status}): {body}")]
    ApiError {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A 2xx response carried `{error}` instead of the expected payload.
    #[error("Studio reported an error: {0}")]
    Server(String),

    /// A local file could not be read for upload.
    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for StudioApiError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StudioApiError::Timeout
        } else {
            StudioApiError::Request(e)
        }
    }
}

impl StudioApiError {
    /// The `error` string from a JSON failure body, if any.
    pub fn server_message(&self) -> Option<String> {
        match self {
            StudioApiError::ApiError { body, .. } => serde_json::from_str::<ErrorBody>(body)
                .ok()
                .and_then(|b| b.error)
                .filter(|m| !m.trim().is_empty()),
            StudioApiError::Server(msg) => Some(msg.clone()),
            _ => None,
        }
    }

    /// Human-readable message for `operation` (e.g. "Save config").
    ///
    /// Message selection only; every error is handled the same way.
    pub fn user_message(&self, operation: &str) -> String {
        match self {
            StudioApiError::Request(e) if e.is_connect() || e.is_request() => {
                "Network error: cannot reach the server. Check your connection.".to_string()
            }
            StudioApiError::Timeout => {
                format!("{operation} failed: the request timed out. Please try again.")
            }
            StudioApiError::ApiError { status: 404, .. } => format!(
                "{operation} failed: {}",
                self.server_message()
                    .unwrap_or_else(|| "the video or its config could not be found.".to_string())
            ),
            StudioApiError::ApiError { status, .. } if *status >= 500 => format!(
                "{operation} failed: {}",
                self.server_message().unwrap_or_else(|| {
                    "server error. Please try again shortly.".to_string()
                })
            ),
            _ => format!(
                "{operation} failed: {}",
                self.server_message().unwrap_or_else(|| self.to_string())
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl StudioApi {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, StudioApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_client(client, config))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, config: &ClientConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            regenerate_timeout: config.regenerate_timeout,
            thumbnail_timeout: config.thumbnail_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Submit a generation task.
    ///
    /// Sends `POST /api/generate` and returns the server-assigned task id.
    pub async fn submit_generation(
        &self,
        request: &GenerateRequest,
    ) -> Result<SubmitResponse, StudioApiError> {
        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request.to_body())
            .send()
            .await?;

        let value: serde_json::Value = Self::parse_response(response).await?;
        if value.get("task_id").and_then(|v| v.as_str()).is_none() {
            let msg = value
                .get("error")
                .and_then(|v| v.as_str())
                .unwrap_or("response did not include a task id")
                .to_string();
            return Err(StudioApiError::Server(msg));
        }
        serde_json::from_value(value).map_err(|e| StudioApiError::Server(e.to_string()))
    }

    /// Fetch the status of a task via `GET /api/status/{task_id}`.
    pub async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot, StudioApiError> {
        let response = self
            .client
            .get(format!("{}/api/status/{}", self.base_url, task_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// List the movie quotes available to the `movie` sub-format.
    pub async fn movie_quotes(&self) -> Result<Vec<MovieQuote>, StudioApiError> {
        let response = self
            .client
            .get(format!("{}/api/movie-quotes", self.base_url))
            .send()
            .await?;

        let list: MovieQuoteList = Self::parse_response(response).await?;
        Ok(list.quotes)
    }

    /// Fetch the edit config of a video.
    pub async fn get_config(&self, video_id: &str) -> Result<ConfigEnvelope, StudioApiError> {
        let response = self
            .client
            .get(format!("{}/api/video/{}/config", self.base_url, video_id))
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Persist the edit config. The body carries only `global_settings`
    /// and `clips`.
    pub async fn save_config(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<(), StudioApiError> {
        let response = self
            .client
            .post(format!("{}/api/video/{}/config", self.base_url, video_id))
            .json(&config.save_body())
            .send()
            .await?;

        Self::check_status(response).await
    }

    /// Re-render the video from the given config.
    ///
    /// This is a single long request (minutes) bounded by the regenerate
    /// timeout instead of the ordinary request timeout.
    pub async fn regenerate(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<RegenerateResponse, StudioApiError> {
        let response = self
            .client
            .post(format!("{}/api/video/{}/regenerate", self.base_url, video_id))
            .timeout(self.regenerate_timeout)
            .json(&RegenerateBody { config })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Upload a replacement image or video for clip `index`.
    ///
    /// Sent as multipart with the file in the `media` field.
    pub async fn upload_media(
        &self,
        video_id: &str,
        index: usize,
        file: &Path,
    ) -> Result<UploadResponse, StudioApiError> {
        let part = Self::file_part(file, "media").await?;
        let form = reqwest::multipart::Form::new().part("media", part);

        let response = self
            .client
            .post(format!(
                "{}/api/video/{}/upload-media/{}",
                self.base_url, video_id, index
            ))
            .multipart(form)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Ask the backend to generate a new AI image for `target`.
    pub async fn generate_image(
        &self,
        video_id: &str,
        target: ImageTarget,
        prompt: &str,
    ) -> Result<ImageResponse, StudioApiError> {
        let response = self
            .client
            .post(format!(
                "{}/api/video/{}/{}",
                self.base_url,
                video_id,
                target.path_suffix()
            ))
            .json(&PromptBody { prompt })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Absolute download URL for an artifact of a finished task.
    pub fn download_url(&self, task_id: &str, kind: DownloadKind) -> String {
        format!("{}/api/download/{}/{}", self.base_url, task_id, kind.as_str())
    }

    /// Resolve a server-relative path (e.g. `/api/download/..`) against
    /// the base URL. Absolute URLs are returned unchanged.
    pub fn resolve(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") || path.is_empty() {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    // ---- private helpers ----

    /// Read a local file into a multipart part named after the file.
    pub(crate) async fn file_part(
        file: &Path,
        fallback_name: &str,
    ) -> Result<reqwest::multipart::Part, StudioApiError> {
        let bytes = tokio::fs::read(file)
            .await
            .map_err(|source| StudioApiError::File {
                path: file.display().to_string(),
                source,
            })?;
        let file_name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| fallback_name.to_string());
        Ok(reqwest::multipart::Part::bytes(bytes).file_name(file_name))
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`StudioApiError::ApiError`]
    /// containing the status and body text on failure.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, StudioApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StudioApiError::ApiError {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    pub(crate) async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StudioApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }

    /// Assert the response has a success status code, discarding the body.
    async fn check_status(response: reqwest::Response) -> Result<(), StudioApiError> {
        Self::ensure_success(response).await?;
        Ok(())
    }
}
