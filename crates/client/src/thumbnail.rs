//! Thumbnail studio endpoints under `/thumbnail-studio/api`.
//!
//! Every reply carries a `success` flag; `success: false` with a 2xx
//! status is surfaced as [`StudioApiError::Server`].

use std::path::Path;

use mecca_core::thumbnail::{download_path, ChannelProfile, ThumbnailForm, VariationType};
use serde::{Deserialize, Serialize};

use crate::api::{StudioApi, StudioApiError};

const PREFIX: &str = "/thumbnail-studio/api";

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Metadata of a source video returned by `analyze-url`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceVideo {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub duration_string: String,
    #[serde(default)]
    pub channel: String,
    #[serde(default)]
    pub thumbnail_url: String,
}

/// Channel details returned by `analyze-channel`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ChannelInfo {
    #[serde(default)]
    pub channel_name: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default)]
    pub icon_url: Option<String>,
    /// Server-side path of the downloaded icon.
    #[serde(default)]
    pub icon_path: Option<String>,
    #[serde(default)]
    pub subscriber_count: Option<u64>,
}

/// One numbered version inside a thumbnail session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThumbnailVersion {
    pub version: u32,
    pub url: String,
}

/// Reply of `generate`.
///
/// Multi-candidate replies carry `versions`/`thumbnail_urls`; older
/// single-image replies carry `version`/`thumbnail_url`.
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedThumbnails {
    pub session_id: String,
    #[serde(default)]
    pub versions: Vec<u32>,
    #[serde(default)]
    pub thumbnail_urls: Vec<String>,
    #[serde(default)]
    pub count: usize,
    #[serde(default)]
    pub version: Option<u32>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

impl GeneratedThumbnails {
    /// Versions paired with their image URLs, in server order.
    pub fn candidates(&self) -> Vec<ThumbnailVersion> {
        if self.versions.is_empty() {
            return self
                .version
                .map(|version| ThumbnailVersion {
                    version,
                    url: self
                        .thumbnail_url
                        .clone()
                        .unwrap_or_else(|| download_path(&self.session_id, version)),
                })
                .into_iter()
                .collect();
        }
        self.versions
            .iter()
            .enumerate()
            .map(|(i, &version)| ThumbnailVersion {
                version,
                url: self
                    .thumbnail_urls
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| download_path(&self.session_id, version)),
            })
            .collect()
    }
}

/// Reply of `regenerate`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegeneratedThumbnail {
    pub session_id: String,
    pub version: u32,
    pub thumbnail_url: String,
}

/// Reply of `history/{session_id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThumbnailHistory {
    pub session_id: String,
    #[serde(default)]
    pub thumbnails: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HistoryEntry {
    pub version: u32,
    pub url: String,
    #[serde(default = "original_variation")]
    pub variation_type: String,
    #[serde(default)]
    pub created_at: String,
}

fn original_variation() -> String {
    "original".to_string()
}

/// Reply of the profile save call.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileSaved {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub profile_path: String,
}

#[derive(Deserialize)]
struct AnalyzeUrlReply {
    metadata: SourceVideo,
}

#[derive(Deserialize)]
struct AnalyzeChannelReply {
    channel_info: ChannelInfo,
}

#[derive(Deserialize)]
struct ProfileReply {
    profile: ChannelProfile,
}

#[derive(Serialize)]
struct UrlBody<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct ChannelUrlBody<'a> {
    channel_url: &'a str,
}

#[derive(Serialize)]
struct RegenerateThumbnailBody<'a> {
    session_id: &'a str,
    current_version: u32,
    variation_type: VariationType,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

impl StudioApi {
    fn thumbnail_url(&self, path: &str) -> String {
        format!("{}{PREFIX}/{path}", self.base_url)
    }

    /// Read title and duration of a source video.
    pub async fn analyze_video_url(&self, url: &str) -> Result<SourceVideo, StudioApiError> {
        let response = self
            .client
            .post(self.thumbnail_url("analyze-url"))
            .json(&UrlBody { url: url.trim() })
            .send()
            .await?;

        let reply: AnalyzeUrlReply = parse_envelope(response).await?;
        Ok(reply.metadata)
    }

    /// Read name and icon of a channel.
    pub async fn analyze_channel(&self, channel_url: &str) -> Result<ChannelInfo, StudioApiError> {
        let response = self
            .client
            .post(self.thumbnail_url("analyze-channel"))
            .json(&ChannelUrlBody {
                channel_url: channel_url.trim(),
            })
            .send()
            .await?;

        let reply: AnalyzeChannelReply = parse_envelope(response).await?;
        Ok(reply.channel_info)
    }

    /// Render thumbnails from `form`.
    ///
    /// Sent as multipart; `reference_image` goes in the `reference_image`
    /// file field.
    pub async fn generate_thumbnails(
        &self,
        form: &ThumbnailForm,
        reference_image: Option<&Path>,
    ) -> Result<GeneratedThumbnails, StudioApiError> {
        let mut multipart = reqwest::multipart::Form::new();
        for (name, value) in form.form_fields() {
            multipart = multipart.text(name, value);
        }
        if let Some(path) = reference_image {
            let part = Self::file_part(path, "reference").await?;
            multipart = multipart.part("reference_image", part);
        }

        let response = self
            .client
            .post(self.thumbnail_url("generate"))
            .timeout(self.thumbnail_timeout)
            .multipart(multipart)
            .send()
            .await?;

        parse_envelope(response).await
    }

    /// Derive a new version from `current_version`.
    pub async fn regenerate_thumbnail(
        &self,
        session_id: &str,
        current_version: u32,
        variation: VariationType,
    ) -> Result<RegeneratedThumbnail, StudioApiError> {
        let response = self
            .client
            .post(self.thumbnail_url("regenerate"))
            .timeout(self.thumbnail_timeout)
            .json(&RegenerateThumbnailBody {
                session_id,
                current_version,
                variation_type: variation,
            })
            .send()
            .await?;

        parse_envelope(response).await
    }

    pub async fn thumbnail_history(
        &self,
        session_id: &str,
    ) -> Result<ThumbnailHistory, StudioApiError> {
        let response = self
            .client
            .get(self.thumbnail_url(&format!("history/{session_id}")))
            .send()
            .await?;

        parse_envelope(response).await
    }

    /// Saved channel profile. The backend answers with its defaults when
    /// none has been saved.
    pub async fn channel_profile(&self) -> Result<ChannelProfile, StudioApiError> {
        let response = self
            .client
            .get(self.thumbnail_url("channel-profile"))
            .send()
            .await?;

        let reply: ProfileReply = parse_envelope(response).await?;
        Ok(reply.profile)
    }

    pub async fn save_channel_profile(
        &self,
        profile: &ChannelProfile,
    ) -> Result<ProfileSaved, StudioApiError> {
        let response = self
            .client
            .post(self.thumbnail_url("channel-profile"))
            .json(&profile.save_body())
            .send()
            .await?;

        parse_envelope(response).await
    }
}

async fn parse_envelope<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, StudioApiError> {
    let value: serde_json::Value = StudioApi::parse_response(response).await?;
    if value.get("success").and_then(|v| v.as_bool()) == Some(false) {
        let msg = value
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("the thumbnail studio rejected the request")
            .to_string();
        return Err(StudioApiError::Server(msg));
    }
    serde_json::from_value(value).map_err(|e| StudioApiError::Server(e.to_string()))
}
