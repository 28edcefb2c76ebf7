//! Backend abstractions used by the sessions and the poller.
//!
//! [`StudioApi`] is the production implementation; tests substitute an
//! in-memory fake.

use std::path::Path;

use async_trait::async_trait;
use mecca_core::editor::VideoConfig;
use mecca_core::generation::GenerateRequest;
use mecca_core::task::TaskSnapshot;
use mecca_core::thumbnail::{ThumbnailForm, VariationType};

use crate::api::{
    ConfigEnvelope, ImageResponse, ImageTarget, RegenerateResponse, StudioApi, StudioApiError,
    SubmitResponse, UploadResponse,
};
use crate::thumbnail::{GeneratedThumbnails, RegeneratedThumbnail, SourceVideo, ThumbnailHistory};

#[async_trait]
pub trait StudioBackend: Send + Sync {
    async fn submit_generation(
        &self,
        request: &GenerateRequest,
    ) -> Result<SubmitResponse, StudioApiError>;

    async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot, StudioApiError>;

    async fn get_config(&self, video_id: &str) -> Result<ConfigEnvelope, StudioApiError>;

    async fn save_config(&self, video_id: &str, config: &VideoConfig)
        -> Result<(), StudioApiError>;

    async fn regenerate(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<RegenerateResponse, StudioApiError>;

    async fn upload_media(
        &self,
        video_id: &str,
        index: usize,
        file: &Path,
    ) -> Result<UploadResponse, StudioApiError>;

    async fn generate_image(
        &self,
        video_id: &str,
        target: ImageTarget,
        prompt: &str,
    ) -> Result<ImageResponse, StudioApiError>;
}

#[async_trait]
impl StudioBackend for StudioApi {
    async fn submit_generation(
        &self,
        request: &GenerateRequest,
    ) -> Result<SubmitResponse, StudioApiError> {
        StudioApi::submit_generation(self, request).await
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskSnapshot, StudioApiError> {
        StudioApi::task_status(self, task_id).await
    }

    async fn get_config(&self, video_id: &str) -> Result<ConfigEnvelope, StudioApiError> {
        StudioApi::get_config(self, video_id).await
    }

    async fn save_config(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<(), StudioApiError> {
        StudioApi::save_config(self, video_id, config).await
    }

    async fn regenerate(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<RegenerateResponse, StudioApiError> {
        StudioApi::regenerate(self, video_id, config).await
    }

    async fn upload_media(
        &self,
        video_id: &str,
        index: usize,
        file: &Path,
    ) -> Result<UploadResponse, StudioApiError> {
        StudioApi::upload_media(self, video_id, index, file).await
    }

    async fn generate_image(
        &self,
        video_id: &str,
        target: ImageTarget,
        prompt: &str,
    ) -> Result<ImageResponse, StudioApiError> {
        StudioApi::generate_image(self, video_id, target, prompt).await
    }
}

/// Thumbnail studio calls used by the thumbnail session.
#[async_trait]
pub trait ThumbnailBackend: Send + Sync {
    async fn analyze_video_url(&self, url: &str) -> Result<SourceVideo, StudioApiError>;

    async fn generate_thumbnails(
        &self,
        form: &ThumbnailForm,
        reference_image: Option<&Path>,
    ) -> Result<GeneratedThumbnails, StudioApiError>;

    async fn regenerate_thumbnail(
        &self,
        session_id: &str,
        current_version: u32,
        variation: VariationType,
    ) -> Result<RegeneratedThumbnail, StudioApiError>;

    async fn thumbnail_history(&self, session_id: &str)
        -> Result<ThumbnailHistory, StudioApiError>;
}

#[async_trait]
impl ThumbnailBackend for StudioApi {
    async fn analyze_video_url(&self, url: &str) -> Result<SourceVideo, StudioApiError> {
        StudioApi::analyze_video_url(self, url).await
    }

    async fn generate_thumbnails(
        &self,
        form: &ThumbnailForm,
        reference_image: Option<&Path>,
    ) -> Result<GeneratedThumbnails, StudioApiError> {
        StudioApi::generate_thumbnails(self, form, reference_image).await
    }

    async fn regenerate_thumbnail(
        &self,
        session_id: &str,
        current_version: u32,
        variation: VariationType,
    ) -> Result<RegeneratedThumbnail, StudioApiError> {
        StudioApi::regenerate_thumbnail(self, session_id, current_version, variation).await
    }

    async fn thumbnail_history(
        &self,
        session_id: &str,
    ) -> Result<ThumbnailHistory, StudioApiError> {
        StudioApi::thumbnail_history(self, session_id).await
    }
}
