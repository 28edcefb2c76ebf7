//! In-memory [`StudioBackend`] for unit tests.

use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use mecca_core::editor::VideoConfig;
use mecca_core::generation::GenerateRequest;
use mecca_core::task::{TaskSnapshot, TaskStatus};
use mecca_core::thumbnail::{download_path, ThumbnailForm, VariationType};

use crate::api::{
    ConfigEnvelope, ImageResponse, ImageTarget, RegenerateResponse, StudioApiError,
    SubmitResponse, UploadResponse,
};
use crate::backend::{StudioBackend, ThumbnailBackend};
use crate::thumbnail::{
    GeneratedThumbnails, HistoryEntry, RegeneratedThumbnail, SourceVideo, ThumbnailHistory,
};

#[derive(Default)]
pub struct FakeBackend {
    statuses: Mutex<VecDeque<Result<TaskSnapshot, StudioApiError>>>,
    default_status: Mutex<Option<TaskSnapshot>>,
    status_delay: Mutex<Option<Duration>>,
    status_calls: AtomicUsize,
    submits: Mutex<VecDeque<Result<SubmitResponse, StudioApiError>>>,
    pub submitted: Mutex<Vec<serde_json::Value>>,
    config: Mutex<Option<VideoConfig>>,
    pub saved: Mutex<Vec<serde_json::Value>>,
    fail_save: Mutex<Option<u16>>,
    pub regenerated: Mutex<Vec<VideoConfig>>,
    pub image_prompts: Mutex<Vec<(ImageTarget, String)>>,
}

impl FakeBackend {
    pub fn push_status(&self, status: Result<TaskSnapshot, StudioApiError>) {
        self.statuses.lock().unwrap().push_back(status);
    }

    pub fn set_default_status(&self, snapshot: TaskSnapshot) {
        *self.default_status.lock().unwrap() = Some(snapshot);
    }

    pub fn set_status_delay(&self, delay: Duration) {
        *self.status_delay.lock().unwrap() = Some(delay);
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn push_submit(&self, result: Result<SubmitResponse, StudioApiError>) {
        self.submits.lock().unwrap().push_back(result);
    }

    pub fn set_config(&self, config: VideoConfig) {
        *self.config.lock().unwrap() = Some(config);
    }

    pub fn fail_save_with(&self, status: u16) {
        *self.fail_save.lock().unwrap() = Some(status);
    }
}

/// Two-clip config: 5s intro/outro total, clips of 11s and 7.5s.
pub fn sample_config() -> VideoConfig {
    serde_json::from_value(serde_json::json!({
        "version": "1.0",
        "video_id": "t1",
        "global_settings": {
            "background_music": {"file": "background_music.mp3", "volume": 0.15, "enabled": true},
            "intro": {"enabled": true, "duration": 3},
            "outro": {"enabled": true, "duration": 2}
        },
        "clips": [
            {
                "clip_id": "sentence_0",
                "sentence_index": 0,
                "sentence_text": "How are you?",
                "translation": "잘 지내?",
                "audio": {"tts_voices": ["alloy", "nova", "shimmer"], "pause_after": 2.0, "repeat_count": 3},
                "text": {"font_size": 58, "position": "center"},
                "image": {"path": "resources/images/a.jpg"}
            },
            {
                "clip_id": "sentence_1",
                "sentence_index": 1,
                "sentence_text": "Nice to meet you.",
                "translation": "만나서 반가워.",
                "audio": {"tts_voices": ["alloy", "nova", "shimmer"], "pause_after": 1.5, "repeat_count": 2},
                "text": {"font_size": 52, "position": "bottom"},
                "image": {"path": ""}
            }
        ]
    }))
    .unwrap()
}

pub fn submit_ok(task_id: &str) -> SubmitResponse {
    SubmitResponse {
        task_id: task_id.to_string(),
        status: Some("processing".into()),
        message: None,
        sentences: Vec::new(),
    }
}

#[async_trait]
impl StudioBackend for FakeBackend {
    async fn submit_generation(
        &self,
        request: &GenerateRequest,
    ) -> Result<SubmitResponse, StudioApiError> {
        self.submitted.lock().unwrap().push(request.to_body());
        let next = self.submits.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok(submit_ok("t1")))
    }

    async fn task_status(&self, _task_id: &str) -> Result<TaskSnapshot, StudioApiError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.status_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.statuses.lock().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self
                .default_status
                .lock()
                .unwrap()
                .clone()
                .unwrap_or_else(|| TaskSnapshot {
                    status: TaskStatus::Pending,
                    ..Default::default()
                })),
        }
    }

    async fn get_config(&self, video_id: &str) -> Result<ConfigEnvelope, StudioApiError> {
        match self.config.lock().unwrap().clone() {
            Some(config) => Ok(ConfigEnvelope {
                config,
                video_exists: true,
                video_path: Some(format!("/output/videos/{video_id}.mp4")),
            }),
            None => Err(StudioApiError::ApiError {
                status: 404,
                body: r#"{"error":"config not found"}"#.into(),
            }),
        }
    }

    async fn save_config(
        &self,
        _video_id: &str,
        config: &VideoConfig,
    ) -> Result<(), StudioApiError> {
        if let Some(status) = *self.fail_save.lock().unwrap() {
            return Err(StudioApiError::ApiError {
                status,
                body: String::new(),
            });
        }
        let body = serde_json::to_value(config.save_body()).unwrap();
        self.saved.lock().unwrap().push(body);
        Ok(())
    }

    async fn regenerate(
        &self,
        video_id: &str,
        config: &VideoConfig,
    ) -> Result<RegenerateResponse, StudioApiError> {
        self.regenerated.lock().unwrap().push(config.clone());
        Ok(RegenerateResponse {
            video_path: format!("/output/videos/{video_id}_edited.mp4"),
            processing_time: Some(42.5),
        })
    }

    async fn upload_media(
        &self,
        _video_id: &str,
        index: usize,
        file: &Path,
    ) -> Result<UploadResponse, StudioApiError> {
        Ok(UploadResponse {
            file_path: format!(
                "uploads/{index}_{}",
                file.file_name().unwrap().to_string_lossy()
            ),
            file_type: "image".into(),
        })
    }

    async fn generate_image(
        &self,
        _video_id: &str,
        target: ImageTarget,
        prompt: &str,
    ) -> Result<ImageResponse, StudioApiError> {
        self.image_prompts
            .lock()
            .unwrap()
            .push((target, prompt.to_string()));
        let image_path = match target {
            ImageTarget::Clip(i) => format!("resources/images/clip_{i}.png"),
            ImageTarget::Intro => "resources/images/intro.png".to_string(),
            ImageTarget::Outro => "resources/images/outro.png".to_string(),
        };
        Ok(ImageResponse {
            image_path,
            message: "ok".into(),
        })
    }
}

/// In-memory thumbnail studio. Generation yields three candidates; every
/// call numbers versions from one shared counter.
#[derive(Default)]
pub struct FakeThumbnails {
    last_version: AtomicU32,
    pub forms: Mutex<Vec<ThumbnailForm>>,
    pub regenerations: Mutex<Vec<(String, u32, VariationType)>>,
}

impl FakeThumbnails {
    fn next_version(&self) -> u32 {
        self.last_version.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl ThumbnailBackend for FakeThumbnails {
    async fn analyze_video_url(&self, _url: &str) -> Result<SourceVideo, StudioApiError> {
        Ok(SourceVideo {
            title: "Small talk at the office".into(),
            duration_string: "3:42".into(),
            channel: "Daily English Mecca".into(),
            thumbnail_url: String::new(),
        })
    }

    async fn generate_thumbnails(
        &self,
        form: &ThumbnailForm,
        _reference_image: Option<&Path>,
    ) -> Result<GeneratedThumbnails, StudioApiError> {
        self.forms.lock().unwrap().push(form.clone());
        let session_id = form.session_id.clone().unwrap_or_else(|| "s1".to_string());
        let versions: Vec<u32> = (0..3).map(|_| self.next_version()).collect();
        Ok(GeneratedThumbnails {
            thumbnail_urls: versions.iter().map(|&v| download_path(&session_id, v)).collect(),
            count: versions.len(),
            versions,
            session_id,
            version: None,
            thumbnail_url: None,
        })
    }

    async fn regenerate_thumbnail(
        &self,
        session_id: &str,
        current_version: u32,
        variation: VariationType,
    ) -> Result<RegeneratedThumbnail, StudioApiError> {
        self.regenerations
            .lock()
            .unwrap()
            .push((session_id.to_string(), current_version, variation));
        let version = self.next_version();
        Ok(RegeneratedThumbnail {
            session_id: session_id.to_string(),
            version,
            thumbnail_url: download_path(session_id, version),
        })
    }

    async fn thumbnail_history(
        &self,
        session_id: &str,
    ) -> Result<ThumbnailHistory, StudioApiError> {
        Ok(ThumbnailHistory {
            session_id: session_id.to_string(),
            thumbnails: (1..=3)
                .map(|version| HistoryEntry {
                    version,
                    url: download_path(session_id, version),
                    variation_type: "original".into(),
                    created_at: String::new(),
                })
                .collect(),
        })
    }
}
