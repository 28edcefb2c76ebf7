//! Editor page controller for one generated video.
//!
//! Holds the loaded [`VideoConfig`] as the single source of truth. Every
//! control edit goes through the binding table; an invalid value leaves
//! the config untouched and reports the value the control should show
//! again.

use std::path::Path;
use std::sync::Arc;

use mecca_core::editor::{Clip, VideoConfig};
use mecca_core::error::CoreError;
use mecca_core::timeline::{build_timeline, effective_duration, Timeline};
use mecca_core::types::{Seconds, VideoId};
use serde::Serialize;

use crate::api::ImageTarget;
use crate::backend::StudioBackend;
use crate::bindings::{lookup, UiEvent};

use super::SessionError;

/// Result of one control edit.
#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    /// The value was stored; `display` is the formatted current value.
    Applied { display: String },
    /// The value was invalid; the control should show `revert_to` again.
    Rejected { message: String, revert_to: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegenerateOutcome {
    /// Path returned by the backend.
    pub video_path: String,
    /// `video_path` with a cache-busting query for the preview player.
    pub preview_url: String,
    pub processing_time: Option<f64>,
}

/// One row of the clip list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClipSummary {
    pub index: usize,
    pub label: String,
    pub text: String,
    pub duration: Seconds,
    pub duration_label: String,
}

/// What a dispatched [`UiEvent`] did.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorUpdate {
    Selected(usize),
    Edited(EditOutcome),
    Saved,
    Regenerated(RegenerateOutcome),
    ImageGenerated { target: ImageTarget, image_path: String },
    Uploaded { index: usize, file_path: String },
    Left,
}

pub struct EditorSession {
    backend: Arc<dyn StudioBackend>,
    video_id: VideoId,
    config: Option<VideoConfig>,
    video_path: Option<String>,
    video_exists: bool,
    selected: Option<usize>,
    dirty: bool,
}

impl EditorSession {
    pub fn new(backend: Arc<dyn StudioBackend>, video_id: impl Into<VideoId>) -> Self {
        Self {
            backend,
            video_id: video_id.into(),
            config: None,
            video_path: None,
            video_exists: false,
            selected: None,
            dirty: false,
        }
    }

    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Preview path of the current video, if the backend has one.
    pub fn video_path(&self) -> Option<&str> {
        self.video_path.as_deref()
    }

    pub fn video_exists(&self) -> bool {
        self.video_exists
    }

    pub fn selected_clip(&self) -> Option<usize> {
        self.selected
    }

    /// Whether there are edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> Result<&VideoConfig, SessionError> {
        self.config.as_ref().ok_or(SessionError::NoConfig)
    }

    fn config_mut(&mut self) -> Result<&mut VideoConfig, SessionError> {
        self.config.as_mut().ok_or(SessionError::NoConfig)
    }

    // -----------------------------------------------------------------------
    // Load / select
    // -----------------------------------------------------------------------

    /// Fetch the config and preview path. Selects the first clip.
    pub async fn load(&mut self) -> Result<&VideoConfig, SessionError> {
        let envelope = self.backend.get_config(&self.video_id).await?;

        tracing::info!(
            video_id = %self.video_id,
            clips = envelope.config.clips.len(),
            video_exists = envelope.video_exists,
            "Editor config loaded",
        );

        self.selected = if envelope.config.clips.is_empty() {
            None
        } else {
            Some(0)
        };
        self.video_exists = envelope.video_exists;
        self.video_path = envelope.video_path;
        self.dirty = false;
        Ok(self.config.insert(envelope.config))
    }

    pub fn select_clip(&mut self, index: usize) -> Result<&Clip, SessionError> {
        let config = self.config.as_ref().ok_or(SessionError::NoConfig)?;
        let clip = config.clip(index)?;
        self.selected = Some(index);
        Ok(clip)
    }

    pub fn clip_summaries(&self) -> Result<Vec<ClipSummary>, SessionError> {
        let config = self.config()?;
        Ok(config
            .clips
            .iter()
            .enumerate()
            .map(|(index, clip)| {
                let duration = effective_duration(clip);
                ClipSummary {
                    index,
                    label: format!("Sentence {}", index + 1),
                    text: clip.sentence_text.clone(),
                    duration,
                    duration_label: format!("~{:.0}s", duration.round()),
                }
            })
            .collect())
    }

    pub fn timeline(&self) -> Result<Timeline, SessionError> {
        Ok(build_timeline(self.config()?))
    }

    // -----------------------------------------------------------------------
    // Edits
    // -----------------------------------------------------------------------

    /// Apply a raw control value through the binding table.
    pub fn apply_edit(&mut self, control_id: &str, raw: &str) -> Result<EditOutcome, SessionError> {
        let binding = lookup(control_id)?;
        let clip = if binding.requires_clip {
            Some(self.selected.ok_or(SessionError::NoClipSelected)?)
        } else {
            None
        };

        let config = self.config_mut()?;
        match binding.field.apply(config, clip, raw) {
            Ok(()) => {
                let shown = binding.field.display(config, clip)?;
                self.dirty = true;
                tracing::debug!(video_id = %self.video_id, control = control_id, value = %shown, "Edit applied");
                Ok(EditOutcome::Applied { display: shown })
            }
            Err(e) => {
                let revert_to = binding.field.display(config, clip)?;
                let message = match e {
                    CoreError::Validation(message) => message,
                    other => other.to_string(),
                };
                tracing::debug!(video_id = %self.video_id, control = control_id, error = %message, "Edit rejected");
                Ok(EditOutcome::Rejected { message, revert_to })
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backend operations
    // -----------------------------------------------------------------------

    /// Persist the config. Clears the unsaved-changes flag on success.
    pub async fn save(&mut self) -> Result<(), SessionError> {
        let config = self.config()?;
        self.backend.save_config(&self.video_id, config).await?;
        self.dirty = false;
        tracing::info!(video_id = %self.video_id, "Editor config saved");
        Ok(())
    }

    /// Re-render the video from the current config.
    ///
    /// One long request; there is no polling. Unsaved edits are sent but
    /// remain unsaved.
    pub async fn regenerate(&mut self) -> Result<RegenerateOutcome, SessionError> {
        let config = self.config()?;
        tracing::info!(video_id = %self.video_id, "Regenerating video");
        let response = self.backend.regenerate(&self.video_id, config).await?;

        let preview_url = format!(
            "{}?t={}",
            response.video_path,
            chrono::Utc::now().timestamp_millis()
        );
        tracing::info!(
            video_id = %self.video_id,
            video_path = %response.video_path,
            processing_time = ?response.processing_time,
            "Video regenerated",
        );

        self.video_path = Some(response.video_path.clone());
        self.video_exists = true;
        Ok(RegenerateOutcome {
            video_path: response.video_path,
            preview_url,
            processing_time: response.processing_time,
        })
    }

    /// Generate an image and point the clip, intro or outro at it.
    pub async fn generate_image(
        &mut self,
        target: ImageTarget,
        prompt: &str,
    ) -> Result<String, SessionError> {
        let config = self.config()?;
        if let ImageTarget::Clip(index) = target {
            config.clip(index)?;
        }

        let response = self
            .backend
            .generate_image(&self.video_id, target, prompt.trim())
            .await?;

        let config = self.config_mut()?;
        match target {
            ImageTarget::Clip(index) => config.clip_mut(index)?.image.path = response.image_path.clone(),
            ImageTarget::Intro => {
                config.global_settings.intro.custom_image = Some(response.image_path.clone())
            }
            ImageTarget::Outro => {
                config.global_settings.outro.custom_image = Some(response.image_path.clone())
            }
        }
        self.dirty = true;
        tracing::info!(video_id = %self.video_id, ?target, image_path = %response.image_path, "Image generated");
        Ok(response.image_path)
    }

    /// Upload a replacement image or video for one clip.
    pub async fn upload_media(&mut self, index: usize, file: &Path) -> Result<String, SessionError> {
        self.config()?.clip(index)?;

        let response = self.backend.upload_media(&self.video_id, index, file).await?;

        self.config_mut()?.clip_mut(index)?.image.path = response.file_path.clone();
        self.dirty = true;
        tracing::info!(
            video_id = %self.video_id,
            index,
            file_type = %response.file_type,
            file_path = %response.file_path,
            "Media uploaded",
        );
        Ok(response.file_path)
    }

    /// Leave the editor. Refused while there are unsaved changes unless
    /// `force` is set.
    pub fn leave(&mut self, force: bool) -> Result<(), SessionError> {
        if self.dirty && !force {
            return Err(SessionError::UnsavedChanges);
        }
        if self.dirty {
            tracing::warn!(video_id = %self.video_id, "Leaving editor with unsaved changes");
        }
        self.config = None;
        self.selected = None;
        self.dirty = false;
        Ok(())
    }

    /// Route one UI event to the matching operation.
    pub async fn dispatch(&mut self, event: UiEvent) -> Result<EditorUpdate, SessionError> {
        match event {
            UiEvent::SelectClip(index) => {
                self.select_clip(index)?;
                Ok(EditorUpdate::Selected(index))
            }
            UiEvent::Edit { control_id, value } => {
                Ok(EditorUpdate::Edited(self.apply_edit(&control_id, &value)?))
            }
            UiEvent::Save => {
                self.save().await?;
                Ok(EditorUpdate::Saved)
            }
            UiEvent::Regenerate => Ok(EditorUpdate::Regenerated(self.regenerate().await?)),
            UiEvent::GenerateImage { target, prompt } => {
                let image_path = self.generate_image(target, &prompt).await?;
                Ok(EditorUpdate::ImageGenerated { target, image_path })
            }
            UiEvent::UploadMedia { index, path } => {
                let file_path = self.upload_media(index, &path).await?;
                Ok(EditorUpdate::Uploaded { index, file_path })
            }
            UiEvent::Cancel { force } => {
                self.leave(force)?;
                Ok(EditorUpdate::Left)
            }
        }
    }
}
