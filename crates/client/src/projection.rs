//! View models derived from task snapshots.
//!
//! Property access only: a missing result field becomes an empty string,
//! never an error.

use mecca_core::task::{TaskResult, TaskSnapshot};
use serde::Serialize;

/// Step label shown before the first status response.
pub const STARTING_STEP: &str = "Starting...";

/// Progress panel: bar, current step and the log list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressView {
    pub percent: u8,
    pub current_step: String,
    /// Full log list as last reported by the server.
    pub logs: Vec<String>,
}

impl Default for ProgressView {
    fn default() -> Self {
        Self {
            percent: 0,
            current_step: STARTING_STEP.to_string(),
            logs: Vec::new(),
        }
    }
}

impl ProgressView {
    /// Apply a status response.
    ///
    /// The server sends the complete log list each time; an empty list
    /// leaves the panel untouched.
    pub fn update(&mut self, snapshot: &TaskSnapshot) {
        self.percent = snapshot.percent();
        self.current_step = snapshot.current_step.clone();
        if !snapshot.logs.is_empty() {
            self.logs = snapshot.logs.clone();
        }
    }

    /// Log lines not yet in `previous_len`, for incremental rendering.
    pub fn new_logs(&self, previous_len: usize) -> &[String] {
        self.logs.get(previous_len..).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DownloadLink {
    pub href: String,
    pub filename: String,
}

/// Result panel: player source, metadata and download links.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResultProjection {
    pub task_id: String,
    pub video_src: String,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    /// Tags joined for display.
    pub tags_display: String,
    pub video_download: DownloadLink,
    pub metadata_download: DownloadLink,
}

impl ResultProjection {
    pub fn from_result(task_id: &str, result: Option<&TaskResult>) -> Self {
        let Some(result) = result else {
            return Self {
                task_id: task_id.to_string(),
                metadata_download: DownloadLink {
                    href: String::new(),
                    filename: metadata_filename(task_id),
                },
                ..Default::default()
            };
        };

        let video_path = result.video_path.clone().unwrap_or_default();
        let metadata = result.metadata.clone().unwrap_or_default();

        Self {
            task_id: task_id.to_string(),
            video_src: video_path.clone(),
            title: metadata.title,
            description: metadata.description,
            tags_display: metadata.tags.join(", "),
            tags: metadata.tags,
            video_download: DownloadLink {
                href: video_path,
                filename: result.video_filename.clone().unwrap_or_default(),
            },
            metadata_download: DownloadLink {
                href: result.metadata_path.clone().unwrap_or_default(),
                filename: metadata_filename(task_id),
            },
        }
    }

    /// Link to the editor page for this video.
    pub fn editor_link(&self) -> String {
        editor_link(&self.task_id)
    }
}

/// Download filename for the metadata JSON of a task.
pub fn metadata_filename(task_id: &str) -> String {
    format!("metadata_{task_id}.json")
}

/// Editor page path for a video id.
pub fn editor_link(video_id: &str) -> String {
    format!("/editor?video_id={video_id}")
}
