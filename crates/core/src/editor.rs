//! Editable video configuration ("edit config").
//!
//! Mirrors the JSON document served by `GET /api/video/{id}/config`.
//! Every struct keeps unrecognised keys in a flattened `extra` map so a
//! fetch → edit → save cycle never drops fields the client does not know.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Seconds;

/// Unknown keys carried through untouched.
pub type ExtraFields = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Text position
// ---------------------------------------------------------------------------

pub const POSITION_TOP: &str = "top";
pub const POSITION_CENTER: &str = "center";
pub const POSITION_BOTTOM: &str = "bottom";

/// All valid text positions.
pub const VALID_POSITIONS: &[&str] = &[POSITION_TOP, POSITION_CENTER, POSITION_BOTTOM];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextPosition {
    Top,
    #[default]
    Center,
    Bottom,
}

impl TextPosition {
    pub fn as_str(self) -> &'static str {
        match self {
            TextPosition::Top => POSITION_TOP,
            TextPosition::Center => POSITION_CENTER,
            TextPosition::Bottom => POSITION_BOTTOM,
        }
    }
}

impl std::str::FromStr for TextPosition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            POSITION_TOP => Ok(TextPosition::Top),
            POSITION_CENTER => Ok(TextPosition::Center),
            POSITION_BOTTOM => Ok(TextPosition::Bottom),
            other => Err(CoreError::Validation(format!(
                "Unknown text position: '{other}'. Valid positions: {}",
                VALID_POSITIONS.join(", ")
            ))),
        }
    }
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Global settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackgroundMusic {
    #[serde(default)]
    pub file: String,
    /// Fraction in `0.0..=1.0`.
    #[serde(default)]
    pub volume: f64,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntroSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub duration: Seconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_size: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<TextPosition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutroSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub duration: Seconds,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_image: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub background_music: BackgroundMusic,
    pub intro: IntroSettings,
    pub outro: OutroSettings,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// Clips
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AudioSettings {
    /// Voices in playback order; one entry per repeat.
    #[serde(default)]
    pub tts_voices: Vec<String>,
    #[serde(default)]
    pub repeat_count: u32,
    #[serde(default)]
    pub pause_after: Seconds,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextStyle {
    pub font_size: u32,
    #[serde(default)]
    pub position: TextPosition,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke_width: Option<u32>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageSettings {
    /// Empty when the clip has no image.
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub filter: Option<String>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    #[serde(default)]
    pub clip_id: String,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub clip_type: Option<String>,
    #[serde(default)]
    pub sentence_index: usize,
    pub sentence_text: String,
    #[serde(default)]
    pub translation: String,
    pub audio: AudioSettings,
    pub text: TextStyle,
    #[serde(default)]
    pub image: ImageSettings,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

// ---------------------------------------------------------------------------
// VideoConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    /// `null` until the first save.
    #[serde(default)]
    pub edited_at: Option<String>,
    pub global_settings: GlobalSettings,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

impl VideoConfig {
    pub fn clip(&self, index: usize) -> Result<&Clip, CoreError> {
        self.clips.get(index).ok_or_else(|| CoreError::NotFound {
            entity: "clip",
            id: index.to_string(),
        })
    }

    pub fn clip_mut(&mut self, index: usize) -> Result<&mut Clip, CoreError> {
        self.clips.get_mut(index).ok_or_else(|| CoreError::NotFound {
            entity: "clip",
            id: index.to_string(),
        })
    }

    /// Body for `POST /api/video/{id}/config`.
    pub fn save_body(&self) -> SaveConfigBody<'_> {
        SaveConfigBody {
            global_settings: &self.global_settings,
            clips: &self.clips,
        }
    }
}

/// `{global_settings, clips}` as sent by the save call.
#[derive(Debug, Serialize)]
pub struct SaveConfigBody<'a> {
    pub global_settings: &'a GlobalSettings,
    pub clips: &'a [Clip],
}

/// `{config}` as sent by the regenerate call.
#[derive(Debug, Serialize)]
pub struct RegenerateBody<'a> {
    pub config: &'a VideoConfig,
}
