//! Thumbnail studio: generation form, styles, variations and the channel
//! profile.
//!
//! A thumbnail session groups numbered versions of one design. The first
//! generation can yield several candidates (one per frame pulled from a
//! source video); each regeneration appends one version derived from an
//! existing one.

use serde::{Deserialize, Serialize};

use crate::editor::ExtraFields;
use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const STYLE_FIRE_ENGLISH: &str = "fire_english";
pub const STYLE_MINIMALIST: &str = "minimalist";
pub const STYLE_BOLD_BRIGHT: &str = "bold_bright";
pub const STYLE_PROFESSIONAL: &str = "professional";

/// All valid thumbnail styles.
pub const VALID_STYLES: &[&str] = &[
    STYLE_FIRE_ENGLISH,
    STYLE_MINIMALIST,
    STYLE_BOLD_BRIGHT,
    STYLE_PROFESSIONAL,
];

pub const DEFAULT_STYLE: &str = STYLE_FIRE_ENGLISH;

/// Horizontal placement of the main text.
pub const VALID_TEXT_POSITIONS: &[&str] = &["left", "center", "right"];

pub const DEFAULT_TEXT_POSITION: &str = "center";

pub const DEFAULT_CHANNEL_NAME: &str = "Daily English Mecca";
pub const DEFAULT_BRAND_PRIMARY: &str = "#FF5733";
pub const DEFAULT_BRAND_SECONDARY: &str = "#3357FF";
pub const DEFAULT_BRAND_ACCENT: &str = "#FFD700";

/// Characters of a source video title carried into the main text.
pub const MAIN_TEXT_PREFILL_CHARS: usize = 30;

/// Version a regeneration starts from when none has been chosen yet.
pub const FIRST_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Variation
// ---------------------------------------------------------------------------

/// How a regenerated version differs from the one it is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariationType {
    /// New palette, same layout.
    Color,
    /// New layout, same palette.
    Layout,
    /// Fresh design from the same text.
    Complete,
}

impl VariationType {
    pub fn as_str(self) -> &'static str {
        match self {
            VariationType::Color => "color",
            VariationType::Layout => "layout",
            VariationType::Complete => "complete",
        }
    }
}

impl std::fmt::Display for VariationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for VariationType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "color" => Ok(VariationType::Color),
            "layout" => Ok(VariationType::Layout),
            "complete" => Ok(VariationType::Complete),
            other => Err(CoreError::Validation(format!(
                "Unknown variation type: '{other}'. Valid types: color, layout, complete"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Brand colors and channel profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrandColors {
    pub primary: String,
    pub secondary: String,
    pub accent: String,
}

impl Default for BrandColors {
    fn default() -> Self {
        Self {
            primary: DEFAULT_BRAND_PRIMARY.to_string(),
            secondary: DEFAULT_BRAND_SECONDARY.to_string(),
            accent: DEFAULT_BRAND_ACCENT.to_string(),
        }
    }
}

impl BrandColors {
    pub fn validate(&self) -> Result<(), CoreError> {
        for (name, value) in [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("accent", &self.accent),
        ] {
            validate_hex_color(name, value)?;
        }
        Ok(())
    }
}

/// `#RRGGBB`, as produced by a color picker.
pub fn validate_hex_color(name: &str, value: &str) -> Result<(), CoreError> {
    let digits = value.strip_prefix('#').unwrap_or_default();
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(CoreError::Validation(format!(
            "Brand color '{name}' must look like #RRGGBB (got '{value}')"
        )));
    }
    Ok(())
}

/// Saved channel branding applied to new thumbnails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelProfile {
    #[serde(default = "default_channel_name")]
    pub channel_name: String,
    #[serde(default)]
    pub logo_path: Option<String>,
    #[serde(default)]
    pub brand_colors: BrandColors,
    #[serde(default = "default_use_kelly")]
    pub use_kelly: bool,
    #[serde(flatten)]
    pub extra: ExtraFields,
}

fn default_channel_name() -> String {
    DEFAULT_CHANNEL_NAME.to_string()
}

fn default_use_kelly() -> bool {
    true
}

impl Default for ChannelProfile {
    fn default() -> Self {
        Self {
            channel_name: default_channel_name(),
            logo_path: None,
            brand_colors: BrandColors::default(),
            use_kelly: default_use_kelly(),
            extra: ExtraFields::new(),
        }
    }
}

/// Body of the profile save call.
#[derive(Debug, Serialize)]
pub struct SaveProfileBody<'a> {
    pub channel_name: &'a str,
    pub brand_colors: &'a BrandColors,
    pub use_kelly: bool,
}

impl ChannelProfile {
    pub fn save_body(&self) -> SaveProfileBody<'_> {
        SaveProfileBody {
            channel_name: &self.channel_name,
            brand_colors: &self.brand_colors,
            use_kelly: self.use_kelly,
        }
    }
}

// ---------------------------------------------------------------------------
// Generation form
// ---------------------------------------------------------------------------

/// Input of one thumbnail generation.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailForm {
    pub main_text: String,
    pub subtitle_text: String,
    pub style: String,
    pub text_position: String,
    /// Source video; the backend pulls candidate backgrounds from it.
    pub youtube_url: String,
    /// Channel whose icon is stamped on the thumbnail.
    pub channel_url: String,
    /// Sentence-count badge, omitted when `None`.
    pub sentence_count: Option<u32>,
    /// Duration badge such as `3:42`, omitted when `None`.
    pub video_duration: Option<String>,
    pub brand_colors: BrandColors,
    pub use_kelly: bool,
    /// Existing session to add versions to (text edits keep backgrounds).
    pub session_id: Option<String>,
}

impl Default for ThumbnailForm {
    fn default() -> Self {
        Self {
            main_text: String::new(),
            subtitle_text: String::new(),
            style: DEFAULT_STYLE.to_string(),
            text_position: DEFAULT_TEXT_POSITION.to_string(),
            youtube_url: String::new(),
            channel_url: String::new(),
            sentence_count: None,
            video_duration: None,
            brand_colors: BrandColors::default(),
            use_kelly: true,
            session_id: None,
        }
    }
}

impl ThumbnailForm {
    /// Start a form from the saved channel branding.
    pub fn from_profile(profile: &ChannelProfile, main_text: impl Into<String>) -> Self {
        Self {
            main_text: main_text.into(),
            brand_colors: profile.brand_colors.clone(),
            use_kelly: profile.use_kelly,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), CoreError> {
        if self.main_text.trim().is_empty() {
            return Err(CoreError::Validation("Main text is required".to_string()));
        }
        if !VALID_STYLES.contains(&self.style.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown style: '{}'. Valid styles: {}",
                self.style,
                VALID_STYLES.join(", ")
            )));
        }
        if !VALID_TEXT_POSITIONS.contains(&self.text_position.as_str()) {
            return Err(CoreError::Validation(format!(
                "Unknown text position: '{}'. Valid positions: {}",
                self.text_position,
                VALID_TEXT_POSITIONS.join(", ")
            )));
        }
        self.brand_colors.validate()
    }

    /// Fill the form from an analysed source video. The title is cut to
    /// [`MAIN_TEXT_PREFILL_CHARS`]; an empty duration leaves the badge off.
    pub fn prefill_from_video(&mut self, url: &str, title: &str, duration: &str) {
        self.youtube_url = url.trim().to_string();
        if !title.is_empty() {
            self.main_text = title.chars().take(MAIN_TEXT_PREFILL_CHARS).collect();
        }
        if !duration.is_empty() {
            self.video_duration = Some(duration.to_string());
        }
    }

    /// Multipart text fields, trimmed. Badges and the session id are sent
    /// only when set.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("main_text", self.main_text.trim().to_string()),
            ("subtitle_text", self.subtitle_text.trim().to_string()),
            ("style", self.style.clone()),
            ("youtube_url", self.youtube_url.trim().to_string()),
            ("channel_url", self.channel_url.trim().to_string()),
            ("text_position", self.text_position.clone()),
        ];
        if let Some(count) = self.sentence_count {
            fields.push(("sentence_count", count.to_string()));
        }
        if let Some(duration) = self.video_duration.as_deref().map(str::trim) {
            if !duration.is_empty() {
                fields.push(("video_duration", duration.to_string()));
            }
        }
        fields.push(("brand_color_primary", self.brand_colors.primary.clone()));
        fields.push(("brand_color_secondary", self.brand_colors.secondary.clone()));
        fields.push(("brand_color_accent", self.brand_colors.accent.clone()));
        fields.push(("use_kelly", self.use_kelly.to_string()));
        if let Some(session_id) = &self.session_id {
            fields.push(("session_id", session_id.clone()));
        }
        fields
    }
}

/// Server path of one version's image.
pub fn download_path(session_id: &str, version: u32) -> String {
    format!("/thumbnail-studio/api/download/{session_id}/v{version}")
}

/// Candidate pre-selected after a multi-candidate generation: the middle
/// one when there are several.
pub fn default_candidate(count: usize) -> Option<usize> {
    match count {
        0 => None,
        1 => Some(0),
        _ => Some(1),
    }
}
