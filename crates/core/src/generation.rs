//! Generation request parameters and their submission-time validation.
//!
//! Three input formats exist: three hand-written sentences, a theme the
//! backend expands into sentences, and the "other" family of preset
//! formats (movie quote, pronunciation, news, story series).

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Number of sentences a manual submission must carry.
pub const MANUAL_SENTENCE_COUNT: usize = 3;

/// TTS voice used when the caller does not pick one.
pub const DEFAULT_VOICE: &str = "nova";

/// Discriminator value for theme submissions.
pub const FORMAT_THEME: &str = "theme";
/// Discriminator value for preset-format submissions.
pub const FORMAT_OTHER: &str = "other";

pub const OTHER_FORMAT_MOVIE: &str = "movie";
pub const OTHER_FORMAT_PRONUNCIATION: &str = "pronunciation";
pub const OTHER_FORMAT_NEWS: &str = "news";
pub const OTHER_FORMAT_STORY: &str = "story";

/// All valid "other" sub-formats.
pub const VALID_OTHER_FORMATS: &[&str] = &[
    OTHER_FORMAT_MOVIE,
    OTHER_FORMAT_PRONUNCIATION,
    OTHER_FORMAT_NEWS,
    OTHER_FORMAT_STORY,
];

// ---------------------------------------------------------------------------
// Sub-format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtherFormat {
    Movie,
    Pronunciation,
    News,
    Story,
}

impl OtherFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            OtherFormat::Movie => OTHER_FORMAT_MOVIE,
            OtherFormat::Pronunciation => OTHER_FORMAT_PRONUNCIATION,
            OtherFormat::News => OTHER_FORMAT_NEWS,
            OtherFormat::Story => OTHER_FORMAT_STORY,
        }
    }
}

impl std::str::FromStr for OtherFormat {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(CoreError::Validation("Please select a format".to_string())),
            OTHER_FORMAT_MOVIE => Ok(OtherFormat::Movie),
            OTHER_FORMAT_PRONUNCIATION => Ok(OtherFormat::Pronunciation),
            OTHER_FORMAT_NEWS => Ok(OtherFormat::News),
            OTHER_FORMAT_STORY => Ok(OtherFormat::Story),
            other => Err(CoreError::Validation(format!(
                "Unknown format: '{other}'. Valid formats: {}",
                VALID_OTHER_FORMATS.join(", ")
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Input forms
// ---------------------------------------------------------------------------

/// Raw input of the manual form.
#[derive(Debug, Clone, Validate)]
pub struct ManualForm {
    #[validate(length(equal = 3, message = "Exactly 3 sentences are required"))]
    pub sentences: Vec<String>,
    pub voice: String,
}

/// Raw input of the theme form.
#[derive(Debug, Clone, Validate)]
pub struct ThemeForm {
    #[validate(length(min = 1, message = "Please select a theme"))]
    pub theme: String,
    pub theme_detail: String,
    pub voice: String,
}

/// Extra fields required by the `story` sub-format.
#[derive(Debug, Clone, PartialEq, Eq, Validate)]
pub struct StoryOptions {
    #[validate(length(min = 1, message = "Story theme is required"))]
    pub story_theme: String,
    #[validate(range(min = 1, message = "Story day must be at least 1"))]
    pub story_day: u32,
}

/// Raw input of the "other" form.
#[derive(Debug, Clone, Default)]
pub struct OtherForm {
    pub other_format: String,
    pub voice: String,
    pub story: Option<StoryOptions>,
    pub movie_quote_id: Option<i64>,
}

// ---------------------------------------------------------------------------
// GenerateRequest
// ---------------------------------------------------------------------------

/// A validated submission for `POST /api/generate`.
///
/// Only constructible through the `from_*_form` functions, so every value
/// satisfies the format's input rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerateRequest {
    Manual {
        sentences: Vec<String>,
        voice: String,
    },
    Theme {
        theme: String,
        theme_detail: String,
        voice: String,
    },
    Other {
        other_format: OtherFormat,
        voice: String,
        story: Option<StoryOptions>,
        movie_quote_id: Option<i64>,
    },
}

fn voice_or_default(voice: &str) -> String {
    let voice = voice.trim();
    if voice.is_empty() {
        DEFAULT_VOICE.to_string()
    } else {
        voice.to_string()
    }
}

impl GenerateRequest {
    /// Validate the manual form: exactly three non-empty sentences.
    ///
    /// Sentences are trimmed before validation and submission.
    pub fn from_manual_form(form: ManualForm) -> Result<Self, CoreError> {
        let form = ManualForm {
            sentences: form.sentences.iter().map(|s| s.trim().to_string()).collect(),
            voice: form.voice,
        };
        form.validate()?;
        if form.sentences.iter().any(|s| s.is_empty()) {
            return Err(CoreError::Validation(
                "Please fill in every sentence".to_string(),
            ));
        }
        Ok(GenerateRequest::Manual {
            sentences: form.sentences,
            voice: voice_or_default(&form.voice),
        })
    }

    /// Validate the theme form: the theme selector must be non-empty.
    pub fn from_theme_form(form: ThemeForm) -> Result<Self, CoreError> {
        let form = ThemeForm {
            theme: form.theme.trim().to_string(),
            theme_detail: form.theme_detail.trim().to_string(),
            voice: form.voice,
        };
        form.validate()?;
        Ok(GenerateRequest::Theme {
            theme: form.theme,
            theme_detail: form.theme_detail,
            voice: voice_or_default(&form.voice),
        })
    }

    /// Validate the "other" form.
    ///
    /// The sub-format must be known; `story` additionally requires its
    /// theme and day. Story options on any other sub-format are dropped.
    pub fn from_other_form(form: OtherForm) -> Result<Self, CoreError> {
        let other_format: OtherFormat = form.other_format.parse()?;

        let story = match other_format {
            OtherFormat::Story => {
                let opts = form.story.ok_or_else(|| {
                    CoreError::Validation("Story theme and day are required".to_string())
                })?;
                let opts = StoryOptions {
                    story_theme: opts.story_theme.trim().to_string(),
                    story_day: opts.story_day,
                };
                opts.validate()?;
                Some(opts)
            }
            _ => None,
        };

        let movie_quote_id = match other_format {
            OtherFormat::Movie => form.movie_quote_id,
            _ => None,
        };

        Ok(GenerateRequest::Other {
            other_format,
            voice: voice_or_default(&form.voice),
            story,
            movie_quote_id,
        })
    }

    pub fn voice(&self) -> &str {
        match self {
            GenerateRequest::Manual { voice, .. }
            | GenerateRequest::Theme { voice, .. }
            | GenerateRequest::Other { voice, .. } => voice,
        }
    }

    /// Short label for logging.
    pub fn format_name(&self) -> &'static str {
        match self {
            GenerateRequest::Manual { .. } => "manual",
            GenerateRequest::Theme { .. } => FORMAT_THEME,
            GenerateRequest::Other { .. } => FORMAT_OTHER,
        }
    }

    /// JSON body for `POST /api/generate`.
    ///
    /// The manual shape carries no `format` key; the backend treats a
    /// missing discriminator as manual.
    pub fn to_body(&self) -> serde_json::Value {
        match self {
            GenerateRequest::Manual { sentences, voice } => serde_json::json!({
                "sentences": sentences,
                "voice": voice,
            }),
            GenerateRequest::Theme {
                theme,
                theme_detail,
                voice,
            } => serde_json::json!({
                "format": FORMAT_THEME,
                "theme": theme,
                "theme_detail": theme_detail,
                "voice": voice,
            }),
            GenerateRequest::Other {
                other_format,
                voice,
                story,
                movie_quote_id,
            } => {
                let mut body = serde_json::json!({
                    "format": FORMAT_OTHER,
                    "other_format": other_format.as_str(),
                    "voice": voice,
                });
                if let Some(story) = story {
                    body["story_theme"] = serde_json::json!(story.story_theme);
                    // The backend reads the day as a form value.
                    body["story_day"] = serde_json::json!(story.story_day.to_string());
                }
                if let Some(id) = movie_quote_id {
                    body["movie_quote_id"] = serde_json::json!(id.to_string());
                }
                body
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Movie quotes
// ---------------------------------------------------------------------------

/// One entry of `GET /api/movie-quotes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieQuote {
    pub id: i64,
    pub quote: String,
    pub movie: String,
    #[serde(default)]
    pub year: Option<i32>,
}

impl MovieQuote {
    /// Display label used in the quote picker.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({}, {})", self.quote, self.movie, year),
            None => format!("{} ({})", self.quote, self.movie),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MovieQuoteList {
    #[serde(default)]
    pub quotes: Vec<MovieQuote>,
}
