//! UI-event to controller binding table.
//!
//! Every editor control is identified by its id; [`BINDINGS`] maps the id
//! to the config field it edits. Field accessors parse and validate the
//! raw control value so the controller stays free of view code.

use std::path::PathBuf;

use mecca_core::editor::{TextPosition, VideoConfig};
use mecca_core::error::CoreError;
use mecca_core::validation::{
    validate_font_size, validate_pause_after, validate_section_duration, validate_sentence,
    validate_volume_percent,
};

use crate::api::ImageTarget;

// ---------------------------------------------------------------------------
// Control ids
// ---------------------------------------------------------------------------

pub const CONTROL_BG_MUSIC: &str = "bg-music";
pub const CONTROL_BG_VOLUME: &str = "bg-volume";
pub const CONTROL_INTRO_DURATION: &str = "intro-duration";
pub const CONTROL_OUTRO_DURATION: &str = "outro-duration";
pub const CONTROL_SENTENCE_TEXT: &str = "sentence-text";
pub const CONTROL_TRANSLATION_TEXT: &str = "translation-text";
pub const CONTROL_FONT_SIZE: &str = "font-size";
pub const CONTROL_TTS_VOICE: &str = "tts-voice";
pub const CONTROL_PAUSE_AFTER: &str = "pause-after";
pub const CONTROL_POSITION: &str = "position";

/// A config field editable from one control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorField {
    BackgroundMusic,
    BackgroundVolume,
    IntroDuration,
    OutroDuration,
    SentenceText,
    Translation,
    FontSize,
    /// First voice only; the remaining repeats keep their voices.
    TtsVoice,
    PauseAfter,
    Position,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub control_id: &'static str,
    pub field: EditorField,
    /// Clip-level controls need a selected clip.
    pub requires_clip: bool,
}

pub const BINDINGS: &[Binding] = &[
    Binding {
        control_id: CONTROL_BG_MUSIC,
        field: EditorField::BackgroundMusic,
        requires_clip: false,
    },
    Binding {
        control_id: CONTROL_BG_VOLUME,
        field: EditorField::BackgroundVolume,
        requires_clip: false,
    },
    Binding {
        control_id: CONTROL_INTRO_DURATION,
        field: EditorField::IntroDuration,
        requires_clip: false,
    },
    Binding {
        control_id: CONTROL_OUTRO_DURATION,
        field: EditorField::OutroDuration,
        requires_clip: false,
    },
    Binding {
        control_id: CONTROL_SENTENCE_TEXT,
        field: EditorField::SentenceText,
        requires_clip: true,
    },
    Binding {
        control_id: CONTROL_TRANSLATION_TEXT,
        field: EditorField::Translation,
        requires_clip: true,
    },
    Binding {
        control_id: CONTROL_FONT_SIZE,
        field: EditorField::FontSize,
        requires_clip: true,
    },
    Binding {
        control_id: CONTROL_TTS_VOICE,
        field: EditorField::TtsVoice,
        requires_clip: true,
    },
    Binding {
        control_id: CONTROL_PAUSE_AFTER,
        field: EditorField::PauseAfter,
        requires_clip: true,
    },
    Binding {
        control_id: CONTROL_POSITION,
        field: EditorField::Position,
        requires_clip: true,
    },
];

/// Find the binding for a control id.
pub fn lookup(control_id: &str) -> Result<&'static Binding, CoreError> {
    BINDINGS
        .iter()
        .find(|b| b.control_id == control_id)
        .ok_or_else(|| {
            let known: Vec<&str> = BINDINGS.iter().map(|b| b.control_id).collect();
            CoreError::Validation(format!(
                "Unknown control: '{control_id}'. Valid controls: {}",
                known.join(", ")
            ))
        })
}

// ---------------------------------------------------------------------------
// Field accessors
// ---------------------------------------------------------------------------

fn parse_int(raw: &str, what: &str) -> Result<i64, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{what} must be a whole number (got '{raw}')")))
}

fn parse_float(raw: &str, what: &str) -> Result<f64, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{what} must be a number (got '{raw}')")))
}

impl EditorField {
    /// Display string of the field's current value.
    pub fn display(self, config: &VideoConfig, clip: Option<usize>) -> Result<String, CoreError> {
        let gs = &config.global_settings;
        let clip_ref = || match clip {
            Some(i) => config.clip(i),
            None => Err(CoreError::Validation("No clip selected".to_string())),
        };
        Ok(match self {
            EditorField::BackgroundMusic => gs.background_music.file.clone(),
            EditorField::BackgroundVolume => {
                format!("{}%", (gs.background_music.volume * 100.0).round() as i64)
            }
            EditorField::IntroDuration => format!("{}s", gs.intro.duration),
            EditorField::OutroDuration => format!("{}s", gs.outro.duration),
            EditorField::SentenceText => clip_ref()?.sentence_text.clone(),
            EditorField::Translation => clip_ref()?.translation.clone(),
            EditorField::FontSize => format!("{}px", clip_ref()?.text.font_size),
            EditorField::TtsVoice => clip_ref()?
                .audio
                .tts_voices
                .first()
                .cloned()
                .unwrap_or_default(),
            EditorField::PauseAfter => {
                let tenths = (clip_ref()?.audio.pause_after * 10.0).round();
                format!("{:.1}s", tenths / 10.0)
            }
            EditorField::Position => clip_ref()?.text.position.as_str().to_string(),
        })
    }

    /// Parse, validate and store `raw`.
    ///
    /// On error the config is left unchanged.
    pub fn apply(
        self,
        config: &mut VideoConfig,
        clip: Option<usize>,
        raw: &str,
    ) -> Result<(), CoreError> {
        let index = || clip.ok_or_else(|| CoreError::Validation("No clip selected".to_string()));
        match self {
            EditorField::BackgroundMusic => {
                config.global_settings.background_music.file = raw.trim().to_string();
            }
            EditorField::BackgroundVolume => {
                let fraction = validate_volume_percent(parse_int(raw, "Volume")?)?;
                config.global_settings.background_music.volume = fraction;
            }
            EditorField::IntroDuration => {
                let d = validate_section_duration(parse_float(raw, "Intro duration")?)?;
                config.global_settings.intro.duration = d;
            }
            EditorField::OutroDuration => {
                let d = validate_section_duration(parse_float(raw, "Outro duration")?)?;
                config.global_settings.outro.duration = d;
            }
            EditorField::SentenceText => {
                validate_sentence(raw)?;
                config.clip_mut(index()?)?.sentence_text = raw.to_string();
            }
            EditorField::Translation => {
                config.clip_mut(index()?)?.translation = raw.to_string();
            }
            EditorField::FontSize => {
                let size = validate_font_size(parse_int(raw, "Font size")?)?;
                config.clip_mut(index()?)?.text.font_size = size;
            }
            EditorField::TtsVoice => {
                let voice = raw.trim();
                if voice.is_empty() {
                    return Err(CoreError::Validation("Please select a voice".to_string()));
                }
                let voices = &mut config.clip_mut(index()?)?.audio.tts_voices;
                match voices.first_mut() {
                    Some(first) => *first = voice.to_string(),
                    None => voices.push(voice.to_string()),
                }
            }
            EditorField::PauseAfter => {
                let pause = validate_pause_after(parse_float(raw, "Pause")?)?;
                config.clip_mut(index()?)?.audio.pause_after = pause;
            }
            EditorField::Position => {
                let position: TextPosition = raw.parse()?;
                config.clip_mut(index()?)?.text.position = position;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// UI events
// ---------------------------------------------------------------------------

/// Every user action the editor reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SelectClip(usize),
    Edit { control_id: String, value: String },
    Save,
    Regenerate,
    GenerateImage { target: ImageTarget, prompt: String },
    UploadMedia { index: usize, path: PathBuf },
    /// Leave the editor; `force` discards unsaved changes.
    Cancel { force: bool },
}

/// Keyboard shortcuts: Ctrl+S / Cmd+S saves.
pub fn shortcut(key: &str, ctrl_or_meta: bool) -> Option<UiEvent> {
    match (key, ctrl_or_meta) {
        ("s" | "S", true) => Some(UiEvent::Save),
        _ => None,
    }
}
