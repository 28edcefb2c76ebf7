//! Range rules for editor controls.
//!
//! Each `validate_*` function rejects out-of-range input instead of
//! clamping it; callers keep the previous value on error.

use crate::error::CoreError;
use crate::types::Seconds;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Smallest allowed caption font size in pixels.
pub const MIN_FONT_SIZE: u32 = 30;
/// Largest allowed caption font size in pixels.
pub const MAX_FONT_SIZE: u32 = 80;

/// Smallest allowed pause after a clip, in seconds.
pub const MIN_PAUSE_AFTER: Seconds = 0.0;
/// Largest allowed pause after a clip, in seconds.
pub const MAX_PAUSE_AFTER: Seconds = 5.0;

/// Maximum sentence length in characters.
pub const MAX_SENTENCE_LENGTH: usize = 200;

/// Volume slider range, in percent.
pub const MAX_VOLUME_PERCENT: u32 = 100;

// ---------------------------------------------------------------------------
// Validation functions
// ---------------------------------------------------------------------------

pub fn validate_font_size(size: i64) -> Result<u32, CoreError> {
    if size < i64::from(MIN_FONT_SIZE) || size > i64::from(MAX_FONT_SIZE) {
        return Err(CoreError::Validation(format!(
            "Font size must be between {MIN_FONT_SIZE} and {MAX_FONT_SIZE}px (got {size})"
        )));
    }
    Ok(size as u32)
}

pub fn validate_pause_after(pause: Seconds) -> Result<Seconds, CoreError> {
    if !pause.is_finite() || !(MIN_PAUSE_AFTER..=MAX_PAUSE_AFTER).contains(&pause) {
        return Err(CoreError::Validation(format!(
            "Pause must be between {MIN_PAUSE_AFTER} and {MAX_PAUSE_AFTER} seconds (got {pause})"
        )));
    }
    Ok(pause)
}

/// Sentences must be non-blank and at most [`MAX_SENTENCE_LENGTH`] characters.
pub fn validate_sentence(text: &str) -> Result<(), CoreError> {
    if text.trim().is_empty() {
        return Err(CoreError::Validation(
            "Please enter a sentence".to_string(),
        ));
    }
    let len = text.chars().count();
    if len > MAX_SENTENCE_LENGTH {
        return Err(CoreError::Validation(format!(
            "Sentence is too long (maximum {MAX_SENTENCE_LENGTH} characters, got {len})"
        )));
    }
    Ok(())
}

/// Convert a slider percentage into the stored volume fraction.
pub fn validate_volume_percent(percent: i64) -> Result<f64, CoreError> {
    if percent < 0 || percent > i64::from(MAX_VOLUME_PERCENT) {
        return Err(CoreError::Validation(format!(
            "Volume must be between 0 and {MAX_VOLUME_PERCENT}% (got {percent})"
        )));
    }
    Ok(percent as f64 / 100.0)
}

/// Intro and outro lengths.
pub fn validate_section_duration(seconds: Seconds) -> Result<Seconds, CoreError> {
    if !seconds.is_finite() || seconds < 0.0 {
        return Err(CoreError::Validation(format!(
            "Duration must be zero or more seconds (got {seconds})"
        )));
    }
    Ok(seconds)
}
