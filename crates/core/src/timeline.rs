//! Timeline arithmetic for the editor.
//!
//! The client does not know real TTS lengths, so each repeat of a clip's
//! narration is assumed to last [`SECONDS_PER_REPEAT`].

use serde::Serialize;

use crate::editor::{Clip, VideoConfig};
use crate::types::Seconds;

/// Assumed length of one narration repeat.
pub const SECONDS_PER_REPEAT: Seconds = 3.0;

/// `repeat_count * 3 + pause_after`.
pub fn effective_duration(clip: &Clip) -> Seconds {
    f64::from(clip.audio.repeat_count) * SECONDS_PER_REPEAT + clip.audio.pause_after
}

/// Sum of [`effective_duration`] over all clips.
pub fn total_clip_duration(config: &VideoConfig) -> Seconds {
    config.clips.iter().map(effective_duration).sum()
}

/// Offset at which the outro begins: intro length plus every clip.
pub fn outro_start(config: &VideoConfig) -> Seconds {
    config.global_settings.intro.duration + total_clip_duration(config)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "index", rename_all = "lowercase")]
pub enum SegmentKind {
    Intro,
    Clip(usize),
    Outro,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    pub start: Seconds,
    pub end: Seconds,
}

impl Segment {
    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Timeline {
    pub segments: Vec<Segment>,
    pub total: Seconds,
}

/// Lay out intro, clips and outro back to back.
///
/// Disabled intro/outro sections still occupy their configured duration;
/// the backend decides whether to render them.
pub fn build_timeline(config: &VideoConfig) -> Timeline {
    let mut segments = Vec::with_capacity(config.clips.len() + 2);
    let mut cursor = 0.0;

    let intro = config.global_settings.intro.duration;
    segments.push(Segment {
        kind: SegmentKind::Intro,
        start: cursor,
        end: cursor + intro,
    });
    cursor += intro;

    for (i, clip) in config.clips.iter().enumerate() {
        let d = effective_duration(clip);
        segments.push(Segment {
            kind: SegmentKind::Clip(i),
            start: cursor,
            end: cursor + d,
        });
        cursor += d;
    }

    let outro = config.global_settings.outro.duration;
    segments.push(Segment {
        kind: SegmentKind::Outro,
        start: cursor,
        end: cursor + outro,
    });
    cursor += outro;

    Timeline {
        segments,
        total: cursor,
    }
}

/// Format seconds as `MM:SS`. Non-finite or negative input gives `00:00`.
pub fn format_timestamp(seconds: Seconds) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "00:00".to_string();
    }
    let whole = seconds.floor() as u64;
    format!("{:02}:{:02}", whole / 60, whole % 60)
}
