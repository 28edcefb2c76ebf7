//! Terminal rendering of progress, results and editor views.

use mecca_client::projection::{ProgressView, ResultProjection};
use mecca_client::session::{ClipSummary, EditOutcome};
use mecca_client::thumbnail::{HistoryEntry, ThumbnailVersion};
use mecca_core::task::TaskSnapshot;
use mecca_core::thumbnail::ChannelProfile;
use mecca_core::timeline::{format_timestamp, SegmentKind, Timeline};

/// Width of the progress bar in characters.
const BAR_WIDTH: usize = 30;

pub fn progress_bar(percent: u8) -> String {
    let filled = usize::from(percent.min(100)) * BAR_WIDTH / 100;
    format!(
        "[{}{}] {:>3}%",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        percent
    )
}

pub fn progress_line(view: &ProgressView) -> String {
    format!("{} {}", progress_bar(view.percent), view.current_step)
}

/// Log lines arrived since `previous_len`, prefixed for display.
pub fn new_log_lines(view: &ProgressView, previous_len: usize) -> Vec<String> {
    view.new_logs(previous_len)
        .iter()
        .map(|line| format!("  > {line}"))
        .collect()
}

/// Tracks how many log lines have been printed so each line shows once.
#[derive(Debug, Default)]
pub struct LogTail {
    shown: usize,
}

impl LogTail {
    /// Lines of `view` not printed yet.
    pub fn take(&mut self, view: &ProgressView) -> Vec<String> {
        let lines = new_log_lines(view, self.shown);
        self.shown = self.shown.max(view.logs.len());
        lines
    }
}

/// Result panel. `resolve` turns server paths into absolute URLs.
pub fn result_lines(projection: &ResultProjection, resolve: impl Fn(&str) -> String) -> Vec<String> {
    let mut lines = vec![
        format!("Task:        {}", projection.task_id),
        format!("Title:       {}", projection.title),
        format!("Description: {}", projection.description),
        format!("Tags:        {}", projection.tags_display),
    ];
    if !projection.video_download.href.is_empty() {
        lines.push(format!(
            "Video:       {} ({})",
            resolve(&projection.video_download.href),
            projection.video_download.filename
        ));
    }
    if !projection.metadata_download.href.is_empty() {
        lines.push(format!(
            "Metadata:    {} ({})",
            resolve(&projection.metadata_download.href),
            projection.metadata_download.filename
        ));
    }
    lines.push(format!("Editor:      {}", resolve(&projection.editor_link())));
    lines
}

/// One-shot status summary.
pub fn status_line(snapshot: &TaskSnapshot) -> String {
    let mut line = format!(
        "{} {} ({})",
        progress_bar(snapshot.percent()),
        snapshot.current_step,
        snapshot.status
    );
    if let Some(error) = snapshot.error.as_deref().filter(|e| !e.is_empty()) {
        line.push_str(&format!(": {error}"));
    }
    line
}

pub fn edit_line(control: &str, value: &str, outcome: &EditOutcome) -> String {
    match outcome {
        EditOutcome::Applied { display } => format!("{control}: {display}"),
        EditOutcome::Rejected { message, revert_to } => {
            format!("{control}: rejected '{value}' ({message}); keeping {revert_to}")
        }
    }
}

pub fn clip_lines(clips: &[ClipSummary]) -> Vec<String> {
    clips
        .iter()
        .map(|c| format!("{:>2}. {} {:>5}  {}", c.index, c.label, c.duration_label, c.text))
        .collect()
}

pub fn timeline_lines(timeline: &Timeline) -> Vec<String> {
    let mut lines: Vec<String> = timeline
        .segments
        .iter()
        .map(|segment| {
            let label = match segment.kind {
                SegmentKind::Intro => "Intro".to_string(),
                SegmentKind::Clip(i) => format!("Sentence {}", i + 1),
                SegmentKind::Outro => "Outro".to_string(),
            };
            format!(
                "{} - {}  {}",
                format_timestamp(segment.start),
                format_timestamp(segment.end),
                label
            )
        })
        .collect();
    lines.push(format!("Total {}", format_timestamp(timeline.total)));
    lines
}

/// Generated candidates; the current one is marked with `*`.
pub fn thumbnail_candidate_lines(
    candidates: &[ThumbnailVersion],
    current: Option<u32>,
    resolve: impl Fn(&str) -> String,
) -> Vec<String> {
    candidates
        .iter()
        .map(|c| {
            let mark = if Some(c.version) == current { '*' } else { ' ' };
            format!("{mark} v{:<3} {}", c.version, resolve(&c.url))
        })
        .collect()
}

pub fn thumbnail_history_lines(
    history: &[HistoryEntry],
    resolve: impl Fn(&str) -> String,
) -> Vec<String> {
    history
        .iter()
        .map(|entry| {
            format!(
                "v{:<3} {:<9} {:<20} {}",
                entry.version,
                entry.variation_type,
                entry.created_at,
                resolve(&entry.url)
            )
        })
        .collect()
}

pub fn profile_lines(profile: &ChannelProfile) -> Vec<String> {
    let colors = &profile.brand_colors;
    vec![
        format!("Channel:   {}", profile.channel_name),
        format!(
            "Colors:    {} / {} / {}",
            colors.primary, colors.secondary, colors.accent
        ),
        format!("Kelly:     {}", if profile.use_kelly { "on" } else { "off" }),
    ]
}
