use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use mecca_core::generation::DEFAULT_VOICE;
use mecca_core::thumbnail::{VariationType, DEFAULT_STYLE, DEFAULT_TEXT_POSITION};

#[derive(Debug, Parser)]
#[command(name = "mecca")]
#[command(about = "Daily English studio client - generate and edit short videos")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Backend base URL (overrides MECCA_BASE_URL)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Submit a generation task and follow it to completion
    Generate {
        #[command(subcommand)]
        format: GenerateFormat,

        /// Print the task id and exit without polling
        #[arg(long, global = true)]
        no_wait: bool,
    },

    /// Show the status of a task
    Status {
        task_id: String,

        /// Keep polling until the task finishes
        #[arg(long)]
        watch: bool,
    },

    /// List the quotes available to the movie format
    Quotes,

    /// Read or write a video's edit config
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Apply control edits to a video's config
    Edit {
        video_id: String,

        /// Clip index for clip-level controls
        #[arg(long)]
        clip: Option<usize>,

        /// Control assignment, e.g. `font-size=64` (repeatable)
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,

        /// Save the config after applying the edits
        #[arg(long)]
        save: bool,
    },

    /// Re-render a video from its config
    Regenerate {
        video_id: String,

        /// Use this config file instead of the stored config
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Upload a replacement image or video for one clip
    Upload {
        video_id: String,
        index: usize,
        file: PathBuf,
    },

    /// Generate a new AI image for a clip, the intro or the outro
    Image {
        video_id: String,

        #[arg(value_enum)]
        target: ImageKind,

        /// Clip index (required for `clip`)
        #[arg(long)]
        index: Option<usize>,

        /// Custom prompt; empty lets the backend choose
        #[arg(long, default_value = "")]
        prompt: String,
    },

    /// Print the segment timeline of a video
    Timeline { video_id: String },

    /// Design YouTube thumbnails
    Thumbnail {
        #[command(subcommand)]
        action: ThumbnailAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum GenerateFormat {
    /// Three hand-written sentences
    Manual {
        #[arg(num_args = 1..)]
        sentences: Vec<String>,

        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,
    },

    /// Sentences generated from a theme
    Theme {
        theme: String,

        #[arg(long, default_value = "")]
        detail: String,

        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,
    },

    /// Preset format: movie, pronunciation, news or story
    Other {
        format: String,

        #[arg(long, default_value = DEFAULT_VOICE)]
        voice: String,

        /// Story series theme (story only)
        #[arg(long)]
        story_theme: Option<String>,

        /// Story series day (story only)
        #[arg(long)]
        story_day: Option<u32>,

        /// Movie quote id from `mecca quotes` (movie only)
        #[arg(long)]
        quote_id: Option<i64>,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the stored config as JSON
    Get { video_id: String },

    /// Replace the stored config with a JSON file
    Save { video_id: String, file: PathBuf },
}

#[derive(Debug, Subcommand)]
pub enum ThumbnailAction {
    /// Read title and duration of a YouTube video
    AnalyzeUrl { url: String },

    /// Read name and icon of a YouTube channel
    AnalyzeChannel { url: String },

    /// Render thumbnails in a new session
    Generate {
        /// Main text; taken from the video title when omitted
        main_text: Option<String>,

        #[arg(long, default_value = "")]
        subtitle: String,

        /// fire_english, minimalist, bold_bright or professional
        #[arg(long, default_value = DEFAULT_STYLE)]
        style: String,

        /// left, center or right
        #[arg(long, default_value = DEFAULT_TEXT_POSITION)]
        position: String,

        /// Source video to pull background frames from
        #[arg(long, default_value = "")]
        youtube_url: String,

        /// Channel whose icon is stamped on the thumbnail
        #[arg(long, default_value = "")]
        channel_url: String,

        /// Show a sentence-count badge
        #[arg(long)]
        sentence_count: Option<u32>,

        /// Show a duration badge, e.g. `3:42`
        #[arg(long)]
        duration: Option<String>,

        /// Style reference image
        #[arg(long)]
        reference_image: Option<PathBuf>,

        /// Leave the presenter character out
        #[arg(long)]
        no_kelly: bool,
    },

    /// Derive a new version from an existing one
    Regenerate {
        session_id: String,

        #[arg(value_enum)]
        variation: VariationArg,

        /// Version to start from (default: 1)
        #[arg(long)]
        version: Option<u32>,
    },

    /// List the versions of a session
    History { session_id: String },

    /// Show or update the channel profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    Show,

    /// Update the given fields and save
    Save {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        primary: Option<String>,
        #[arg(long)]
        secondary: Option<String>,
        #[arg(long)]
        accent: Option<String>,
        #[arg(long)]
        use_kelly: Option<bool>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VariationArg {
    Color,
    Layout,
    Complete,
}

impl From<VariationArg> for VariationType {
    fn from(arg: VariationArg) -> Self {
        match arg {
            VariationArg::Color => VariationType::Color,
            VariationArg::Layout => VariationType::Layout,
            VariationArg::Complete => VariationType::Complete,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageKind {
    Clip,
    Intro,
    Outro,
}

/// Parse `control=value`. The value may itself contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (control, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected control=value, got '{raw}'"))?;
    let control = control.trim();
    if control.is_empty() {
        return Err(format!("missing control id in '{raw}'"));
    }
    Ok((control.to_string(), value.to_string()))
}
