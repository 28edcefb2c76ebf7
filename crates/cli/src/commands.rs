//! Subcommand handlers.

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use mecca_client::api::{DownloadKind, ImageTarget, StudioApi};
use mecca_client::backend::{StudioBackend, ThumbnailBackend};
use mecca_client::config::ClientConfig;
use mecca_client::events::TaskEvent;
use mecca_client::poller::TaskPoller;
use mecca_client::session::{
    EditOutcome, EditorSession, TaskSession, TaskUpdate, ThumbnailSession,
};
use mecca_core::editor::VideoConfig;
use mecca_core::generation::{GenerateRequest, ManualForm, OtherForm, StoryOptions, ThemeForm};
use mecca_core::task::TaskStatus;
use mecca_core::thumbnail::{ChannelProfile, ThumbnailForm};

use crate::args::{Command, ConfigAction, GenerateFormat, ImageKind, ProfileAction, ThumbnailAction};
use crate::render;

pub struct App {
    config: ClientConfig,
    api: Arc<StudioApi>,
}

impl App {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let api = StudioApi::new(&config).context("Failed to build HTTP client")?;
        Ok(Self {
            config,
            api: Arc::new(api),
        })
    }

    fn backend(&self) -> Arc<dyn StudioBackend> {
        self.api.clone()
    }

    fn thumbnails(&self) -> Arc<dyn ThumbnailBackend> {
        self.api.clone()
    }

    pub async fn run(&self, command: Command) -> Result<()> {
        match command {
            Command::Generate { format, no_wait } => self.generate(format, no_wait).await,
            Command::Status { task_id, watch } => self.status(&task_id, watch).await,
            Command::Quotes => self.quotes().await,
            Command::Config { action } => self.config(action).await,
            Command::Edit {
                video_id,
                clip,
                set,
                save,
            } => self.edit(&video_id, clip, &set, save).await,
            Command::Regenerate { video_id, file } => {
                self.regenerate(&video_id, file.as_deref()).await
            }
            Command::Upload {
                video_id,
                index,
                file,
            } => self.upload(&video_id, index, &file).await,
            Command::Image {
                video_id,
                target,
                index,
                prompt,
            } => self.image(&video_id, target, index, &prompt).await,
            Command::Timeline { video_id } => self.timeline(&video_id).await,
            Command::Thumbnail { action } => self.thumbnail(action).await,
        }
    }

    // -----------------------------------------------------------------------
    // Generation
    // -----------------------------------------------------------------------

    async fn generate(&self, format: GenerateFormat, no_wait: bool) -> Result<()> {
        let request = build_request(format)?;
        let mut session = TaskSession::new(self.backend(), self.config.poll_interval);

        let task_id = session
            .submit(&request)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Generation")))?;
        println!("Task {task_id} submitted");
        if no_wait {
            return Ok(());
        }

        let mut tail = render::LogTail::default();
        let outcome = tokio::select! {
            result = session.wait_with(|update| {
                if let TaskUpdate::Progress(view) = update {
                    eprintln!("{}", render::progress_line(view));
                    for line in tail.take(view) {
                        eprintln!("{line}");
                    }
                }
            }) => Some(result),
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(outcome) = outcome else {
            tracing::info!(task_id = %task_id, "Interrupted; stopping status polling");
            session.cancel().await;
            bail!("Polling cancelled. The task keeps running on the server; check it with `mecca status {task_id}`");
        };

        // The terminal status can carry log lines no progress update showed.
        for line in tail.take(session.progress()) {
            eprintln!("{line}");
        }
        let projection = outcome.map_err(|e| anyhow::anyhow!(e.user_message("Generation")))?;
        for line in render::result_lines(&projection, |p| self.api.resolve(p)) {
            println!("{line}");
        }
        Ok(())
    }

    async fn status(&self, task_id: &str, watch: bool) -> Result<()> {
        if !watch {
            let snapshot = self
                .api
                .task_status(task_id)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Status check")))?;
            println!("{}", render::status_line(&snapshot));
            for line in &snapshot.logs {
                println!("  > {line}");
            }
            if snapshot.status == TaskStatus::Completed {
                self.print_downloads(task_id);
            }
            return Ok(());
        }

        let poller = TaskPoller::new(self.backend(), self.config.poll_interval);
        let mut events = poller.subscribe();
        poller.start(task_id).await;

        loop {
            let event = events.recv().await.context("Poll event channel closed")?;
            match event {
                TaskEvent::Progress { snapshot, .. } => {
                    eprintln!("{}", render::status_line(&snapshot));
                }
                TaskEvent::Completed { snapshot, .. } => {
                    println!("{}", render::status_line(&snapshot));
                    self.print_downloads(task_id);
                    return Ok(());
                }
                TaskEvent::Failed { message, .. } => bail!(message),
                TaskEvent::Aborted { .. } => bail!("Polling aborted"),
            }
        }
    }

    fn print_downloads(&self, task_id: &str) {
        println!("Video:    {}", self.api.download_url(task_id, DownloadKind::Video));
        println!("Metadata: {}", self.api.download_url(task_id, DownloadKind::Metadata));
    }

    async fn quotes(&self) -> Result<()> {
        let quotes = self
            .api
            .movie_quotes()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Load quotes")))?;
        for quote in quotes {
            println!("{:>4}  {}", quote.id, quote.label());
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Editor
    // -----------------------------------------------------------------------

    async fn load_editor(&self, video_id: &str) -> Result<EditorSession> {
        let mut session = EditorSession::new(self.backend(), video_id);
        session
            .load()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Load config")))?;
        Ok(session)
    }

    async fn config(&self, action: ConfigAction) -> Result<()> {
        match action {
            ConfigAction::Get { video_id } => {
                let session = self.load_editor(&video_id).await?;
                println!("{}", serde_json::to_string_pretty(session.config()?)?);
            }
            ConfigAction::Save { video_id, file } => {
                let config = read_config(&file)?;
                self.api
                    .save_config(&video_id, &config)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Save config")))?;
                println!("Config saved for {video_id}");
            }
        }
        Ok(())
    }

    async fn edit(
        &self,
        video_id: &str,
        clip: Option<usize>,
        assignments: &[(String, String)],
        save: bool,
    ) -> Result<()> {
        let mut session = self.load_editor(video_id).await?;
        if let Some(index) = clip {
            session.select_clip(index)?;
        }

        let mut rejected = 0;
        for (control, value) in assignments {
            let outcome = session.apply_edit(control, value)?;
            if matches!(outcome, EditOutcome::Rejected { .. }) {
                rejected += 1;
            }
            println!("{}", render::edit_line(control, value, &outcome));
        }

        if save && session.is_dirty() {
            session
                .save()
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Save config")))?;
            println!("Config saved for {video_id}");
        } else if session.is_dirty() {
            tracing::warn!(video_id, "Edits not saved; pass --save to persist them");
        }

        if rejected > 0 {
            bail!("{rejected} edit(s) rejected");
        }
        Ok(())
    }

    async fn regenerate(&self, video_id: &str, file: Option<&Path>) -> Result<()> {
        eprintln!("Regenerating {video_id}; this usually takes a few minutes...");
        let (video_path, processing_time) = match file {
            Some(path) => {
                let config = read_config(path)?;
                let response = self
                    .api
                    .regenerate(video_id, &config)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Regenerate")))?;
                (response.video_path, response.processing_time)
            }
            None => {
                let mut session = self.load_editor(video_id).await?;
                let outcome = session
                    .regenerate()
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Regenerate")))?;
                (outcome.video_path, outcome.processing_time)
            }
        };

        match processing_time {
            Some(secs) => println!("Video regenerated in {secs:.1}s"),
            None => println!("Video regenerated"),
        }
        println!("{}", self.api.resolve(&video_path));
        Ok(())
    }

    async fn upload(&self, video_id: &str, index: usize, file: &Path) -> Result<()> {
        let mut session = self.load_editor(video_id).await?;
        let file_path = session
            .upload_media(index, file)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Upload")))?;
        println!("Uploaded to {file_path}");
        Ok(())
    }

    async fn image(
        &self,
        video_id: &str,
        kind: ImageKind,
        index: Option<usize>,
        prompt: &str,
    ) -> Result<()> {
        let target = match (kind, index) {
            (ImageKind::Clip, Some(i)) => ImageTarget::Clip(i),
            (ImageKind::Clip, None) => bail!("--index is required for clip images"),
            (ImageKind::Intro, _) => ImageTarget::Intro,
            (ImageKind::Outro, _) => ImageTarget::Outro,
        };

        let mut session = self.load_editor(video_id).await?;
        eprintln!("Generating image; this usually takes 10-15 seconds...");
        let image_path = session
            .generate_image(target, prompt)
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Image generation")))?;
        println!("Image generated: {image_path}");
        Ok(())
    }

    async fn timeline(&self, video_id: &str) -> Result<()> {
        let session = self.load_editor(video_id).await?;
        for line in render::timeline_lines(&session.timeline()?) {
            println!("{line}");
        }
        println!();
        for line in render::clip_lines(&session.clip_summaries()?) {
            println!("{line}");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Thumbnail studio
    // -----------------------------------------------------------------------

    async fn thumbnail(&self, action: ThumbnailAction) -> Result<()> {
        match action {
            ThumbnailAction::AnalyzeUrl { url } => {
                let video = self
                    .api
                    .analyze_video_url(&url)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Analyse URL")))?;
                println!("{} ({})", video.title, video.duration_string);
                println!("Channel: {}", video.channel);
            }
            ThumbnailAction::AnalyzeChannel { url } => {
                let info = self
                    .api
                    .analyze_channel(&url)
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Analyse channel")))?;
                println!("{} ({})", info.channel_name, info.channel_id);
                if let Some(count) = info.subscriber_count {
                    println!("Subscribers: {count}");
                }
                if let Some(icon) = info.icon_url.or(info.icon_path) {
                    println!("Icon: {icon}");
                }
            }
            ThumbnailAction::Generate {
                main_text,
                subtitle,
                style,
                position,
                youtube_url,
                channel_url,
                sentence_count,
                duration,
                reference_image,
                no_kelly,
            } => {
                let profile = self.channel_profile_or_default().await;
                let mut session = ThumbnailSession::new(self.thumbnails());
                let mut form = ThumbnailForm::from_profile(&profile, main_text.unwrap_or_default());
                if form.main_text.is_empty() && !youtube_url.is_empty() {
                    session
                        .prefill_from_video(&mut form, &youtube_url)
                        .await
                        .map_err(|e| anyhow::anyhow!(e.user_message("Analyse URL")))?;
                }
                form.subtitle_text = subtitle;
                form.style = style;
                form.text_position = position;
                form.youtube_url = youtube_url;
                form.channel_url = channel_url;
                form.sentence_count = sentence_count;
                if duration.is_some() {
                    form.video_duration = duration;
                }
                if no_kelly {
                    form.use_kelly = false;
                }

                eprintln!("Generating thumbnails; this can take a minute...");
                session
                    .generate(form, reference_image.as_deref())
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Thumbnail generation")))?;
                self.print_thumbnail_session(&session);
            }
            ThumbnailAction::Regenerate {
                session_id,
                variation,
                version,
            } => {
                let mut session = ThumbnailSession::resume(self.thumbnails(), session_id, version);
                let created = session
                    .regenerate(variation.into())
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("Regenerate")))?;
                println!("Version {}: {}", created.version, self.api.resolve(&created.url));
            }
            ThumbnailAction::History { session_id } => {
                let mut session = ThumbnailSession::resume(self.thumbnails(), session_id, None);
                let history = session
                    .refresh_history()
                    .await
                    .map_err(|e| anyhow::anyhow!(e.user_message("History")))?;
                for line in render::thumbnail_history_lines(history, |p| self.api.resolve(p)) {
                    println!("{line}");
                }
            }
            ThumbnailAction::Profile { action } => self.channel_profile(action).await?,
        }
        Ok(())
    }

    async fn channel_profile_or_default(&self) -> ChannelProfile {
        match self.api.channel_profile().await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "Channel profile unavailable; using default branding");
                ChannelProfile::default()
            }
        }
    }

    fn print_thumbnail_session(&self, session: &ThumbnailSession) {
        let session_id = session.session_id().unwrap_or_default();
        println!("Session {session_id}");
        for line in render::thumbnail_candidate_lines(
            session.candidates(),
            session.current_version(),
            |p| self.api.resolve(p),
        ) {
            println!("{line}");
        }
    }

    async fn channel_profile(&self, action: ProfileAction) -> Result<()> {
        let mut profile = self
            .api
            .channel_profile()
            .await
            .map_err(|e| anyhow::anyhow!(e.user_message("Load profile")))?;

        if let ProfileAction::Save {
            name,
            primary,
            secondary,
            accent,
            use_kelly,
        } = action
        {
            apply_profile_changes(&mut profile, name, primary, secondary, accent, use_kelly)?;
            let saved = self
                .api
                .save_channel_profile(&profile)
                .await
                .map_err(|e| anyhow::anyhow!(e.user_message("Save profile")))?;
            println!("Profile saved to {}", saved.profile_path);
        }

        for line in render::profile_lines(&profile) {
            println!("{line}");
        }
        Ok(())
    }
}

/// Merge CLI overrides into `profile` and validate the colours.
pub fn apply_profile_changes(
    profile: &mut ChannelProfile,
    name: Option<String>,
    primary: Option<String>,
    secondary: Option<String>,
    accent: Option<String>,
    use_kelly: Option<bool>,
) -> Result<()> {
    if let Some(name) = name {
        let name = name.trim();
        if name.is_empty() {
            bail!("Channel name cannot be empty");
        }
        profile.channel_name = name.to_string();
    }
    if let Some(color) = primary {
        profile.brand_colors.primary = color;
    }
    if let Some(color) = secondary {
        profile.brand_colors.secondary = color;
    }
    if let Some(color) = accent {
        profile.brand_colors.accent = color;
    }
    if let Some(use_kelly) = use_kelly {
        profile.use_kelly = use_kelly;
    }
    profile.brand_colors.validate()?;
    Ok(())
}

/// Validate CLI input into a submission.
pub fn build_request(format: GenerateFormat) -> Result<GenerateRequest> {
    let request = match format {
        GenerateFormat::Manual { sentences, voice } => {
            GenerateRequest::from_manual_form(ManualForm { sentences, voice })?
        }
        GenerateFormat::Theme {
            theme,
            detail,
            voice,
        } => GenerateRequest::from_theme_form(ThemeForm {
            theme,
            theme_detail: detail,
            voice,
        })?,
        GenerateFormat::Other {
            format,
            voice,
            story_theme,
            story_day,
            quote_id,
        } => {
            let story = if story_theme.is_some() || story_day.is_some() {
                Some(StoryOptions {
                    story_theme: story_theme.unwrap_or_default(),
                    story_day: story_day.unwrap_or_default(),
                })
            } else {
                None
            };
            GenerateRequest::from_other_form(OtherForm {
                other_format: format,
                voice,
                story,
                movie_quote_id: quote_id,
            })?
        }
    };
    Ok(request)
}

fn read_config(path: &Path) -> Result<VideoConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Invalid config JSON in {}", path.display()))
}
