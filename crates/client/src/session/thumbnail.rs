//! Thumbnail studio controller.
//!
//! Tracks the server session id and the version the next regeneration
//! derives from. A fresh generation opens a new session; a text edit
//! re-submits the last form into the same session so the backend keeps
//! the chosen backgrounds.

use std::path::Path;
use std::sync::Arc;

use mecca_core::error::CoreError;
use mecca_core::thumbnail::{
    default_candidate, download_path, ThumbnailForm, VariationType, FIRST_VERSION,
};

use crate::backend::ThumbnailBackend;
use crate::thumbnail::{GeneratedThumbnails, HistoryEntry, SourceVideo, ThumbnailVersion};

use super::SessionError;

pub struct ThumbnailSession {
    backend: Arc<dyn ThumbnailBackend>,
    session_id: Option<String>,
    current_version: Option<u32>,
    /// Candidates of the latest generation, in server order.
    candidates: Vec<ThumbnailVersion>,
    /// Every version seen in this session, ascending.
    versions: Vec<ThumbnailVersion>,
    history: Vec<HistoryEntry>,
    last_form: Option<ThumbnailForm>,
}

impl ThumbnailSession {
    pub fn new(backend: Arc<dyn ThumbnailBackend>) -> Self {
        Self {
            backend,
            session_id: None,
            current_version: None,
            candidates: Vec::new(),
            versions: Vec::new(),
            history: Vec::new(),
            last_form: None,
        }
    }

    /// Continue an existing server session at `version`.
    pub fn resume(
        backend: Arc<dyn ThumbnailBackend>,
        session_id: impl Into<String>,
        version: Option<u32>,
    ) -> Self {
        let mut session = Self::new(backend);
        session.session_id = Some(session_id.into());
        session.current_version = version;
        session
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn current_version(&self) -> Option<u32> {
        self.current_version
    }

    pub fn candidates(&self) -> &[ThumbnailVersion] {
        &self.candidates
    }

    pub fn versions(&self) -> &[ThumbnailVersion] {
        &self.versions
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Server path of the current version's image.
    pub fn current_download_path(&self) -> Option<String> {
        let session_id = self.session_id.as_deref()?;
        self.current_version.map(|v| download_path(session_id, v))
    }

    fn require_session(&self) -> Result<String, SessionError> {
        self.session_id.clone().ok_or(SessionError::NoThumbnailSession)
    }

    fn remember(&mut self, version: ThumbnailVersion) {
        match self.versions.binary_search_by_key(&version.version, |v| v.version) {
            Ok(i) => self.versions[i] = version,
            Err(i) => self.versions.insert(i, version),
        }
    }

    // -----------------------------------------------------------------------
    // Operations
    // -----------------------------------------------------------------------

    /// Analyse a source video and prefill `form` from it.
    pub async fn prefill_from_video(
        &self,
        form: &mut ThumbnailForm,
        url: &str,
    ) -> Result<SourceVideo, SessionError> {
        if url.trim().is_empty() {
            return Err(CoreError::Validation("A video URL is required".to_string()).into());
        }
        let video = self.backend.analyze_video_url(url).await?;
        form.prefill_from_video(url, &video.title, &video.duration_string);
        Ok(video)
    }

    /// Generate thumbnails in a new session.
    pub async fn generate(
        &mut self,
        mut form: ThumbnailForm,
        reference_image: Option<&Path>,
    ) -> Result<&[ThumbnailVersion], SessionError> {
        form.session_id = None;
        form.validate()?;

        let response = self.backend.generate_thumbnails(&form, reference_image).await?;
        self.versions.clear();
        self.history.clear();
        self.adopt(form, response);
        Ok(&self.candidates)
    }

    /// Re-render the last form with new text, keeping the session.
    pub async fn edit_text(
        &mut self,
        main_text: &str,
        subtitle_text: &str,
    ) -> Result<&[ThumbnailVersion], SessionError> {
        let session_id = self.require_session()?;
        let mut form = self
            .last_form
            .clone()
            .ok_or(SessionError::NoThumbnailSession)?;
        form.main_text = main_text.to_string();
        form.subtitle_text = subtitle_text.to_string();
        form.session_id = Some(session_id);
        form.validate()?;

        let response = self.backend.generate_thumbnails(&form, None).await?;
        self.adopt(form, response);
        Ok(&self.candidates)
    }

    fn adopt(&mut self, form: ThumbnailForm, response: GeneratedThumbnails) {
        let candidates = response.candidates();
        self.current_version = default_candidate(candidates.len()).map(|i| candidates[i].version);
        for candidate in &candidates {
            self.remember(candidate.clone());
        }
        tracing::info!(
            session_id = %response.session_id,
            count = candidates.len(),
            current_version = ?self.current_version,
            "Thumbnails generated",
        );
        self.session_id = Some(response.session_id);
        self.candidates = candidates;
        self.last_form = Some(form);
    }

    /// Make `version` the current one.
    pub fn select(&mut self, version: u32) -> Result<(), SessionError> {
        if !self.versions.iter().any(|v| v.version == version) {
            return Err(CoreError::NotFound {
                entity: "thumbnail version",
                id: version.to_string(),
            }
            .into());
        }
        self.current_version = Some(version);
        Ok(())
    }

    /// Derive a new version from the current one and make it current.
    pub async fn regenerate(
        &mut self,
        variation: VariationType,
    ) -> Result<ThumbnailVersion, SessionError> {
        let session_id = self.require_session()?;
        let from = self.current_version.unwrap_or(FIRST_VERSION);

        let response = self
            .backend
            .regenerate_thumbnail(&session_id, from, variation)
            .await?;

        let version = ThumbnailVersion {
            version: response.version,
            url: response.thumbnail_url,
        };
        tracing::info!(
            session_id = %session_id,
            from,
            to = version.version,
            variation = %variation,
            "Thumbnail regenerated",
        );
        self.current_version = Some(version.version);
        self.remember(version.clone());
        Ok(version)
    }

    /// Fetch every version of the session.
    pub async fn refresh_history(&mut self) -> Result<&[HistoryEntry], SessionError> {
        let session_id = self.require_session()?;
        let history = self.backend.thumbnail_history(&session_id).await?;
        for entry in &history.thumbnails {
            self.remember(ThumbnailVersion {
                version: entry.version,
                url: entry.url.clone(),
            });
        }
        self.history = history.thumbnails;
        Ok(&self.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeThumbnails;
    use assert_matches::assert_matches;

    fn form() -> ThumbnailForm {
        ThumbnailForm {
            main_text: "Order coffee like a local".into(),
            youtube_url: "https://youtube.com/watch?v=abc".into(),
            ..ThumbnailForm::default()
        }
    }

    #[tokio::test]
    async fn generation_preselects_middle_candidate() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());

        let candidates = session.generate(form(), None).await.unwrap();
        assert_eq!(candidates.len(), 3);
        assert_eq!(session.session_id(), Some("s1"));
        assert_eq!(session.current_version(), Some(2));
        assert_eq!(
            session.current_download_path().as_deref(),
            Some("/thumbnail-studio/api/download/s1/v2")
        );
    }

    #[tokio::test]
    async fn invalid_form_is_rejected_before_request() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());

        let err = session
            .generate(ThumbnailForm::default(), None)
            .await
            .unwrap_err();
        assert_matches!(err, SessionError::Core(CoreError::Validation(_)));
        assert!(backend.forms.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn regenerate_derives_from_current_version() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());
        session.generate(form(), None).await.unwrap();
        session.select(3).unwrap();

        let version = session.regenerate(VariationType::Layout).await.unwrap();
        assert_eq!(version.version, 4);
        assert_eq!(session.current_version(), Some(4));
        assert_eq!(
            backend.regenerations.lock().unwrap()[0],
            ("s1".to_string(), 3, VariationType::Layout)
        );

        session.regenerate(VariationType::Color).await.unwrap();
        assert_eq!(backend.regenerations.lock().unwrap()[1].1, 4);
        assert_eq!(session.versions().len(), 5);
    }

    #[tokio::test]
    async fn unknown_version_cannot_be_selected() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());
        session.generate(form(), None).await.unwrap();

        assert_matches!(
            session.select(9),
            Err(SessionError::Core(CoreError::NotFound { .. }))
        );
        assert_eq!(session.current_version(), Some(2));
    }

    #[tokio::test]
    async fn regenerate_without_session_is_an_error() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());
        assert_matches!(
            session.regenerate(VariationType::Color).await,
            Err(SessionError::NoThumbnailSession)
        );
    }

    #[tokio::test]
    async fn resumed_session_starts_from_first_version() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::resume(backend.clone(), "s7", None);
        session.regenerate(VariationType::Complete).await.unwrap();
        assert_eq!(
            backend.regenerations.lock().unwrap()[0],
            ("s7".to_string(), FIRST_VERSION, VariationType::Complete)
        );
    }

    #[tokio::test]
    async fn text_edit_reuses_session_and_form() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::new(backend.clone());
        session.generate(form(), None).await.unwrap();

        session.edit_text("Coffee, please!", "Cafe English").await.unwrap();
        let forms = backend.forms.lock().unwrap();
        assert_eq!(forms[0].session_id, None);
        assert_eq!(forms[1].session_id.as_deref(), Some("s1"));
        assert_eq!(forms[1].main_text, "Coffee, please!");
        assert_eq!(forms[1].youtube_url, "https://youtube.com/watch?v=abc");
    }

    #[tokio::test]
    async fn history_refresh_makes_versions_selectable() {
        let backend = Arc::new(FakeThumbnails::default());
        let mut session = ThumbnailSession::resume(backend.clone(), "s1", Some(1));

        let history = session.refresh_history().await.unwrap();
        assert_eq!(history.len(), 3);
        session.select(3).unwrap();
        assert_eq!(session.current_version(), Some(3));
    }

    #[tokio::test]
    async fn prefill_uses_video_title_and_duration() {
        let backend = Arc::new(FakeThumbnails::default());
        let session = ThumbnailSession::new(backend.clone());
        let mut form = ThumbnailForm::default();

        session
            .prefill_from_video(&mut form, "https://youtube.com/watch?v=abc")
            .await
            .unwrap();
        assert_eq!(form.main_text, "Small talk at the office");
        assert_eq!(form.video_duration.as_deref(), Some("3:42"));

        assert_matches!(
            session.prefill_from_video(&mut form, "  ").await,
            Err(SessionError::Core(CoreError::Validation(_)))
        );
    }
}
