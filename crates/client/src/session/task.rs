//! Generation page controller: submit, watch progress, show the result.

use std::sync::Arc;
use std::time::Duration;

use mecca_core::generation::GenerateRequest;
use tokio::sync::broadcast;

use crate::backend::StudioBackend;
use crate::events::TaskEvent;
use crate::poller::TaskPoller;
use crate::projection::{editor_link, ProgressView, ResultProjection};

use super::SessionError;

/// Operation name used in submission error messages.
const SUBMIT_OPERATION: &str = "Generation";

/// Which panel the generation page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Format selection and input forms.
    Selection,
    /// Progress bar and log list.
    Progress,
    /// Player, metadata and downloads.
    Result,
}

/// What changed after one poll event.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskUpdate {
    Progress(ProgressView),
    Completed(ResultProjection),
    Failed(String),
    Aborted,
}

impl TaskUpdate {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskUpdate::Progress(_))
    }
}

pub struct TaskSession {
    backend: Arc<dyn StudioBackend>,
    poller: TaskPoller,
    events: broadcast::Receiver<TaskEvent>,
    phase: Phase,
    task_id: Option<String>,
    /// Poll generation of the current task; older events are ignored.
    generation: u64,
    progress: ProgressView,
    result: Option<ResultProjection>,
    last_error: Option<String>,
}

impl TaskSession {
    pub fn new(backend: Arc<dyn StudioBackend>, poll_interval: Duration) -> Self {
        let poller = TaskPoller::new(Arc::clone(&backend), poll_interval);
        let events = poller.subscribe();
        Self {
            backend,
            poller,
            events,
            phase: Phase::Selection,
            task_id: None,
            generation: 0,
            progress: ProgressView::default(),
            result: None,
            last_error: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn task_id(&self) -> Option<&str> {
        self.task_id.as_deref()
    }

    pub fn progress(&self) -> &ProgressView {
        &self.progress
    }

    pub fn result(&self) -> Option<&ResultProjection> {
        self.result.as_ref()
    }

    /// Message of the last failed submission or task.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Editor page link for the current task, once one exists.
    pub fn editor_link(&self) -> Option<String> {
        self.task_id.as_deref().map(editor_link)
    }

    /// Whether the submit control is disabled.
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Progress
    }

    /// Submit a generation request and start polling its status.
    ///
    /// Rejected with [`SessionError::Busy`] while a task is in flight. On
    /// failure the page returns to the selection panel.
    pub async fn submit(&mut self, request: &GenerateRequest) -> Result<String, SessionError> {
        if self.is_busy() {
            return Err(SessionError::Busy(SUBMIT_OPERATION));
        }

        self.phase = Phase::Progress;
        self.progress = ProgressView::default();
        self.result = None;
        self.last_error = None;

        let response = match self.backend.submit_generation(request).await {
            Ok(response) => response,
            Err(e) => {
                let message = e.user_message(SUBMIT_OPERATION);
                tracing::warn!(format = request.format_name(), error = %e, "Submission failed");
                self.phase = Phase::Selection;
                self.last_error = Some(message);
                return Err(e.into());
            }
        };

        tracing::info!(
            task_id = %response.task_id,
            format = request.format_name(),
            voice = request.voice(),
            "Generation task submitted",
        );

        self.task_id = Some(response.task_id.clone());
        self.generation = self.poller.start(response.task_id.clone()).await;
        Ok(response.task_id)
    }

    /// Apply one poll event. Events from an older poll loop return `None`.
    pub fn apply(&mut self, event: TaskEvent) -> Option<TaskUpdate> {
        if event.generation() != self.generation || self.phase != Phase::Progress {
            return None;
        }

        let update = match event {
            TaskEvent::Progress { snapshot, .. } => {
                self.progress.update(&snapshot);
                TaskUpdate::Progress(self.progress.clone())
            }
            TaskEvent::Completed {
                task_id, snapshot, ..
            } => {
                self.progress.update(&snapshot);
                let projection = ResultProjection::from_result(&task_id, snapshot.result.as_ref());
                self.result = Some(projection.clone());
                self.phase = Phase::Result;
                TaskUpdate::Completed(projection)
            }
            TaskEvent::Failed { message, .. } => {
                self.phase = Phase::Selection;
                self.last_error = Some(message.clone());
                TaskUpdate::Failed(message)
            }
            TaskEvent::Aborted { .. } => {
                self.phase = Phase::Selection;
                TaskUpdate::Aborted
            }
        };
        Some(update)
    }

    /// Wait for the next update of the current task.
    pub async fn next_update(&mut self) -> Result<TaskUpdate, SessionError> {
        if self.phase != Phase::Progress {
            return Err(SessionError::NoActiveTask);
        }
        loop {
            match self.events.recv().await {
                Ok(event) => {
                    if let Some(update) = self.apply(event) {
                        return Ok(update);
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Task session lagged behind poll events");
                }
                Err(broadcast::error::RecvError::Closed) => return Err(SessionError::Cancelled),
            }
        }
    }

    /// Drive the current task to a terminal state, reporting every update.
    pub async fn wait_with<F>(&mut self, mut on_update: F) -> Result<ResultProjection, SessionError>
    where
        F: FnMut(&TaskUpdate),
    {
        loop {
            let update = self.next_update().await?;
            on_update(&update);
            match update {
                TaskUpdate::Progress(_) => continue,
                TaskUpdate::Completed(projection) => return Ok(projection),
                TaskUpdate::Failed(message) => return Err(SessionError::TaskFailed(message)),
                TaskUpdate::Aborted => return Err(SessionError::Cancelled),
            }
        }
    }

    pub async fn wait(&mut self) -> Result<ResultProjection, SessionError> {
        self.wait_with(|_| {}).await
    }

    /// Stop polling the current task and return to the selection panel.
    pub async fn cancel(&mut self) {
        self.poller.stop().await;
        if self.phase == Phase::Progress {
            self.phase = Phase::Selection;
        }
    }

    /// Return to the selection panel from the result panel.
    pub fn reset(&mut self) {
        if self.phase == Phase::Result {
            self.phase = Phase::Selection;
        }
    }
}
