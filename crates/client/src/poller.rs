//! Cancellable task-status polling loop.
//!
//! [`TaskPoller`] runs at most one polling loop at a time. Starting a
//! loop cancels the previous one and bumps a generation counter; every
//! status response is applied only if its generation is still current,
//! so a slow response from a superseded or stopped loop is dropped.
//!
//! Events are broadcast via a [`tokio::sync::broadcast`] channel. Call
//! [`TaskPoller::subscribe`] before [`TaskPoller::start`] to receive them.

use std::sync::Arc;
use std::time::Duration;

use mecca_core::task::{next_state, validate_transition, PollState, TaskSnapshot};
use tokio::sync::{broadcast, Mutex};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::api::StudioApiError;
use crate::backend::StudioBackend;
use crate::events::{FailureKind, TaskEvent};

/// Broadcast channel capacity for poll events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Operation name used in network failure messages.
const STATUS_OPERATION: &str = "Status check";

/// Polls one task at a time and broadcasts its progress.
pub struct TaskPoller {
    backend: Arc<dyn StudioBackend>,
    interval: Duration,
    shared: Arc<Mutex<PollShared>>,
    event_tx: broadcast::Sender<TaskEvent>,
    /// Master cancellation token -- cancelled on shutdown.
    cancel: CancellationToken,
}

/// State shared between the poller handle and its loop task.
struct PollShared {
    /// Monotonically increasing; bumped on every start and stop.
    generation: u64,
    state: PollState,
    task_id: Option<String>,
    last_progress: i64,
    /// Per-loop cancellation token (child of the master token).
    loop_cancel: Option<CancellationToken>,
}

/// Whether the loop should keep polling after a response.
enum Step {
    Continue,
    Stop,
}

impl TaskPoller {
    pub fn new(backend: Arc<dyn StudioBackend>, interval: Duration) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            interval,
            shared: Arc::new(Mutex::new(PollShared {
                generation: 0,
                state: PollState::Idle,
                task_id: None,
                last_progress: 0,
                loop_cancel: None,
            })),
            event_tx,
            cancel: CancellationToken::new(),
        }
    }

    /// Subscribe to poll events.
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.event_tx.subscribe()
    }

    /// Current generation. Events carrying an older value are stale.
    pub async fn generation(&self) -> u64 {
        self.shared.lock().await.generation
    }

    pub async fn state(&self) -> PollState {
        self.shared.lock().await.state
    }

    /// Start polling `task_id`.
    ///
    /// Any previous loop is cancelled first (and reported as aborted if it
    /// had not reached a terminal state). One status check is issued
    /// immediately, then one per interval. Returns the new generation.
    pub async fn start(&self, task_id: impl Into<String>) -> u64 {
        let task_id = task_id.into();
        let loop_cancel = self.cancel.child_token();

        let generation = {
            let mut shared = self.shared.lock().await;
            Self::supersede(&mut shared, &self.event_tx);

            shared.generation += 1;
            shared.state = PollState::Polling;
            shared.task_id = Some(task_id.clone());
            shared.last_progress = 0;
            shared.loop_cancel = Some(loop_cancel.clone());
            shared.generation
        };

        tracing::info!(task_id = %task_id, generation, "Polling started");

        let ctx = LoopContext {
            backend: Arc::clone(&self.backend),
            shared: Arc::clone(&self.shared),
            event_tx: self.event_tx.clone(),
            task_id,
            generation,
            interval: self.interval,
            cancel: loop_cancel,
        };
        tokio::spawn(run_poll_loop(ctx));

        generation
    }

    /// Stop the active loop, if any.
    ///
    /// In-flight requests are not awaited; their responses are discarded
    /// by the generation check.
    pub async fn stop(&self) {
        let mut shared = self.shared.lock().await;
        Self::supersede(&mut shared, &self.event_tx);
        shared.generation += 1;
    }

    /// Cancel every loop permanently.
    pub async fn shutdown(&self) {
        self.stop().await;
        self.cancel.cancel();
        tracing::debug!("Task poller shut down");
    }

    /// Cancel the current loop and emit `Aborted` if it was still polling.
    fn supersede(shared: &mut PollShared, event_tx: &broadcast::Sender<TaskEvent>) {
        if let Some(token) = shared.loop_cancel.take() {
            token.cancel();
        }
        if shared.state == PollState::Polling {
            shared.state = PollState::Aborted;
            if let Some(task_id) = shared.task_id.clone() {
                tracing::info!(task_id = %task_id, generation = shared.generation, "Polling aborted");
                let _ = event_tx.send(TaskEvent::Aborted {
                    task_id,
                    generation: shared.generation,
                });
            }
        }
    }
}

impl Drop for TaskPoller {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// Loop
// ---------------------------------------------------------------------------

struct LoopContext {
    backend: Arc<dyn StudioBackend>,
    shared: Arc<Mutex<PollShared>>,
    event_tx: broadcast::Sender<TaskEvent>,
    task_id: String,
    generation: u64,
    interval: Duration,
    cancel: CancellationToken,
}

/// Core loop: tick -> status request -> apply, until a terminal status,
/// a request failure, or cancellation.
async fn run_poll_loop(ctx: LoopContext) {
    let mut ticker = tokio::time::interval(ctx.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        // The first tick completes immediately.
        tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            _ = ticker.tick() => {}
        }

        let result = tokio::select! {
            _ = ctx.cancel.cancelled() => return,
            result = ctx.backend.task_status(&ctx.task_id) => result,
        };

        match apply_response(&ctx, result).await {
            Step::Continue => continue,
            Step::Stop => return,
        }
    }
}

/// Apply one status response under the shared lock.
async fn apply_response(ctx: &LoopContext, result: Result<TaskSnapshot, StudioApiError>) -> Step {
    let mut shared = ctx.shared.lock().await;

    if shared.generation != ctx.generation || shared.state != PollState::Polling {
        tracing::debug!(
            task_id = %ctx.task_id,
            generation = ctx.generation,
            current = shared.generation,
            "Dropping stale status response",
        );
        return Step::Stop;
    }

    let snapshot = match result {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!(task_id = %ctx.task_id, error = %e, "Status check failed");
            shared.state = PollState::Error;
            shared.loop_cancel = None;
            let _ = ctx.event_tx.send(TaskEvent::Failed {
                task_id: ctx.task_id.clone(),
                generation: ctx.generation,
                kind: FailureKind::Network,
                message: e.user_message(STATUS_OPERATION),
            });
            return Step::Stop;
        }
    };

    let next = next_state(&snapshot);
    if next != PollState::Polling {
        if let Err(e) = validate_transition(shared.state, next) {
            tracing::error!(task_id = %ctx.task_id, error = %e, "Unexpected poll transition");
            return Step::Stop;
        }
    }

    match next {
        PollState::Completed => {
            tracing::info!(task_id = %ctx.task_id, "Task completed");
            shared.state = PollState::Completed;
            shared.loop_cancel = None;
            let _ = ctx.event_tx.send(TaskEvent::Completed {
                task_id: ctx.task_id.clone(),
                generation: ctx.generation,
                snapshot,
            });
            Step::Stop
        }
        PollState::Error => {
            let message = snapshot.error_message();
            tracing::warn!(task_id = %ctx.task_id, error = %message, "Task reported an error");
            shared.state = PollState::Error;
            shared.loop_cancel = None;
            let _ = ctx.event_tx.send(TaskEvent::Failed {
                task_id: ctx.task_id.clone(),
                generation: ctx.generation,
                kind: FailureKind::Server,
                message,
            });
            Step::Stop
        }
        _ => {
            if snapshot.progress < shared.last_progress {
                tracing::warn!(
                    task_id = %ctx.task_id,
                    previous = shared.last_progress,
                    progress = snapshot.progress,
                    "Task progress went backwards",
                );
            }
            shared.last_progress = snapshot.progress;
            tracing::debug!(
                task_id = %ctx.task_id,
                status = %snapshot.status,
                progress = snapshot.progress,
                step = %snapshot.current_step,
                "Task progress",
            );
            let _ = ctx.event_tx.send(TaskEvent::Progress {
                task_id: ctx.task_id.clone(),
                generation: ctx.generation,
                snapshot,
            });
            Step::Continue
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeBackend;
    use assert_matches::assert_matches;
    use mecca_core::task::TaskStatus;

    fn snap(status: &str, progress: i64) -> TaskSnapshot {
        TaskSnapshot {
            status: TaskStatus::from(status),
            progress,
            ..Default::default()
        }
    }

    async fn next(rx: &mut broadcast::Receiver<TaskEvent>) -> TaskEvent {
        tokio::time::timeout(Duration::from_secs(30), rx.recv())
            .await
            .expect("event within timeout")
            .expect("channel open")
    }

    #[tokio::test(start_paused = true)]
    async fn completed_stops_polling() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(Ok(snap("pending", 40)));
        backend.push_status(Ok(snap("completed", 100)));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        poller.start("t1").await;

        assert_matches!(next(&mut rx).await, TaskEvent::Progress { snapshot, .. } if snapshot.progress == 40);
        assert_matches!(next(&mut rx).await, TaskEvent::Completed { task_id, .. } if task_id == "t1");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(backend.status_calls(), 2);
        assert_eq!(poller.state().await, PollState::Completed);
    }

    #[tokio::test(start_paused = true)]
    async fn first_check_is_immediate() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(Ok(snap("completed", 100)));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(60));
        let mut rx = poller.subscribe();
        let started = tokio::time::Instant::now();
        poller.start("t1").await;

        assert_matches!(next(&mut rx).await, TaskEvent::Completed { .. });
        assert!(started.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn server_error_surfaces_message_and_stops() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(Ok(TaskSnapshot {
            status: TaskStatus::Error,
            error: Some("render failed".into()),
            ..Default::default()
        }));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        poller.start("t1").await;

        assert_matches!(
            next(&mut rx).await,
            TaskEvent::Failed { kind: FailureKind::Server, message, .. } if message == "render failed"
        );
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.status_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn network_failure_is_fail_fast() {
        let backend = Arc::new(FakeBackend::default());
        backend.push_status(Err(StudioApiError::ApiError {
            status: 500,
            body: String::new(),
        }));
        backend.push_status(Ok(snap("completed", 100)));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        poller.start("t1").await;

        assert_matches!(next(&mut rx).await, TaskEvent::Failed { kind: FailureKind::Network, .. });
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(backend.status_calls(), 1);
        assert_eq!(poller.state().await, PollState::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_aborts_previous_loop() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_default_status(snap("pending", 10));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        let first = poller.start("t1").await;
        assert_matches!(next(&mut rx).await, TaskEvent::Progress { .. });

        let second = poller.start("t2").await;
        assert!(second > first);

        // Drain until the abort of the first loop shows up.
        loop {
            match next(&mut rx).await {
                TaskEvent::Aborted { task_id, generation } => {
                    assert_eq!(task_id, "t1");
                    assert_eq!(generation, first);
                    break;
                }
                TaskEvent::Progress { generation, .. } => assert_eq!(generation, first),
                other => panic!("unexpected event {other:?}"),
            }
        }

        // Every later event belongs to the second loop.
        for _ in 0..3 {
            let event = next(&mut rx).await;
            assert_eq!(event.task_id(), "t2");
            assert_eq!(event.generation(), second);
        }
        poller.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_discards_in_flight_response() {
        let backend = Arc::new(FakeBackend::default());
        backend.set_status_delay(Duration::from_secs(5));
        backend.push_status(Ok(snap("completed", 100)));

        let poller = TaskPoller::new(backend.clone(), Duration::from_secs(1));
        let mut rx = poller.subscribe();
        poller.start("t1").await;

        // Let the first request go in flight, then stop.
        tokio::time::sleep(Duration::from_millis(100)).await;
        poller.stop().await;

        assert_matches!(next(&mut rx).await, TaskEvent::Aborted { .. });
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_matches!(rx.try_recv(), Err(broadcast::error::TryRecvError::Empty));
        assert_eq!(poller.state().await, PollState::Aborted);
    }
}
