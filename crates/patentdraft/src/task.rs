//! Background generation pipeline.
//!
//! A [`GenerationTask`] runs compose → generate → name → write on the Tokio
//! runtime and reports through a single-fire channel held by its
//! [`TaskHandle`]. Cancellation is cooperative: a flag checked at every stage
//! boundary. A remote call already in flight is allowed to finish, but its result
//! is dropped and nothing is written.
//!
//! Cancellation is silent. A task that observes the flag ends in
//! [`TaskState::Cancelled`] without sending anything, so the handle's outcome
//! resolves to `None`. Callers should read that as "nothing more to show".

use crate::client::CompletionBackend;
use crate::config::ConfigStore;
use crate::error::Error;
use crate::naming;
use patentdraft_core::prompt::{compose, preview};
use patentdraft_core::request::{
    FailureReason, GenerationOutcome, GenerationRequest, Stage, TaskState,
};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::io::AsyncWriteExt;
use tokio::sync::oneshot;

/// Number of idea characters echoed to the log.
const IDEAS_PREVIEW_CHARS: usize = 50;

/// State shared between a running task and its handles.
#[derive(Debug)]
struct Control {
    cancel_requested: AtomicBool,
    state: Mutex<TaskState>,
}

impl Control {
    fn new(state: TaskState) -> Self {
        Self {
            cancel_requested: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> TaskState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, state: TaskState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn request_cancel(&self) {
        if !self.state().is_terminal() {
            self.cancel_requested.store(true, Ordering::SeqCst);
        }
    }

    /// Stage-boundary check. Moves the task to `Cancelled` when the flag is set.
    fn cancelled_before(&self, stage: Stage) -> bool {
        if !self.cancel_requested.load(Ordering::SeqCst) {
            return false;
        }

        log::info!("Cancellation observed before the {stage} stage; discarding work");
        self.set_state(TaskState::Cancelled);
        true
    }

    fn fail(&self, reason: FailureReason) -> GenerationOutcome {
        log::error!("Generation failed: {reason}");
        self.set_state(TaskState::Failed);
        GenerationOutcome::Failure { reason }
    }
}

/// One user-initiated generation, not yet started.
pub struct GenerationTask {
    request: GenerationRequest,
    backend: Arc<dyn CompletionBackend>,
    control: Arc<Control>,
}

impl GenerationTask {
    pub fn new(request: GenerationRequest, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            request,
            backend,
            control: Arc::new(Control::new(TaskState::Idle)),
        }
    }

    pub fn state(&self) -> TaskState {
        self.control.state()
    }

    /// Move to `Running` and spawn the pipeline, returning immediately.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(self) -> TaskHandle {
        let (sender, receiver) = oneshot::channel();
        let control = self.control;
        control.set_state(TaskState::Running);

        let worker = tokio::spawn(execute(self.request, self.backend, Arc::clone(&control)));

        let supervisor_control = Arc::clone(&control);
        tokio::spawn(async move {
            let outcome = match worker.await {
                Ok(outcome) => outcome,
                // A panic inside the pipeline still owes the caller an outcome.
                Err(join_error) => Some(
                    supervisor_control.fail(FailureReason::Aborted(join_error.to_string())),
                ),
            };

            if let Some(outcome) = outcome {
                if sender.send(outcome).is_err() {
                    log::debug!("Outcome dropped: the task handle is gone");
                }
            }
        });

        TaskHandle { control, receiver }
    }
}

/// The pipeline body. `None` means the task was cancelled.
async fn execute(
    request: GenerationRequest,
    backend: Arc<dyn CompletionBackend>,
    control: Arc<Control>,
) -> Option<GenerationOutcome> {
    log::info!("Generating disclosure for '{}'", request.title());
    log::info!(
        "Technical ideas: {}",
        preview(request.ideas(), IDEAS_PREVIEW_CHARS)
    );

    if control.cancelled_before(Stage::Compose) {
        return None;
    }
    let prompt = compose(request.title(), request.ideas());
    log::debug!("Composed prompt: {} characters", prompt.chars().count());

    if control.cancelled_before(Stage::Generate) {
        return None;
    }
    let generated = backend.complete(&prompt, request.config()).await;

    // Checked before looking at the result: once cancelled, even a failed call stays silent.
    if control.cancelled_before(Stage::Name) {
        return None;
    }
    let content = match generated {
        Ok(content) => content,
        Err(err) => return Some(control.fail(err.into())),
    };
    log::debug!("Model returned {} characters", content.chars().count());

    let title = request.title().to_string();
    let dir = request.destination_dir().to_path_buf();
    let resolved = tokio::task::spawn_blocking(move || naming::resolve(&title, &dir)).await;
    let saved_path = match resolved {
        Ok(Ok(path)) => path,
        Ok(Err(err)) => return Some(control.fail(err.into())),
        Err(err) => return Some(control.fail(FailureReason::Aborted(err.to_string()))),
    };

    if control.cancelled_before(Stage::Write) {
        return None;
    }
    if let Err(err) = write_document(&saved_path, &content).await {
        return Some(control.fail(FailureReason::Write(format!(
            "{}: {err}",
            saved_path.display()
        ))));
    }

    log::info!("Disclosure saved to {}", saved_path.display());
    control.set_state(TaskState::Completed);

    Some(GenerationOutcome::Success {
        content,
        saved_path,
    })
}

/// Create `path` exclusively and write `content`, removing the file on failure.
async fn write_document(path: &Path, content: &str) -> std::io::Result<()> {
    let mut file = tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await?;

    let written = async {
        file.write_all(content.as_bytes()).await?;
        file.flush().await?;
        file.sync_all().await
    }
    .await;

    if written.is_err() {
        drop(file);
        if let Err(cleanup) = tokio::fs::remove_file(path).await {
            log::warn!("Failed to remove partial file {}: {cleanup}", path.display());
        }
    }

    written
}

/// Cloneable handle that can only request cancellation.
#[derive(Debug, Clone)]
pub struct Canceller {
    control: Arc<Control>,
}

impl Canceller {
    pub fn cancel(&self) {
        self.control.request_cancel();
    }
}

/// Caller-side view of a started task.
#[derive(Debug)]
pub struct TaskHandle {
    control: Arc<Control>,
    receiver: oneshot::Receiver<GenerationOutcome>,
}

impl TaskHandle {
    /// Ask the task to stop at its next stage boundary. No effect once terminal.
    pub fn cancel(&self) {
        self.control.request_cancel();
    }

    pub fn canceller(&self) -> Canceller {
        Canceller {
            control: Arc::clone(&self.control),
        }
    }

    pub fn state(&self) -> TaskState {
        self.control.state()
    }

    /// Non-blocking poll for hosts that drive their own event loop.
    ///
    /// Yields the outcome at most once; afterwards, and for cancelled tasks,
    /// it returns `None`.
    pub fn try_outcome(&mut self) -> Option<GenerationOutcome> {
        self.receiver.try_recv().ok()
    }

    /// Wait for the outcome. `None` means the task was cancelled.
    pub async fn outcome(self) -> Option<GenerationOutcome> {
        self.receiver.await.ok()
    }

    /// Wait for the outcome and hand it to `callback` in the awaiting context.
    ///
    /// The callback is not invoked for a cancelled task.
    pub async fn on_outcome<F>(self, callback: F)
    where
        F: FnOnce(GenerationOutcome),
    {
        if let Some(outcome) = self.outcome().await {
            callback(outcome);
        }
    }
}

/// Entry point for the presentation layer: builds requests from the shared
/// configuration and keeps at most one task in flight.
pub struct Generator {
    store: Arc<ConfigStore>,
    backend: Arc<dyn CompletionBackend>,
    in_flight: Mutex<Option<Arc<Control>>>,
}

impl Generator {
    pub fn new(store: Arc<ConfigStore>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            store,
            backend,
            in_flight: Mutex::new(None),
        }
    }

    /// Build a request against a validated snapshot of the current configuration.
    pub fn request(
        &self,
        title: &str,
        ideas: &str,
        destination_dir: impl Into<PathBuf>,
    ) -> Result<GenerationRequest, Error> {
        let config = self.store.validated()?;
        Ok(GenerationRequest::new(title, ideas, config, destination_dir)?)
    }

    /// Start `request` unless another task is still running.
    pub fn start_generation(&self, request: GenerationRequest) -> Result<TaskHandle, Error> {
        request.config().validate()?;

        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(control) = slot.as_ref() {
            if !control.state().is_terminal() {
                log::warn!("Rejected generation request: another task is running");
                return Err(Error::Busy);
            }
        }

        let handle = GenerationTask::new(request, Arc::clone(&self.backend)).start();
        *slot = Some(Arc::clone(&handle.control));

        Ok(handle)
    }

    /// Check the endpoint with the current configuration snapshot.
    pub async fn test_connection(&self) -> bool {
        crate::client::test_connection(self.backend.as_ref(), &self.store.snapshot()).await
    }
}
