use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{
    domain::{
        models::{ExecutionState, ProgressState},
        traits::{Cancelable, ProgressCallback, ProgressSink},
    },
    error::{Fault, WorkerError},
    infra::config::WorkerConfig,
};

use super::{
    cancellation::CancellationToken,
    events::{WorkerEvent, WorkerEvents},
    task::{Task, TaskBody},
};

pub const NO_TASK_MESSAGE: &str = "no task configured for background worker";

/// Runs one task at a time on its own thread and reports the outcome as
/// [`WorkerEvent`]s. Handles are cheap to clone and share the same worker.
pub struct BackgroundWorker<T> {
    inner: Arc<WorkerInner<T>>,
}

impl<T> Clone for BackgroundWorker<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

struct WorkerInner<T> {
    id: Uuid,
    config: WorkerConfig,
    events: mpsc::UnboundedSender<WorkerEvent<T>>,
    slot: Mutex<RunSlot<T>>,
    thread: Mutex<Option<JoinHandle<()>>>,
    // highest execution generation whose thread has returned
    exited: Mutex<u64>,
    exit_signal: Condvar,
}

struct RunSlot<T> {
    state: ExecutionState,
    generation: u64,
    token: CancellationToken,
    label: String,
    pending: Option<Task<T>>,
    stop_hook: Option<Arc<dyn Cancelable>>,
}

impl<T: Send + 'static> BackgroundWorker<T> {
    pub fn new(config: WorkerConfig) -> (Self, WorkerEvents<T>) {
        let (tx, events) = WorkerEvents::channel();
        let worker = Self {
            inner: Arc::new(WorkerInner {
                id: Uuid::new_v4(),
                config,
                events: tx,
                slot: Mutex::new(RunSlot {
                    state: ExecutionState::Idle,
                    generation: 0,
                    token: CancellationToken::new(),
                    label: String::new(),
                    pending: None,
                    stop_hook: None,
                }),
                thread: Mutex::new(None),
                exited: Mutex::new(0),
                exit_signal: Condvar::new(),
            }),
        };
        (worker, events)
    }

    /// Stores `task` for a later [`start`](Self::start) without running it.
    pub fn prepare(&self, task: Task<T>) {
        self.inner.slot.lock().pending = Some(task);
    }

    /// Launches the prepared task. Without one, an error event is emitted and
    /// no thread is started.
    pub fn start(&self) -> Result<(), WorkerError> {
        let mut slot = self.inner.slot.lock();
        if slot.state == ExecutionState::Running {
            return Err(WorkerError::AlreadyRunning(self.inner.id.to_string()));
        }
        match slot.pending.take() {
            Some(task) => self.launch(&mut slot, task),
            None => {
                warn!(worker_id = %self.inner.id, "start requested without a task");
                slot.state = ExecutionState::Failed;
                let _ = self
                    .inner
                    .events
                    .send(WorkerEvent::Error(NO_TASK_MESSAGE.to_string()));
                Ok(())
            }
        }
    }

    pub fn execute(&self, task: Task<T>) -> Result<(), WorkerError> {
        let mut slot = self.inner.slot.lock();
        if slot.state == ExecutionState::Running {
            return Err(WorkerError::AlreadyRunning(self.inner.id.to_string()));
        }
        slot.pending = None;
        self.launch(&mut slot, task)
    }

    /// Requests a cooperative stop and waits up to the configured timeout for
    /// the thread to return. Returns whether it did.
    pub fn cancel(&self) -> bool {
        let (generation, hook) = {
            let mut slot = self.inner.slot.lock();
            if slot.state.is_terminal() {
                drop(slot);
                return self.wait(Duration::ZERO);
            }
            let launched = slot.state == ExecutionState::Running;
            slot.token.cancel();
            slot.state = ExecutionState::Canceled;
            slot.pending = None;
            let _ = self.inner.events.send(WorkerEvent::Canceled);
            info!(worker_id = %self.inner.id, task = %slot.label, "background task canceled");
            if !launched {
                return true;
            }
            (slot.generation, slot.stop_hook.take())
        };

        if let Some(hook) = hook {
            if panic::catch_unwind(AssertUnwindSafe(|| hook.request_stop())).is_err() {
                debug!(worker_id = %self.inner.id, "stop hook panicked; ignored");
            }
        }

        let ended = self.inner.wait_for_exit(generation, self.inner.config.cancel_wait);
        if !ended {
            warn!(
                worker_id = %self.inner.id,
                wait_ms = self.inner.config.cancel_wait.as_millis() as u64,
                "worker thread still running after cancel wait"
            );
        }
        ended
    }

    /// Blocks until the current execution's thread has returned, or `timeout`.
    pub fn wait(&self, timeout: Duration) -> bool {
        let generation = self.inner.slot.lock().generation;
        self.inner.wait_for_exit(generation, timeout)
    }

    pub fn is_running_work(&self) -> bool {
        let slot = self.inner.slot.lock();
        slot.state == ExecutionState::Running && !slot.token.is_cancelled()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.slot.lock().token.is_cancelled()
    }

    pub fn state(&self) -> ExecutionState {
        self.inner.slot.lock().state
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    /// Label of the running task, or of the prepared one while nothing runs.
    pub fn label(&self) -> String {
        let slot = self.inner.slot.lock();
        match (&slot.pending, slot.state) {
            (Some(task), state) if state != ExecutionState::Running => task.label().to_string(),
            _ => slot.label.clone(),
        }
    }

    fn launch(&self, slot: &mut RunSlot<T>, task: Task<T>) -> Result<(), WorkerError> {
        let generation = slot.generation + 1;
        let token = CancellationToken::new();
        let label = task.label().to_string();
        let stop_hook = task.stop_hook();
        let (body, progress_override) = task.into_parts();
        let progress: ProgressCallback = match progress_override {
            Some(callback) => Arc::new(CallerSink {
                callback,
                token: token.clone(),
            }),
            None => Arc::new(ForwardingSink {
                inner: self.inner.clone(),
                generation,
                token: token.clone(),
            }),
        };

        slot.state = ExecutionState::Running;
        slot.generation = generation;
        slot.token = token;
        slot.label = label.clone();
        slot.stop_hook = stop_hook;

        let short_id = self.inner.id.simple().to_string();
        let name = format!(
            "{}-{}",
            self.inner.config.thread_name_prefix,
            &short_id[..8]
        );
        let inner = self.inner.clone();
        let spawned = thread::Builder::new()
            .name(name)
            .spawn(move || inner.run(generation, body, progress));

        match spawned {
            Ok(handle) => {
                info!(worker_id = %self.inner.id, task = %label, generation, "background task started");
                let mut thread = self.inner.thread.lock();
                if let Some(previous) = thread.replace(handle) {
                    if previous.is_finished() {
                        let _ = previous.join();
                    }
                }
                Ok(())
            }
            Err(err) => {
                error!(worker_id = %self.inner.id, task = %label, error = %err, "failed to spawn worker thread");
                slot.state = ExecutionState::Failed;
                self.inner.mark_exited(generation);
                Err(WorkerError::Spawn(err))
            }
        }
    }
}

impl<T: Send + 'static> WorkerInner<T> {
    fn run(
        &self,
        generation: u64,
        body: TaskBody<T>,
        progress: ProgressCallback,
    ) {
        let outcome = match panic::catch_unwind(AssertUnwindSafe(move || body(progress))) {
            Ok(result) => result,
            Err(payload) => Err(Fault::from_panic(payload)),
        };

        {
            let mut slot = self.slot.lock();
            let live = slot.generation == generation && slot.state == ExecutionState::Running;
            match outcome {
                Ok(value) if live => {
                    slot.state = ExecutionState::Finished;
                    let _ = self.events.send(WorkerEvent::Finished(value));
                    info!(worker_id = %self.id, task = %slot.label, "background task finished");
                }
                Ok(_) => {
                    debug!(worker_id = %self.id, generation, "result dropped after cancellation");
                }
                Err(fault) if live => {
                    slot.state = ExecutionState::Failed;
                    error!(
                        worker_id = %self.id,
                        task = %slot.label,
                        trace = %fault.trace(),
                        "background task failed: {fault}"
                    );
                    let _ = self.events.send(WorkerEvent::Error(fault.to_string()));
                }
                Err(fault) => {
                    // canceled work never reports
                    debug!(worker_id = %self.id, generation, error = %fault, "failure suppressed after cancellation");
                }
            }
        }

        self.mark_exited(generation);
    }

    fn mark_exited(&self, generation: u64) {
        let mut exited = self.exited.lock();
        *exited = (*exited).max(generation);
        self.exit_signal.notify_all();
    }

    fn wait_for_exit(&self, generation: u64, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        {
            let mut exited = self.exited.lock();
            while *exited < generation {
                if self
                    .exit_signal
                    .wait_until(&mut exited, deadline)
                    .timed_out()
                {
                    return *exited >= generation;
                }
            }
        }
        self.reap_thread();
        true
    }

    fn reap_thread(&self) {
        let mut thread = self.thread.lock();
        if thread.as_ref().is_some_and(|handle| handle.is_finished()) {
            if let Some(handle) = thread.take() {
                let _ = handle.join();
            }
        }
    }
}

/// Progress callback injected into tasks that did not bring their own.
struct ForwardingSink<T> {
    inner: Arc<WorkerInner<T>>,
    generation: u64,
    token: CancellationToken,
}

impl<T: Send + 'static> ProgressSink for ForwardingSink<T> {
    fn report(&self, current: i64, total: i64, message: &str) {
        if self.token.is_cancelled() {
            return;
        }
        let slot = self.inner.slot.lock();
        if slot.generation == self.generation && slot.state == ExecutionState::Running {
            let _ = self
                .inner
                .events
                .send(WorkerEvent::Progress(ProgressState::new(current, total, message)));
        }
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

/// Wraps a caller-supplied callback so the task still sees cancellation.
struct CallerSink {
    callback: ProgressCallback,
    token: CancellationToken,
}

impl ProgressSink for CallerSink {
    fn report(&self, current: i64, total: i64, message: &str) {
        self.callback.report(current, total, message);
    }

    fn is_cancelled(&self) -> bool {
        self.token.is_cancelled() || self.callback.is_cancelled()
    }
}
