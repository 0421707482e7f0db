use crate::{
    domain::traits::ProgressCallback,
    infra::{
        config::WorkerConfig,
        worker::{BackgroundWorker, Task, WorkerEvents, WorkerGroup},
    },
};

use super::ServiceResult;

/// New, unstarted worker. With an owner it is registered there and uses the
/// owner's configuration.
pub fn create_worker<T: Send + 'static>(
    owner: Option<&WorkerGroup>,
) -> (BackgroundWorker<T>, WorkerEvents<T>) {
    let config = owner
        .map(|group| group.config().clone())
        .unwrap_or_default();
    let (worker, events) = BackgroundWorker::new(config);
    if let Some(group) = owner {
        group.adopt(&worker);
    }
    (worker, events)
}

/// Creates a worker and starts `task` on it right away.
///
/// A `progress_callback` replaces the worker's own progress forwarding, so
/// progress then goes to the callback instead of the event stream.
pub fn run_in_background<T: Send + 'static>(
    task: Task<T>,
    progress_callback: Option<ProgressCallback>,
    owner: Option<&WorkerGroup>,
) -> ServiceResult<(BackgroundWorker<T>, WorkerEvents<T>)> {
    let (worker, events) = create_worker(owner);
    let task = match progress_callback {
        Some(callback) => task.with_progress(callback),
        None => task,
    };
    worker.execute(task)?;
    Ok((worker, events))
}

/// Same as [`run_in_background`] with an explicit configuration and no owner.
pub fn run_with_config<T: Send + 'static>(
    task: Task<T>,
    config: WorkerConfig,
) -> ServiceResult<(BackgroundWorker<T>, WorkerEvents<T>)> {
    let (worker, events) = BackgroundWorker::new(config);
    worker.execute(task)?;
    Ok((worker, events))
}
