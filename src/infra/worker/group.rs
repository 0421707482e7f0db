use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::{domain::models::ExecutionState, infra::config::WorkerConfig};

use super::background::BackgroundWorker;

/// Type-erased view of a worker, so one owner can hold workers of any result type.
pub trait ManagedWorker: Send + Sync {
    fn id(&self) -> Uuid;
    fn is_running_work(&self) -> bool;
    fn state(&self) -> ExecutionState;
    fn cancel(&self) -> bool;
}

impl<T: Send + 'static> ManagedWorker for BackgroundWorker<T> {
    fn id(&self) -> Uuid {
        BackgroundWorker::id(self)
    }

    fn is_running_work(&self) -> bool {
        BackgroundWorker::is_running_work(self)
    }

    fn state(&self) -> ExecutionState {
        BackgroundWorker::state(self)
    }

    fn cancel(&self) -> bool {
        BackgroundWorker::cancel(self)
    }
}

/// Owning context for workers. Whatever is still running when the group is
/// shut down or dropped gets canceled.
pub struct WorkerGroup {
    config: WorkerConfig,
    workers: Mutex<IndexMap<Uuid, Arc<dyn ManagedWorker>>>,
}

impl WorkerGroup {
    pub fn new(config: WorkerConfig) -> Self {
        Self {
            config,
            workers: Mutex::new(IndexMap::new()),
        }
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Registers `worker`, dropping finished ones so the group stays bounded.
    pub fn adopt<T: Send + 'static>(&self, worker: &BackgroundWorker<T>) {
        let mut workers = self.workers.lock();
        workers.retain(|_, owned| !owned.state().is_terminal());
        workers.insert(worker.id(), Arc::new(worker.clone()));
    }

    pub fn len(&self) -> usize {
        self.workers.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.lock().is_empty()
    }

    pub fn contains(&self, id: Uuid) -> bool {
        self.workers.lock().contains_key(&id)
    }

    /// Ids of workers still busy, in adoption order.
    pub fn running(&self) -> Vec<Uuid> {
        self.workers
            .lock()
            .values()
            .filter(|worker| worker.is_running_work())
            .map(|worker| worker.id())
            .collect()
    }

    /// Forgets finished, failed and canceled workers. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let mut workers = self.workers.lock();
        let before = workers.len();
        workers.retain(|_, worker| !worker.state().is_terminal());
        before - workers.len()
    }

    /// Cancels every running worker and empties the group.
    pub fn shutdown(&self) -> usize {
        // cancel blocks, so run it outside the registry lock
        let owned: Vec<_> = self.workers.lock().drain(..).map(|(_, w)| w).collect();
        let mut canceled = 0;
        for worker in owned.iter().filter(|worker| worker.is_running_work()) {
            worker.cancel();
            canceled += 1;
        }
        if canceled > 0 {
            info!(canceled, "worker group shut down");
        }
        canceled
    }
}

impl Default for WorkerGroup {
    fn default() -> Self {
        Self::new(WorkerConfig::default())
    }
}

impl Drop for WorkerGroup {
    fn drop(&mut self) {
        self.shutdown();
    }
}
