pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

pub use domain::{
    models::{ExecutionState, ProgressSnapshot, ProgressState},
    traits::{Cancelable, ProgressCallback, ProgressSink},
};
pub use error::{Fault, WorkerError};
pub use infra::{
    config::WorkerConfig,
    progress::ProgressTracker,
    worker::{BackgroundWorker, Task, WorkerEvent, WorkerEvents, WorkerGroup, WorkerObserver},
};
pub use services::{create_worker, run_in_background};
