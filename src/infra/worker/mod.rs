pub mod background;
pub mod cancellation;
pub mod events;
pub mod group;
pub mod task;

pub use background::BackgroundWorker;
pub use cancellation::CancellationToken;
pub use events::{WorkerEvent, WorkerEvents, WorkerObserver};
pub use group::{ManagedWorker, WorkerGroup};
pub use task::Task;
