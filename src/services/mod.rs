use crate::error::WorkerError;

pub type ServiceResult<T> = Result<T, WorkerError>;

pub mod background_service;

// short imports: `use crate::services::run_in_background;`
pub use background_service::{create_worker, run_in_background, run_with_config};
