pub mod tracker;

pub use tracker::{ProgressTracker, DEFAULT_FINISH_MESSAGE};
