pub mod execution_state;
pub mod progress;

pub use execution_state::ExecutionState;
pub use progress::{ProgressSnapshot, ProgressState};
