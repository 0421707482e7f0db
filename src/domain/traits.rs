use std::sync::Arc;

/// Receives `(current, total, message)` updates from a task.
///
/// Closures of the matching shape implement this directly.
pub trait ProgressSink: Send + Sync {
    fn report(&self, current: i64, total: i64, message: &str);

    /// Lets long-running loops poll for a stop request between steps.
    fn is_cancelled(&self) -> bool {
        false
    }
}

impl<F> ProgressSink for F
where
    F: Fn(i64, i64, &str) + Send + Sync,
{
    fn report(&self, current: i64, total: i64, message: &str) {
        self(current, total, message)
    }
}

pub type ProgressCallback = Arc<dyn ProgressSink>;

/// Optional stop capability of whatever object a task is bound to.
///
/// A worker calls `request_stop` once when it is canceled. Implementations
/// should only flip internal state; they must not wait for the task to end.
pub trait Cancelable: Send + Sync {
    fn request_stop(&self);
}
