use std::{fmt, sync::Arc};

use crate::{
    domain::traits::{Cancelable, ProgressCallback},
    error::Fault,
};

pub(crate) type TaskBody<T> = Box<dyn FnOnce(ProgressCallback) -> Result<T, Fault> + Send + 'static>;

/// One unit of work: a closure with its captured arguments, consumed when run.
pub struct Task<T> {
    label: String,
    body: TaskBody<T>,
    stop_hook: Option<Arc<dyn Cancelable>>,
    progress: Option<ProgressCallback>,
}

impl<T: Send + 'static> Task<T> {
    pub fn new<F, E>(label: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(ProgressCallback) -> Result<T, E> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        Self {
            label: label.into(),
            body: Box::new(move |progress| body(progress).map_err(Fault::from_error)),
            stop_hook: None,
            progress: None,
        }
    }

    /// Binds the task to `receiver`, whose `request_stop` runs on cancel.
    pub fn bound<R, F, E>(label: impl Into<String>, receiver: Arc<R>, body: F) -> Self
    where
        R: Cancelable + 'static,
        F: FnOnce(&R, ProgressCallback) -> Result<T, E> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        let hook: Arc<dyn Cancelable> = receiver.clone();
        Self::new(label, move |progress| body(&receiver, progress)).with_stop_hook(hook)
    }

    pub fn with_stop_hook(mut self, hook: Arc<dyn Cancelable>) -> Self {
        self.stop_hook = Some(hook);
        self
    }

    /// A caller-supplied callback takes precedence over the worker's own.
    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = Some(progress);
        self
    }
}

impl<T> Task<T> {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn has_progress_override(&self) -> bool {
        self.progress.is_some()
    }

    pub(crate) fn stop_hook(&self) -> Option<Arc<dyn Cancelable>> {
        self.stop_hook.clone()
    }

    pub(crate) fn into_parts(self) -> (TaskBody<T>, Option<ProgressCallback>) {
        (self.body, self.progress)
    }
}

impl<T> fmt::Debug for Task<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("stop_hook", &self.stop_hook.is_some())
            .field("progress", &self.progress.is_some())
            .finish()
    }
}
