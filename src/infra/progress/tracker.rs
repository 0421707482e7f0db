use chrono::Utc;

use crate::domain::{
    models::{ProgressSnapshot, ProgressState},
    traits::ProgressCallback,
};

pub const DEFAULT_FINISH_MESSAGE: &str = "완료";

/// Accumulates progress inside a task and pushes every change to one callback.
///
/// Typically built from the callback a worker injects into its task and
/// dropped when the task returns.
pub struct ProgressTracker {
    callback: Option<ProgressCallback>,
    state: ProgressState,
    updated_at: i64,
}

impl ProgressTracker {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self {
            callback,
            state: ProgressState::default(),
            updated_at: current_time_ms(),
        }
    }

    /// Overwrites only the provided fields, then reports the full triple.
    pub fn update(&mut self, current: Option<i64>, total: Option<i64>, message: Option<&str>) {
        if let Some(current) = current {
            self.state.current = current;
        }
        if let Some(total) = total {
            self.state.total = total;
        }
        if let Some(message) = message {
            self.state.message = message.to_string();
        }
        self.updated_at = current_time_ms();

        if let Some(callback) = &self.callback {
            callback.report(self.state.current, self.state.total, &self.state.message);
        }
    }

    pub fn increment(&mut self, message: Option<&str>) {
        self.update(Some(self.state.current + 1), None, message);
    }

    pub fn set_total(&mut self, total: i64) {
        self.update(None, Some(total), None);
    }

    pub fn finish(&mut self, message: Option<&str>) {
        let total = self.state.total;
        self.update(
            Some(total),
            Some(total),
            Some(message.unwrap_or(DEFAULT_FINISH_MESSAGE)),
        );
    }

    pub fn state(&self) -> &ProgressState {
        &self.state
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            state: self.state.clone(),
            updated_at: self.updated_at,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.callback
            .as_ref()
            .map(|callback| callback.is_cancelled())
            .unwrap_or(false)
    }
}

fn current_time_ms() -> i64 {
    Utc::now().timestamp_millis()
}
