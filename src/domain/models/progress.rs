use serde::{Deserialize, Serialize};

/// `(current, total, message)` as reported by a running task.
///
/// Values are not bounds-checked: `current` may exceed `total` and negative
/// numbers are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub current: i64,
    pub total: i64,
    pub message: String,
}

impl ProgressState {
    pub fn new(current: i64, total: i64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSnapshot {
    #[serde(flatten)]
    pub state: ProgressState,
    pub updated_at: i64,
}
