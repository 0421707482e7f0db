use std::{fmt, str::FromStr};

use serde::{de::Error as DeError, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::WorkerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    Idle,
    Running,
    Canceled,
    Finished,
    Failed,
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionState {
    type Err = WorkerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "idle" => Ok(ExecutionState::Idle),
            "running" => Ok(ExecutionState::Running),
            "canceled" | "cancelled" => Ok(ExecutionState::Canceled),
            "finished" => Ok(ExecutionState::Finished),
            "failed" => Ok(ExecutionState::Failed),
            other => Err(WorkerError::Config(format!(
                "invalid execution state: {other}"
            ))),
        }
    }
}

impl ExecutionState {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ExecutionState::Idle => "idle",
            ExecutionState::Running => "running",
            ExecutionState::Canceled => "canceled",
            ExecutionState::Finished => "finished",
            ExecutionState::Failed => "failed",
        }
    }

    /// Finished, failed and canceled executions never emit again.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Canceled | ExecutionState::Finished | ExecutionState::Failed
        )
    }
}

impl Serialize for ExecutionState {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ExecutionState {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        ExecutionState::from_str(&value).map_err(DeError::custom)
    }
}
