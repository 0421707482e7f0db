use std::{any::Any, fmt, io};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("worker {0} is already running a task")]
    AlreadyRunning(String),
    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
    #[error("invalid worker configuration: {0}")]
    Config(String),
}

/// A failure raised by the body of a task, already flattened for reporting.
#[derive(Debug, Clone)]
pub struct Fault {
    kind: String,
    description: String,
    trace: String,
}

impl Fault {
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        let description = description.into();
        Self {
            kind: kind.into(),
            trace: description.clone(),
            description,
        }
    }

    /// Captures the error's concrete type name before erasing it into `anyhow`.
    ///
    /// Opaque wrappers (`anyhow::Error`, boxed trait objects, `io::Error`) are
    /// named after their root cause when it is a well-known std or serde_json
    /// error; otherwise the kind stays `Error`.
    pub fn from_error<E>(err: E) -> Self
    where
        E: Into<anyhow::Error> + 'static,
    {
        let mut kind = short_type_name::<E>();
        let err: anyhow::Error = err.into();
        if kind == "Error" || kind.starts_with("Box<dyn ") {
            kind = err
                .chain()
                .last()
                .and_then(known_error_kind)
                .unwrap_or("Error")
                .to_string();
        }
        Self {
            kind,
            description: err.to_string(),
            trace: format!("{err:?}"),
        }
    }

    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let description = if let Some(msg) = payload.downcast_ref::<&str>() {
            (*msg).to_string()
        } else if let Some(msg) = payload.downcast_ref::<String>() {
            msg.clone()
        } else {
            "task panicked with a non-string payload".to_string()
        };
        Self::new("Panic", description)
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn trace(&self) -> &str {
        &self.trace
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.description)
    }
}

fn known_error_kind(err: &(dyn std::error::Error + 'static)) -> Option<&'static str> {
    macro_rules! kind_of {
        ($($ty:ty => $name:literal),* $(,)?) => {
            $(if err.is::<$ty>() {
                return Some($name);
            })*
        };
    }
    kind_of! {
        io::Error => "io::Error",
        std::num::ParseIntError => "ParseIntError",
        std::num::ParseFloatError => "ParseFloatError",
        std::num::TryFromIntError => "TryFromIntError",
        std::str::ParseBoolError => "ParseBoolError",
        std::str::Utf8Error => "Utf8Error",
        std::string::FromUtf8Error => "FromUtf8Error",
        fmt::Error => "fmt::Error",
        serde_json::Error => "serde_json::Error",
        chrono::ParseError => "chrono::ParseError",
    }
    None
}

// `core::num::ParseIntError` -> `ParseIntError`, `Vec<foo::Bar>` -> `Vec<Bar>`
fn short_type_name<T: ?Sized>() -> String {
    let full = std::any::type_name::<T>();
    let mut out = String::with_capacity(full.len());
    let mut segment = String::new();
    for ch in full.chars() {
        match ch {
            ':' => segment.clear(),
            '<' | '>' | ',' | ' ' | '&' | '(' | ')' | '[' | ']' | ';' => {
                out.push_str(&segment);
                segment.clear();
                out.push(ch);
            }
            _ => segment.push(ch),
        }
    }
    out.push_str(&segment);
    out
}
