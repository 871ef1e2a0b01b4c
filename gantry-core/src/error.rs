// Error types for the Gantry engine

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// A single error raised while validating or executing a request.
/// Field errors identify the offending input; info errors carry a message only.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ErrItem {
    Field {
        field: String,
        value: String,
        message: String,
    },
    Info {
        message: String,
    },
}

impl ErrItem {
    pub fn on(field: &str, value: &str, message: &str) -> Self {
        ErrItem::Field {
            field: field.to_string(),
            value: value.to_string(),
            message: message.to_string(),
        }
    }

    pub fn of(message: &str) -> Self {
        ErrItem::Info {
            message: message.to_string(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ErrItem::Field { message, .. } => message,
            ErrItem::Info { message } => message,
        }
    }
}

impl fmt::Display for ErrItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrItem::Field {
                field,
                value,
                message,
            } => write!(f, "{field}='{value}': {message}"),
            ErrItem::Info { message } => write!(f, "{message}"),
        }
    }
}

/// One or more errors plus an overall description.
/// The description is never empty; constructors fall back to a generic one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Errors {
    pub message: String,
    pub items: Vec<ErrItem>,
}

impl Errors {
    pub fn of(message: &str) -> Self {
        Self {
            message: non_empty(message),
            items: Vec::new(),
        }
    }

    pub fn field(field: &str, value: &str, message: &str) -> Self {
        Self {
            message: non_empty(message),
            items: vec![ErrItem::on(field, value, message)],
        }
    }

    pub fn list(items: Vec<ErrItem>, message: &str) -> Self {
        Self {
            message: non_empty(message),
            items,
        }
    }

    /// Error lines numbered for diagnostics, one per item.
    pub fn numbered(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, e)| format!("{}. {e}", i + 1))
            .collect()
    }
}

impl fmt::Display for Errors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            write!(f, "{}", self.message)
        } else {
            let details: Vec<String> = self.items.iter().map(|e| e.to_string()).collect();
            write!(f, "{}: {}", self.message, details.join(", "))
        }
    }
}

fn non_empty(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        "error".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Engine error type. `Domain` marks an expected failure raised by a target,
/// which the invocation boundary unwraps back into an `Errored` outcome;
/// every other variant is reclassified as `Unexpected`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("duplicate route: {0}")]
    DuplicateRoute(String),

    #[error("invalid registration: {0}")]
    Registration(String),

    #[error("{0}")]
    Domain(Errors),

    #[error("invocation failed: {0}")]
    Invocation(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Raise an expected domain failure from inside a target method.
    pub fn domain(message: &str) -> Self {
        Error::Domain(Errors::of(message))
    }
}
