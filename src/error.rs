use std::fmt;

/// Errors surfaced by clients and controllers.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// A mutation was attempted with no resolvable caller.
    #[error("not authenticated")]
    NotAuthenticated,

    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    #[error("remote: {0}")]
    Remote(#[from] RemoteError),

    /// A submission from the same form is still in flight.
    #[error("a submission is already in progress")]
    Busy,

    #[error("form is not open")]
    FormClosed,

    /// The owning component was disposed while the operation was running;
    /// its result was discarded.
    #[error("component disposed before the operation completed")]
    Disposed,
}

/// Failure reported by the remote store. The detail is for logs and
/// diagnostics; users only ever see a generic per-resource message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    #[error("{table} row {id} not found")]
    NotFound { table: &'static str, id: String },

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<anyhow::Error> for RemoteError {
    fn from(e: anyhow::Error) -> Self {
        RemoteError::Query(format!("{:#}", e))
    }
}

/// Problems found while coercing raw form input, one entry per field.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationError {
    pub fields: Vec<FieldError>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub problem: Problem,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Problem {
    Missing,
    NotACount(String),
    NotANumber(String),
    NotADate(String),
    NotAllowed { value: String, allowed: &'static [&'static str] },
    Malformed(String),
}

impl ValidationError {
    pub fn push(&mut self, field: &'static str, problem: Problem) {
        self.fields.push(FieldError { field, problem });
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// The problem reported for `field`, if any.
    pub fn problem(&self, field: &str) -> Option<&Problem> {
        self.fields.iter().find(|e| e.field == field).map(|e| &e.problem)
    }
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.fields.iter().map(ToString::to_string).collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.problem)
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Problem::Missing => write!(f, "is required"),
            Problem::NotACount(v) => write!(f, "'{}' is not a whole number of zero or more", v),
            Problem::NotANumber(v) => write!(f, "'{}' is not a number", v),
            Problem::NotADate(v) => write!(f, "'{}' is not a date (YYYY-MM-DD)", v),
            Problem::NotAllowed { value, allowed } => {
                write!(f, "'{}' must be one of {}", value, allowed.join(", "))
            }
            Problem::Malformed(msg) => write!(f, "{}", msg),
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
