use thiserror::Error;

/// Fatal conditions that abort a run. Anything recoverable (a missing
/// previous-week column, an unreadable score cell) never reaches this type.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("week header not found in weekly log: {0:?}")]
    WeekColumnNotFound(String),

    #[error("no \"{0}'s Students\" block in weekly log")]
    StaffBlockNotFound(String),

    #[error("staff roster is empty; configure default_staff or provide a staff table")]
    EmptyStaffRoster,

    #[error("invalid column pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("cutoff for {category} must be within [0, 1], got {value}")]
    InvalidCutoff { category: String, value: f64 },

    #[error("column position for {field} must be 1 or greater")]
    InvalidColumn { field: String },
}

pub type EngineResult<T> = Result<T, EngineError>;
