use thiserror::Error;

// ---------------------------------------------------------------------------
// Recoverable conditions
// ---------------------------------------------------------------------------
//
// None of these are fatal. Each is returned to the caller, logged, and the
// owning state holder stays in (or falls back to) a safe baseline.

/// Structural problems found while building a [`crate::data::model::Dataset`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DatasetError {
    #[error("duplicate record identity '{0}'")]
    DuplicateIdentity(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AggregateError {
    #[error("primary key '{0}' is not present in the aggregate")]
    NotFound(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum NavigationError {
    #[error("segment '{requested}' is outside the displayed group '{current}'")]
    OutOfScope { current: String, requested: String },
    #[error("the detail list has no forward transition")]
    TerminalLevel,
    #[error("a secondary key is required to open the detail list")]
    MissingSecondary,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnimationError {
    #[error("no animatable categories")]
    NoAnimatableCategories,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SelectionError {
    #[error("record '{0}' is not in the current view")]
    NotInCurrentView(String),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum MediaError {
    #[error("no media for key '{0}'")]
    NotFound(String),
    #[error("media lookup failed: {0}")]
    Io(String),
    #[error("media worker is gone")]
    Worker,
    #[error("media lookup timed out")]
    Timeout,
}
