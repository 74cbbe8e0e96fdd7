use thiserror::Error;

/// Failure taxonomy for the bridge. Nothing here is fatal to the
/// process; every error is a per-call value the caller can retry.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed identifier or out-of-range field, rejected before any
    /// external call is made.
    #[error("{0}")]
    Validation(String),

    /// The host reported that a record does not exist. Classified
    /// heuristically from error text; see [`classify_script_failure`].
    #[error("{0}")]
    NotFound(String),

    /// osascript exited non-zero or failed to launch. The message is
    /// the host-supplied combined output, trimmed.
    #[error("applescript error: {0}")]
    Script(String),

    /// sqlite3 exited non-zero or failed to launch.
    #[error("sqlite3 error: {0}")]
    Store(String),

    /// A delegated write never became visible in the store within the
    /// polling budget.
    #[error("{0}")]
    Timeout(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Script,
    Store,
    Timeout,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Validation(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Script(_) => ErrorKind::Script,
            Error::Store(_) => ErrorKind::Store,
            Error::Timeout(_) => ErrorKind::Timeout,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }
}

/// Phrases Things 3 emits when a record lookup fails. The automation
/// interface has no structured error codes, so substring matching on
/// the message text is the only available signal.
const NOT_FOUND_PHRASES: &[&str] = &["not found", "can't get", "cannot find", "couldn't find"];

/// Classifies a failed script execution into `NotFound` or `Script`.
/// This is the single place the not-found heuristic lives; it is
/// best-effort by nature and must not be duplicated elsewhere.
pub(crate) fn classify_script_failure(message: String) -> Error {
    let lowered = message.to_lowercase();
    if NOT_FOUND_PHRASES.iter().any(|p| lowered.contains(p)) {
        Error::NotFound(message)
    } else {
        Error::Script(message)
    }
}
