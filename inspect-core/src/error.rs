use thiserror::Error;

/// Raised by the log store while executing a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("query execution failed: {0}")]
    Execution(String),
}

/// Outcome of a single page fetch that did not produce lines.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// No connection could be acquired right now. Retry the request.
    #[error("log source unavailable")]
    Unavailable,

    #[error(transparent)]
    Query(#[from] QueryError),

    /// A block lookup was asked for without a block snapshot.
    #[error("lookup needs {0}")]
    TargetShape(&'static str),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, FetchError::Unavailable)
    }
}

/// Everything that can stop a lookup from producing an outcome.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LookupError {
    #[error("you must be inside a claim to inspect")]
    NotInsideClaim,

    #[error("you need one of the roles {required:?} to inspect here")]
    PermissionDenied { required: Vec<String> },

    #[error("you must wait {remaining_millis}ms before inspecting again")]
    RateLimited { remaining_millis: i64 },

    #[error("page {requested} is past the lookup limit ({limit})")]
    QuotaExceeded { requested: u32, limit: u32 },

    #[error("page numbers start at 1")]
    InvalidPage,

    #[error("log source unavailable")]
    Unavailable,

    #[error("gave up after {attempts} attempts; log source unavailable")]
    Abandoned { attempts: u32 },

    #[error("lookup failed: {0}")]
    QueryFailure(String),

    #[error("lookup needs {0}")]
    InvalidTarget(&'static str),
}

impl From<FetchError> for LookupError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Unavailable => LookupError::Unavailable,
            FetchError::Query(QueryError::Execution(msg)) => LookupError::QueryFailure(msg),
            FetchError::TargetShape(what) => LookupError::InvalidTarget(what),
        }
    }
}
