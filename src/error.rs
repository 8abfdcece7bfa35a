use thiserror::Error;

/// Why a planning search gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanFailure {
    /// Every plan reaching the goal would be longer than the depth bound.
    DepthExceeded,
    /// The reachable state space was fully explored without matching the goal.
    Exhausted,
}

impl std::fmt::Display for PlanFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlanFailure::DepthExceeded => write!(f, "depth limit exceeded"),
            PlanFailure::Exhausted => write!(f, "search space exhausted"),
        }
    }
}

/// A failed observation of a single world-state variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservationError {
    /// The sensor did not answer within its timeout.
    Timeout(String),
    /// The sensor process or connection could not be driven at all.
    Transport(String),
    /// The sensor answered, but its output could not be parsed into a value.
    Malformed(String),
}

impl std::fmt::Display for ObservationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObservationError::Timeout(detail) => write!(f, "timeout: {detail}"),
            ObservationError::Transport(detail) => write!(f, "transport failure: {detail}"),
            ObservationError::Malformed(detail) => write!(f, "malformed response: {detail}"),
        }
    }
}

/// Error type covering catalog construction, planning, observation and execution.
#[derive(Error, Debug)]
pub enum GoapError {
    /// An action with the same name is already registered in the catalog.
    #[error("action already in catalog: {0}")]
    DuplicateAction(String),

    /// A sensor with the same name is already registered.
    #[error("sensor already in collection: {0}")]
    DuplicateSensor(String),

    /// Action costs must be strictly positive.
    #[error("action cost must be positive")]
    InvalidActionCost,

    /// The goal asks for variable values no action effect ever produces.
    #[error("goal is unreachable with this catalog: no action produces {0}")]
    UnreachableGoal(String),

    /// The search finished without a plan.
    #[error("no plan found: {0}")]
    PlanNotFound(PlanFailure),

    /// A sensor reading failed for this cycle.
    #[error("observation failed: {0}")]
    Observation(ObservationError),

    /// An action executor reported failure.
    #[error("execution of {action} failed (retryable: {retryable}): {detail}")]
    Execution {
        action: String,
        retryable: bool,
        detail: String,
    },

    /// The reconciliation loop replanned too many times without converging.
    #[error("replan limit exceeded")]
    ReplanLimitExceeded,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for GOAP operations.
pub type Result<T> = std::result::Result<T, GoapError>;
