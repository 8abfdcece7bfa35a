//! Actions: named, guarded state transformations.
//!
//! An [`Action`] models one discrete infrastructure operation (create a VPC,
//! start a database, destroy an application) as:
//! - a `precondition`: a partial [`WorldState`] pattern that must match the
//!   current state for the action to be applicable
//! - an `effect`: a partial [`WorldState`] patch applied on top of the current
//!   state to produce the successor state
//! - a positive `cost` used by the planner (1.0 unless the domain says
//!   otherwise)
//!
//! Applying an action is a pure function of the input state: the planner
//! relies on `simulate` producing the same successor for the same input.
//!
//! # Example
//!
//! ```
//! use infraplan::{Action, WorldState};
//!
//! let create_db = Action::unit(
//!     "CreateDB",
//!     WorldState::of([("vpc", true.into()), ("db", false.into())]),
//!     WorldState::of([("db", true.into())]),
//! ).unwrap();
//!
//! let state = WorldState::of([("vpc", true.into()), ("db", false.into())]);
//! assert!(create_db.applicable_in(&state));
//! assert_eq!(create_db.simulate(&state).get("db"), Some(&true.into()));
//! ```

use crate::error::{GoapError, Result};
use crate::state::WorldState;
use std::fmt;

/// Captured output of an action execution, as reported by an executor.
///
/// Shell-backed executors fill stdout/stderr/exit status; API-backed
/// executors map their response body and status code onto the same shape.
#[derive(Debug, Clone)]
pub struct ActionResponse {
    stdout: String,
    stderr: String,
    return_code: i32,
}

impl ActionResponse {
    /// Creates a response, trimming trailing newlines from both streams.
    pub fn new(stdout: String, stderr: String, return_code: i32) -> Self {
        Self {
            stdout: stdout.trim_end_matches(['\r', '\n']).to_string(),
            stderr: stderr.trim_end_matches(['\r', '\n']).to_string(),
            return_code,
        }
    }

    pub fn stdout(&self) -> &str {
        &self.stdout
    }

    pub fn stderr(&self) -> &str {
        &self.stderr
    }

    pub fn return_code(&self) -> i32 {
        self.return_code
    }

    /// Stdout when present, stderr otherwise.
    pub fn output(&self) -> &str {
        if !self.stdout.is_empty() {
            &self.stdout
        } else {
            &self.stderr
        }
    }

    /// A return code of 0 is success, anything else failure.
    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }
}

impl fmt::Display for ActionResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rc {})", self.output(), self.return_code)
    }
}

/// A named transformation guarded by a precondition and producing an effect.
///
/// The name identifies the action to executors and in plans; equality is
/// defined over the `(precondition, effect)` pair only, so two differently
/// named actions with identical semantics compare equal.
#[derive(Debug, Clone)]
pub struct Action {
    name: String,
    cost: f32,
    precondition: WorldState,
    effect: WorldState,
}

impl Action {
    /// Creates an action with an explicit cost.
    ///
    /// # Errors
    ///
    /// `InvalidActionCost` if `cost` is zero, negative or not finite.
    pub fn new(
        name: impl Into<String>,
        cost: f32,
        precondition: WorldState,
        effect: WorldState,
    ) -> Result<Self> {
        if !cost.is_finite() || cost <= 0.0 {
            return Err(GoapError::InvalidActionCost);
        }
        Ok(Self {
            name: name.into(),
            cost,
            precondition,
            effect,
        })
    }

    /// Creates an action with the default unit cost.
    pub fn unit(
        name: impl Into<String>,
        precondition: WorldState,
        effect: WorldState,
    ) -> Result<Self> {
        Self::new(name, 1.0, precondition, effect)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn precondition(&self) -> &WorldState {
        &self.precondition
    }

    pub fn effect(&self) -> &WorldState {
        &self.effect
    }

    /// True iff `state` matches this action's precondition.
    pub fn applicable_in(&self, state: &WorldState) -> bool {
        state.matches(&self.precondition)
    }

    /// The successor state this action predicts: `state.apply(effect)`.
    ///
    /// Pure and deterministic; the real world is checked against this
    /// prediction during verification.
    pub fn simulate(&self, state: &WorldState) -> WorldState {
        state.apply(&self.effect)
    }
}

impl PartialEq for Action {
    /// Value equality over precondition and effect; the name is identity,
    /// not part of equality.
    fn eq(&self, other: &Self) -> bool {
        self.precondition == other.precondition && self.effect == other.effect
    }
}

impl Eq for Action {}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
