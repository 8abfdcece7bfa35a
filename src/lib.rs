//! Goal-Oriented Action Planning (GOAP) for infrastructure lifecycle
//! management.
//!
//! Declare the world you want as a [`WorldState`], describe what your tooling
//! can do as [`Action`]s in an [`ActionCatalog`], and let the [`Planner`]
//! search for the cheapest action sequence that gets there. The
//! [`Reconciler`] closes the loop against real infrastructure: it observes
//! the world through [`Sensors`], executes plans through an
//! [`ActionExecutor`], verifies every step, and replans when reality drifts
//! from the model.
//!
//! ```
//! use infraplan::{Action, ActionCatalog, Planner, WorldState};
//!
//! let mut catalog = ActionCatalog::new();
//! catalog.add(Action::unit(
//!     "CreateVPC",
//!     WorldState::of([("vpc", false.into())]),
//!     WorldState::of([("vpc", true.into())]),
//! )?)?;
//!
//! let planner = Planner::new(catalog);
//! let plan = planner.plan(
//!     &WorldState::of([("vpc", false.into())]),
//!     &WorldState::of([("vpc", true.into())]),
//! )?;
//! assert_eq!(plan.len(), 1);
//! # Ok::<(), infraplan::GoapError>(())
//! ```

mod action;
mod catalog;
mod error;
mod executor;
mod plan;
mod planner;
mod reconcile;
mod search;
mod sensor;
mod state;

pub use action::{Action, ActionResponse};
pub use catalog::ActionCatalog;
pub use error::{GoapError, ObservationError, PlanFailure, Result};
pub use executor::{
    classify_api_response, http_success, ActionExecutor, ExecOutcome, FnExecutor, ShellExecutor,
};
pub use plan::Plan;
pub use planner::Planner;
pub use reconcile::{ReconcileOutcome, Reconciler, ReconcilerConfig};
pub use search::{
    AStarSearch, DijkstraSearch, Heuristic, SearchAlgorithm, UnmetGoalKeys, ZeroHeuristic,
};
pub use sensor::{
    FnSensor, Observation, ObservationRound, Sensor, SensorFn, Sensors, ShellSensor,
};
pub use state::{Value, WorldState};
