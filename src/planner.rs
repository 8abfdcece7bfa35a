//! The planner: the public planning API.
//!
//! A [`Planner`] owns an [`ActionCatalog`] and a search algorithm and turns a
//! (start, goal) pair into a [`Plan`] or a typed failure. Planning is pure
//! computation: it never blocks, never mutates the catalog, and for fixed
//! inputs always returns the same plan.
//!
//! # Example
//!
//! ```
//! use infraplan::{Action, ActionCatalog, Planner, WorldState};
//!
//! let mut catalog = ActionCatalog::new();
//! catalog.add(Action::unit(
//!     "CreateVPC",
//!     WorldState::of([("vpc", false.into())]),
//!     WorldState::of([("vpc", true.into())]),
//! ).unwrap()).unwrap();
//! catalog.add(Action::unit(
//!     "CreateDB",
//!     WorldState::of([("vpc", true.into()), ("db", false.into())]),
//!     WorldState::of([("db", true.into())]),
//! ).unwrap()).unwrap();
//!
//! let planner = Planner::new(catalog);
//! let start = WorldState::of([("vpc", false.into()), ("db", false.into())]);
//! let goal = WorldState::of([("db", true.into())]);
//!
//! let plan = planner.plan(&start, &goal).unwrap();
//! assert_eq!(plan.len(), 2);
//! assert_eq!(plan.actions()[0].name(), "CreateVPC");
//! ```

use crate::catalog::ActionCatalog;
use crate::error::{GoapError, Result};
use crate::plan::Plan;
use crate::search::{AStarSearch, SearchAlgorithm};
use crate::state::WorldState;
use log::{debug, info};

/// Finds minimal-cost action sequences from a start state to a goal pattern.
pub struct Planner {
    catalog: ActionCatalog,
    search: Box<dyn SearchAlgorithm>,
}

impl Planner {
    /// Creates a planner using A* with the unmet-goal-keys heuristic.
    pub fn new(catalog: ActionCatalog) -> Self {
        Self {
            catalog,
            search: Box::new(AStarSearch::default()),
        }
    }

    /// Creates a planner with a custom search algorithm.
    pub fn with_search_algorithm(
        catalog: ActionCatalog,
        search: Box<dyn SearchAlgorithm>,
    ) -> Self {
        Self { catalog, search }
    }

    /// The catalog this planner plans over.
    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    /// Finds a plan transforming `start` into a state matching `goal`.
    ///
    /// Returns an empty plan when the goal is already satisfied. Fails fast
    /// with `UnreachableGoal` when the goal requires variable values no
    /// catalog action produces, without searching.
    pub fn plan(&self, start: &WorldState, goal: &WorldState) -> Result<Plan> {
        self.plan_inner(start, goal, None)
    }

    /// Like [`Planner::plan`], bounded to plans of at most `max_depth`
    /// actions to guarantee termination on adversarial catalogs.
    pub fn plan_bounded(
        &self,
        start: &WorldState,
        goal: &WorldState,
        max_depth: usize,
    ) -> Result<Plan> {
        self.plan_inner(start, goal, Some(max_depth))
    }

    fn plan_inner(
        &self,
        start: &WorldState,
        goal: &WorldState,
        max_depth: Option<usize>,
    ) -> Result<Plan> {
        if start.matches(goal) {
            debug!("goal {} already satisfied, empty plan", goal);
            return Ok(Plan::empty());
        }

        // Variables the goal requires but the start does not provide must be
        // producible by some effect, otherwise no search can succeed.
        let missing = self.catalog.unproducible(&start.unmet(goal));
        if !missing.is_empty() {
            return Err(GoapError::UnreachableGoal(missing.to_string()));
        }

        let plan = self.search.search(&self.catalog, start, goal, max_depth)?;
        info!("planned {} for goal {}", plan, goal);
        Ok(plan)
    }
}
