//! Plans: the ordered action sequences the planner returns.

use crate::action::Action;
use std::fmt;

/// An ordered sequence of actions that transforms a start state into one
/// matching the goal, together with the cumulative cost of those actions.
///
/// Immutable once returned by the planner. An empty plan (goal already
/// satisfied) has cost 0.
#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    actions: Vec<Action>,
    cost: f32,
}

impl Plan {
    /// An empty plan with cost 0.
    pub fn empty() -> Self {
        Self {
            actions: Vec::new(),
            cost: 0.0,
        }
    }

    /// Builds a plan from an ordered action sequence, summing the costs.
    pub fn from_actions(actions: Vec<Action>) -> Self {
        let cost = actions.iter().map(Action::cost).sum();
        Self { actions, cost }
    }

    /// The actions in execution order.
    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Cumulative cost of the plan.
    pub fn cost(&self) -> f32 {
        self.cost
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}

impl fmt::Display for Plan {
    /// Formats as `CreateVPC -> CreateDB -> CreateApp (cost 3)`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.actions.is_empty() {
            return write!(f, "<empty plan>");
        }
        let names: Vec<_> = self.actions.iter().map(|a| a.name()).collect();
        write!(f, "{} (cost {})", names.join(" -> "), self.cost)
    }
}
