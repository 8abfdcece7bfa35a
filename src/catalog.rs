//! The action catalog: an ordered, name-unique collection of actions.
//!
//! Insertion order is preserved and is what makes planning deterministic:
//! when two candidate plans tie on cost, the planner prefers the action that
//! was registered first.
//!
//! The catalog is a static input to each planning call; the planner only ever
//! reads it. Mutation (`add`/`remove`) requires `&mut self`, so the borrow
//! checker enforces the exclusive-write/shared-read discipline.

use crate::action::Action;
use crate::error::{GoapError, Result};
use crate::state::WorldState;

/// Ordered collection of [`Action`]s with unique names.
#[derive(Debug, Clone, Default)]
pub struct ActionCatalog {
    actions: Vec<Action>,
}

impl ActionCatalog {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
        }
    }

    /// Adds an action at the end of the catalog.
    ///
    /// # Errors
    ///
    /// `DuplicateAction` if an action with the same name is already present.
    pub fn add(&mut self, action: Action) -> Result<()> {
        if self.get(action.name()).is_some() {
            return Err(GoapError::DuplicateAction(action.name().to_string()));
        }
        self.actions.push(action);
        Ok(())
    }

    /// Removes the action with the given name. No-op when absent.
    pub fn remove(&mut self, name: &str) {
        self.actions.retain(|a| a.name() != name);
    }

    /// Looks up an action by name.
    pub fn get(&self, name: &str) -> Option<&Action> {
        self.actions.iter().find(|a| a.name() == name)
    }

    /// All actions whose precondition equals `pattern` exactly.
    ///
    /// This is exact structural equality, not partial match; it supports
    /// catalog introspection, not planning.
    pub fn find_by_precondition(&self, pattern: &WorldState) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.precondition() == pattern)
            .collect()
    }

    /// All actions applicable from `state`, in catalog order.
    ///
    /// Hot path: called once per expanded search node, scans the catalog once.
    pub fn applicable_from(&self, state: &WorldState) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.applicable_in(state))
            .collect()
    }

    /// Every precondition and effect pattern any action declares, deduplicated.
    pub fn referenced_patterns(&self) -> Vec<&WorldState> {
        let mut patterns: Vec<&WorldState> = Vec::new();
        for action in &self.actions {
            for pattern in [action.precondition(), action.effect()] {
                if !patterns.contains(&pattern) {
                    patterns.push(pattern);
                }
            }
        }
        patterns
    }

    /// Checks whether every `(variable, value)` the goal requires is produced
    /// by at least one action effect.
    ///
    /// Returns the unproducible sub-pattern of the goal; empty means the goal
    /// is expressible in terms of what this catalog manipulates. The planner
    /// uses this to fail fast with `UnreachableGoal` instead of searching
    /// exhaustively.
    pub fn unproducible(&self, goal: &WorldState) -> WorldState {
        goal.iter()
            .filter(|(name, value)| {
                !self
                    .actions
                    .iter()
                    .any(|a| a.effect().get(name) == Some(*value))
            })
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Iterates actions in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }
}

impl<'a> IntoIterator for &'a ActionCatalog {
    type Item = &'a Action;
    type IntoIter = std::slice::Iter<'a, Action>;

    fn into_iter(self) -> Self::IntoIter {
        self.actions.iter()
    }
}
