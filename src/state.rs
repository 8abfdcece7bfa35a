//! World state representation for infrastructure GOAP planning.
//!
//! A [`WorldState`] is an immutable snapshot of named variables and their
//! observed (or simulated) values. It is used for:
//! - the current state of the infrastructure, as assembled from sensors
//! - goal states, usually partial (only the variables that matter)
//! - action preconditions and effects, always partial
//!
//! Variables are not restricted to booleans: a database may be absent
//! (`false`), present (`true`), `"started"`, `"stopped"` or `"not_health"`.
//!
//! # Example
//!
//! ```
//! use infraplan::WorldState;
//!
//! let current = WorldState::of([("vpc", true.into()), ("db", "stopped".into())]);
//! let goal = WorldState::of([("db", "started".into())]);
//!
//! assert!(!current.matches(&goal));
//!
//! // States are values: applying a patch produces a new state.
//! let next = current.apply(&goal);
//! assert!(next.matches(&goal));
//! assert_eq!(current.get("db"), Some(&"stopped".into()));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// The value of a single world-state variable.
///
/// Infrastructure state is multi-valued: `Bool(false)` conventionally means a
/// resource is absent, `Bool(true)` that it exists, and strings carry
/// lifecycle phases such as `"started"` or `"not_health"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value {
    Bool(bool),
    Str(String),
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// An immutable mapping from variable name to [`Value`].
///
/// `WorldState` is a value type: every transition produces a new state via
/// [`WorldState::apply`], never an in-place mutation of a shared snapshot.
/// Comparison between two states is structural over the full variable map.
#[derive(Debug, Clone, Default)]
pub struct WorldState {
    vars: HashMap<String, Value>,
}

impl WorldState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    /// Builds a state from `(name, value)` pairs.
    ///
    /// ```
    /// use infraplan::WorldState;
    ///
    /// let state = WorldState::of([("vpc", false.into()), ("db", false.into())]);
    /// assert_eq!(state.len(), 2);
    /// ```
    pub fn of<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (&'static str, Value)>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }

    /// Gets the value of a variable, if observed.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    /// Sets a variable during construction of a snapshot.
    ///
    /// This is for building a state from observations; once a state is handed
    /// to the planner it is treated as immutable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Number of variables in this state.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True if the state has no variables.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates over `(name, value)` pairs in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.vars.iter()
    }

    /// Partial-match test: true iff every variable in `pattern` is present
    /// here with an equal value. Variables absent from the pattern are
    /// unconstrained. This is the precondition and goal test used throughout.
    ///
    /// ```
    /// use infraplan::WorldState;
    ///
    /// let state = WorldState::of([("vpc", true.into()), ("db", true.into())]);
    /// assert!(state.matches(&WorldState::of([("vpc", true.into())])));
    /// assert!(!state.matches(&WorldState::of([("app", true.into())])));
    /// ```
    pub fn matches(&self, pattern: &WorldState) -> bool {
        pattern
            .vars
            .iter()
            .all(|(name, value)| self.vars.get(name) == Some(value))
    }

    /// Returns a new state equal to this one with every variable in `effect`
    /// overwritten (or added); variables not mentioned are carried over.
    ///
    /// Applying an effect is total: keys never present in the receiver are
    /// simply added.
    pub fn apply(&self, effect: &WorldState) -> Self {
        let mut next = self.clone();
        for (name, value) in effect.vars.iter() {
            next.vars.insert(name.clone(), value.clone());
        }
        next
    }

    /// The sub-pattern of `pattern` this state does not yet satisfy.
    ///
    /// Used by the search heuristic (count of unmet goal variables) and for
    /// diagnostics when a goal turns out to be unreachable.
    pub fn unmet(&self, pattern: &WorldState) -> WorldState {
        let vars = pattern
            .vars
            .iter()
            .filter(|(name, value)| self.vars.get(*name) != Some(*value))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        Self { vars }
    }
}

impl From<HashMap<String, Value>> for WorldState {
    fn from(vars: HashMap<String, Value>) -> Self {
        Self { vars }
    }
}

impl From<WorldState> for HashMap<String, Value> {
    fn from(state: WorldState) -> Self {
        state.vars
    }
}

impl FromIterator<(String, Value)> for WorldState {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self {
            vars: iter.into_iter().collect(),
        }
    }
}

impl PartialEq for WorldState {
    /// Structural equality over the full variable map, independent of
    /// insertion order. Used to deduplicate states during search.
    fn eq(&self, other: &Self) -> bool {
        self.vars == other.vars
    }
}

impl Eq for WorldState {}

impl Hash for WorldState {
    /// Hashes variables in sorted name order so the hash is independent of
    /// insertion order, consistent with [`PartialEq`].
    fn hash<H: Hasher>(&self, hasher: &mut H) {
        let mut items: Vec<_> = self.vars.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        for (name, value) in items {
            name.hash(hasher);
            value.hash(hasher);
        }
    }
}

impl fmt::Display for WorldState {
    /// Formats as `{name: value, ...}` in sorted name order.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut items: Vec<_> = self.vars.iter().collect();
        items.sort_by(|a, b| a.0.cmp(b.0));
        write!(f, "{{")?;
        for (i, (name, value)) in items.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", name, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_subset() {
        let state = WorldState::of([
            ("vpc", true.into()),
            ("db", "started".into()),
            ("app", false.into()),
        ]);

        assert!(state.matches(&WorldState::of([("vpc", true.into())])));
        assert!(state.matches(&WorldState::of([
            ("vpc", true.into()),
            ("db", "started".into()),
        ])));
        // Empty pattern is unconstrained.
        assert!(state.matches(&WorldState::new()));
    }

    #[test]
    fn test_matches_rejects_differing_value() {
        let state = WorldState::of([("db", "started".into())]);
        assert!(!state.matches(&WorldState::of([("db", "stopped".into())])));
        assert!(!state.matches(&WorldState::of([("db", true.into())])));
    }

    #[test]
    fn test_matches_rejects_missing_key() {
        let state = WorldState::of([("vpc", true.into())]);
        assert!(!state.matches(&WorldState::of([("db", true.into())])));
    }

    #[test]
    fn test_apply_overwrites_and_adds() {
        let base = WorldState::of([("vpc", true.into()), ("db", false.into())]);
        let effect = WorldState::of([("db", true.into()), ("app", false.into())]);

        let next = base.apply(&effect);
        assert_eq!(next.get("vpc"), Some(&true.into()));
        assert_eq!(next.get("db"), Some(&true.into()));
        assert_eq!(next.get("app"), Some(&false.into()));

        // Receiver unchanged.
        assert_eq!(base.get("db"), Some(&false.into()));
        assert_eq!(base.get("app"), None);
    }

    #[test]
    fn test_effects_always_take_hold() {
        let base = WorldState::of([("vpc", false.into())]);
        let effect = WorldState::of([("vpc", true.into()), ("db", "stopped".into())]);
        assert!(base.apply(&effect).matches(&effect));
    }

    #[test]
    fn test_unmet() {
        let state = WorldState::of([("vpc", true.into()), ("db", false.into())]);
        let goal = WorldState::of([
            ("vpc", true.into()),
            ("db", true.into()),
            ("app", true.into()),
        ]);

        let unmet = state.unmet(&goal);
        assert_eq!(unmet.len(), 2);
        assert_eq!(unmet.get("db"), Some(&true.into()));
        assert_eq!(unmet.get("app"), Some(&true.into()));
        assert_eq!(unmet.get("vpc"), None);
    }

    #[test]
    fn test_equality_and_hash_ignore_insertion_order() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut a = WorldState::new();
        a.set("vpc", true);
        a.set("db", "started");

        let mut b = WorldState::new();
        b.set("db", "started");
        b.set("vpc", true);

        assert_eq!(a, b);

        let mut ha = DefaultHasher::new();
        a.hash(&mut ha);
        let mut hb = DefaultHasher::new();
        b.hash(&mut hb);
        assert_eq!(ha.finish(), hb.finish());
    }

    #[test]
    fn test_display_sorted() {
        let state = WorldState::of([("vpc", true.into()), ("app", "started".into())]);
        assert_eq!(state.to_string(), "{app: started, vpc: true}");
    }
}
