//! Best-first search over world states.
//!
//! Nodes are [`WorldState`]s, edges are catalog actions whose precondition
//! matches the source node, and edge cost is the action's weight. The default
//! algorithm is A* with the standard GOAP heuristic (count of goal variables
//! not yet satisfied); Dijkstra is A* with a zero heuristic.
//!
//! Determinism: successors are generated in catalog insertion order and the
//! open set breaks cost ties by a monotone insertion sequence, so a fixed
//! catalog, start and goal always produce the identical plan.

use crate::action::Action;
use crate::catalog::ActionCatalog;
use crate::error::{GoapError, PlanFailure, Result};
use crate::plan::Plan;
use crate::state::WorldState;
use log::{debug, trace};
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// Interface for planning search algorithms.
pub trait SearchAlgorithm: Send + Sync {
    /// Finds an action sequence transforming `start` into a state matching
    /// `goal`, optionally bounded to plans of at most `max_depth` actions.
    fn search(
        &self,
        catalog: &ActionCatalog,
        start: &WorldState,
        goal: &WorldState,
        max_depth: Option<usize>,
    ) -> Result<Plan>;
}

/// An estimate of the remaining cost from a state to the goal.
pub trait Heuristic: Send + Sync {
    fn estimate(&self, state: &WorldState, goal: &WorldState) -> f32;
}

/// Counts the goal variables the state does not yet satisfy.
///
/// Admissible because every action changes only the variables its effect
/// declares and costs are at least positive, so each unmet goal variable
/// needs at least one more action.
pub struct UnmetGoalKeys;

impl Heuristic for UnmetGoalKeys {
    fn estimate(&self, state: &WorldState, goal: &WorldState) -> f32 {
        state.unmet(goal).len() as f32
    }
}

/// Zero estimate; turns A* into Dijkstra.
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    fn estimate(&self, _state: &WorldState, _goal: &WorldState) -> f32 {
        0.0
    }
}

/// A node in the search graph.
struct Node {
    state: WorldState,
    parent: Option<usize>,
    /// Action that produced this state from the parent.
    action: Option<Action>,
    g_cost: f32,
    depth: usize,
}

/// Open-set entry: ordered by f-cost, ties broken by insertion sequence so
/// earlier-generated (catalog-order) successors win.
struct OpenEntry {
    f_cost: f32,
    seq: u64,
    node_idx: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f_cost == other.f_cost && self.seq == other.seq
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .partial_cmp(&other.f_cost)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

/// Bookkeeping for one search run.
struct SearchContext {
    nodes: Vec<Node>,
    open: BinaryHeap<Reverse<OpenEntry>>,
    /// Best g-cost seen per state; a state reached again with equal or higher
    /// cost is not re-queued. Required because effects can be identity and
    /// different action orders revisit the same state.
    best_g: HashMap<WorldState, f32>,
    closed: HashSet<WorldState>,
    seq: u64,
}

impl SearchContext {
    fn new(start: &WorldState, h0: f32) -> Self {
        let mut ctx = Self {
            nodes: Vec::new(),
            open: BinaryHeap::new(),
            best_g: HashMap::new(),
            closed: HashSet::new(),
            seq: 0,
        };
        ctx.nodes.push(Node {
            state: start.clone(),
            parent: None,
            action: None,
            g_cost: 0.0,
            depth: 0,
        });
        ctx.best_g.insert(start.clone(), 0.0);
        ctx.push_open(0, h0);
        ctx
    }

    fn push_open(&mut self, node_idx: usize, h_cost: f32) {
        let f_cost = self.nodes[node_idx].g_cost + h_cost;
        let seq = self.seq;
        self.seq += 1;
        self.open.push(Reverse(OpenEntry {
            f_cost,
            seq,
            node_idx,
        }));
    }

    /// Pops the next unexplored node, skipping entries whose state was
    /// already expanded.
    fn next_node(&mut self) -> Option<usize> {
        while let Some(Reverse(entry)) = self.open.pop() {
            let state = &self.nodes[entry.node_idx].state;
            if !self.closed.contains(state) {
                self.closed.insert(state.clone());
                return Some(entry.node_idx);
            }
        }
        None
    }

    /// Records a successor state if it improves on the best known cost.
    /// Returns the new node index, or None when the state is dominated.
    fn offer_successor(&mut self, parent_idx: usize, action: &Action) -> Option<usize> {
        let parent = &self.nodes[parent_idx];
        let state = action.simulate(&parent.state);
        let g_cost = parent.g_cost + action.cost();
        let depth = parent.depth + 1;

        if let Some(&known) = self.best_g.get(&state) {
            if known <= g_cost {
                return None;
            }
        }
        self.best_g.insert(state.clone(), g_cost);

        let idx = self.nodes.len();
        self.nodes.push(Node {
            state,
            parent: Some(parent_idx),
            action: Some(action.clone()),
            g_cost,
            depth,
        });
        Some(idx)
    }

    /// Walks parents back to the start and returns the action sequence.
    fn reconstruct(&self, mut node_idx: usize) -> Plan {
        let mut actions = Vec::new();
        loop {
            let node = &self.nodes[node_idx];
            if let Some(action) = &node.action {
                actions.push(action.clone());
            }
            match node.parent {
                Some(parent_idx) => node_idx = parent_idx,
                None => break,
            }
        }
        actions.reverse();
        Plan::from_actions(actions)
    }
}

/// A* search with a pluggable heuristic.
pub struct AStarSearch {
    heuristic: Box<dyn Heuristic>,
}

impl AStarSearch {
    pub fn new(heuristic: Box<dyn Heuristic>) -> Self {
        Self { heuristic }
    }
}

impl Default for AStarSearch {
    fn default() -> Self {
        Self::new(Box::new(UnmetGoalKeys))
    }
}

impl SearchAlgorithm for AStarSearch {
    fn search(
        &self,
        catalog: &ActionCatalog,
        start: &WorldState,
        goal: &WorldState,
        max_depth: Option<usize>,
    ) -> Result<Plan> {
        if start.matches(goal) {
            return Ok(Plan::empty());
        }

        let mut ctx = SearchContext::new(start, self.heuristic.estimate(start, goal));
        let mut depth_pruned = false;
        let mut expanded = 0usize;

        while let Some(node_idx) = ctx.next_node() {
            expanded += 1;
            let state = ctx.nodes[node_idx].state.clone();
            let depth = ctx.nodes[node_idx].depth;

            if state.matches(goal) {
                let plan = ctx.reconstruct(node_idx);
                debug!(
                    "plan found after expanding {} states: {}",
                    expanded, plan
                );
                return Ok(plan);
            }

            if let Some(limit) = max_depth {
                if depth >= limit {
                    depth_pruned = true;
                    continue;
                }
            }

            for action in catalog.applicable_from(&state) {
                if let Some(succ_idx) = ctx.offer_successor(node_idx, action) {
                    trace!("queueing {} from {}", action.name(), state);
                    let h = self.heuristic.estimate(&ctx.nodes[succ_idx].state, goal);
                    ctx.push_open(succ_idx, h);
                }
            }
        }

        debug!(
            "search failed after expanding {} states (depth pruned: {})",
            expanded, depth_pruned
        );
        if depth_pruned {
            Err(GoapError::PlanNotFound(PlanFailure::DepthExceeded))
        } else {
            Err(GoapError::PlanNotFound(PlanFailure::Exhausted))
        }
    }
}

/// Dijkstra's algorithm: A* with a zero heuristic.
#[derive(Default)]
pub struct DijkstraSearch;

impl SearchAlgorithm for DijkstraSearch {
    fn search(
        &self,
        catalog: &ActionCatalog,
        start: &WorldState,
        goal: &WorldState,
        max_depth: Option<usize>,
    ) -> Result<Plan> {
        AStarSearch::new(Box::new(ZeroHeuristic)).search(catalog, start, goal, max_depth)
    }
}
