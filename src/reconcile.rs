//! The reconciliation loop: observe, plan, execute, verify, replan.
//!
//! A [`Reconciler`] drives real infrastructure toward a goal state. Each
//! cycle it observes the world through its sensors, asks the [`Planner`] for
//! a plan, and executes the plan one action at a time. Before every action
//! the precondition is re-checked against the latest observation; after every
//! action the world is re-observed and compared with the state the action's
//! effect predicted. Any mismatch (external drift, an operation that did not
//! do what the model said) triggers a bounded replan rather than blind
//! continuation.
//!
//! Phases: `Planning -> Executing -> Verifying -> (Completed | Replanning |
//! Failed)`, with `Replanning` feeding back into `Planning` at most
//! `max_replans` times.

use std::time::Duration;

use log::{debug, info, warn};

use crate::error::GoapError;
use crate::executor::{ActionExecutor, ExecOutcome};
use crate::plan::Plan;
use crate::planner::Planner;
use crate::sensor::Sensors;
use crate::state::WorldState;

/// Tuning knobs for a reconciliation run.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Maximum number of replanning cycles before giving up (livelock valve).
    pub max_replans: usize,
    /// Optional bound on plan length passed to the planner.
    pub max_depth: Option<usize>,
    /// How often a failed observation round is retried before failing.
    pub observe_retries: usize,
    /// Base delay between observation retries; grows linearly per attempt.
    pub backoff: Duration,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            max_replans: 5,
            max_depth: None,
            observe_retries: 3,
            backoff: Duration::from_millis(250),
        }
    }
}

/// Terminal outcome of a reconciliation run. Both variants carry the last
/// observed state so drift can be diagnosed.
#[derive(Debug)]
pub enum ReconcileOutcome {
    Completed {
        final_state: WorldState,
    },
    Failed {
        reason: GoapError,
        last_state: WorldState,
    },
}

impl ReconcileOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, ReconcileOutcome::Completed { .. })
    }

    pub fn last_state(&self) -> &WorldState {
        match self {
            ReconcileOutcome::Completed { final_state } => final_state,
            ReconcileOutcome::Failed { last_state, .. } => last_state,
        }
    }
}

/// What happened while walking one plan.
enum PlanRun {
    /// Every action executed and verified.
    Finished(WorldState),
    /// Drift or a retryable failure; carries the freshest observation.
    NeedsReplan(WorldState),
}

/// Drives the observe-plan-execute-verify cycle for one goal.
pub struct Reconciler {
    planner: Planner,
    sensors: Sensors,
    executor: Box<dyn ActionExecutor>,
    config: ReconcilerConfig,
}

impl Reconciler {
    pub fn new(planner: Planner, sensors: Sensors, executor: Box<dyn ActionExecutor>) -> Self {
        Self::with_config(planner, sensors, executor, ReconcilerConfig::default())
    }

    pub fn with_config(
        planner: Planner,
        sensors: Sensors,
        executor: Box<dyn ActionExecutor>,
        config: ReconcilerConfig,
    ) -> Self {
        Self {
            planner,
            sensors,
            executor,
            config,
        }
    }

    /// Runs reconciliation until the observed world matches `goal`, a fatal
    /// error occurs, or the replan limit is hit.
    pub async fn reconcile(&self, goal: &WorldState) -> ReconcileOutcome {
        let mut replans = 0usize;

        let mut state = match self.observe().await {
            Ok(state) => state,
            Err((reason, last_state)) => {
                return ReconcileOutcome::Failed { reason, last_state }
            }
        };

        loop {
            // Planning.
            info!("planning toward {} from {}", goal, state);
            let plan = match self.plan(&state, goal) {
                Ok(plan) => plan,
                Err(reason) => {
                    return ReconcileOutcome::Failed {
                        reason,
                        last_state: state,
                    }
                }
            };

            // Executing + Verifying.
            state = match self.run_plan(&plan, state).await {
                Ok(PlanRun::Finished(final_state)) if final_state.matches(goal) => {
                    info!("goal {} reached", goal);
                    return ReconcileOutcome::Completed {
                        final_state,
                    };
                }
                Ok(PlanRun::Finished(state)) | Ok(PlanRun::NeedsReplan(state)) => state,
                Err((reason, last_state)) => {
                    return ReconcileOutcome::Failed { reason, last_state }
                }
            };

            // Replanning.
            replans += 1;
            if replans > self.config.max_replans {
                warn!("replan limit of {} exceeded", self.config.max_replans);
                return ReconcileOutcome::Failed {
                    reason: GoapError::ReplanLimitExceeded,
                    last_state: state,
                };
            }
            debug!("replanning (cycle {replans}) from {state}");
        }
    }

    fn plan(&self, state: &WorldState, goal: &WorldState) -> crate::error::Result<Plan> {
        match self.config.max_depth {
            Some(depth) => self.planner.plan_bounded(state, goal, depth),
            None => self.planner.plan(state, goal),
        }
    }

    /// Walks one plan action by action. Executions are strictly sequential:
    /// the next action starts only after the previous one verified.
    async fn run_plan(
        &self,
        plan: &Plan,
        mut state: WorldState,
    ) -> Result<PlanRun, (GoapError, WorldState)> {
        for action in plan {
            // The world may have moved since planning; the plan is only
            // valid while preconditions keep holding.
            if !state.matches(action.precondition()) {
                warn!(
                    "drift before {}: state {} no longer matches {}",
                    action,
                    state,
                    action.precondition()
                );
                return Ok(PlanRun::NeedsReplan(state));
            }

            let outcome = self
                .executor
                .execute(action)
                .await
                .map_err(|e| (e, state.clone()))?;

            match outcome {
                ExecOutcome::Success(response) => {
                    debug!("{} succeeded: {}", action, response);
                }
                ExecOutcome::Failure { retryable: true, response } => {
                    warn!("{} failed retryably: {}", action, response);
                    let state = self.observe().await?;
                    return Ok(PlanRun::NeedsReplan(state));
                }
                ExecOutcome::Failure { retryable: false, response } => {
                    let reason = GoapError::Execution {
                        action: action.name().to_string(),
                        retryable: false,
                        detail: response.output().to_string(),
                    };
                    return Err((reason, state));
                }
            }

            // Verify the world did what the model predicted.
            let predicted = action.simulate(&state);
            let observed = self.observe().await?;
            if !observed.matches(&predicted) {
                warn!(
                    "verification after {} failed: observed {}, predicted {}",
                    action, observed, predicted
                );
                return Ok(PlanRun::NeedsReplan(observed));
            }
            state = observed;
        }

        Ok(PlanRun::Finished(state))
    }

    /// One observation round with bounded retry and linear backoff.
    /// On exhaustion the first failure of the last round is the reason and
    /// the partial snapshot is preserved for diagnosis.
    async fn observe(&self) -> Result<WorldState, (GoapError, WorldState)> {
        let mut attempt = 0usize;
        loop {
            let round = self.sensors.observe_all().await;
            match round.failures.into_iter().next() {
                None => return Ok(round.state),
                Some((binding, err)) => {
                    attempt += 1;
                    if attempt > self.config.observe_retries {
                        warn!("observation of {binding} failed after {attempt} attempts");
                        return Err((GoapError::Observation(err), round.state));
                    }
                }
            }
            tokio::time::sleep(self.config.backoff * attempt as u32).await;
        }
    }
}
