use infraplan::{
    Action, ActionCatalog, ActionExecutor, ActionResponse, ExecOutcome, FnExecutor, FnSensor,
    GoapError, Observation, PlanFailure, Planner, ReconcileOutcome, Reconciler, ReconcilerConfig,
    Sensor, Sensors, Value, WorldState,
};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[cfg(test)]
mod tests {
    use super::*;

    /// The full VPC / database / application lifecycle: nine actions over
    /// boolean existence flags and string-valued run states.
    fn lifecycle_catalog() -> ActionCatalog {
        let mut catalog = ActionCatalog::new();
        let actions = [
            (
                "CreateVPC",
                vec![("vpc", Value::Bool(false))],
                vec![("vpc", Value::Bool(true))],
            ),
            (
                "CreateDB",
                vec![("vpc", Value::Bool(true)), ("db", Value::Bool(false))],
                vec![("db", Value::Bool(true)), ("db_state", "started".into())],
            ),
            (
                "StopDB",
                vec![("db", Value::Bool(true)), ("db_state", "started".into())],
                vec![("db_state", "stopped".into())],
            ),
            (
                "StartDB",
                vec![("db", Value::Bool(true)), ("db_state", "stopped".into())],
                vec![("db_state", "started".into())],
            ),
            (
                "DestroyDB",
                vec![("db", Value::Bool(true)), ("db_state", "stopped".into())],
                vec![("db", Value::Bool(false))],
            ),
            (
                "CreateApp",
                vec![
                    ("vpc", Value::Bool(true)),
                    ("db", Value::Bool(true)),
                    ("app", Value::Bool(false)),
                ],
                vec![("app", Value::Bool(true)), ("app_state", "started".into())],
            ),
            (
                "StopApp",
                vec![("app", Value::Bool(true)), ("app_state", "started".into())],
                vec![("app_state", "stopped".into())],
            ),
            (
                "StartApp",
                vec![("app", Value::Bool(true)), ("app_state", "stopped".into())],
                vec![("app_state", "started".into())],
            ),
            (
                "DestroyApp",
                vec![("app", Value::Bool(true)), ("app_state", "stopped".into())],
                vec![("app", Value::Bool(false))],
            ),
        ];
        for (name, pre, eff) in actions {
            let pre = pre.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            let eff = eff.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
            catalog.add(Action::unit(name, pre, eff).unwrap()).unwrap();
        }
        catalog
    }

    fn bare_metal() -> WorldState {
        WorldState::of([
            ("vpc", false.into()),
            ("db", false.into()),
            ("app", false.into()),
        ])
    }

    fn plan_names(plan: &infraplan::Plan) -> Vec<&str> {
        plan.actions().iter().map(|a| a.name()).collect()
    }

    #[test]
    fn test_provisioning_chain() {
        let planner = Planner::new(lifecycle_catalog());
        let goal = WorldState::of([("app", true.into()), ("app_state", "started".into())]);

        let plan = planner.plan(&bare_metal(), &goal).unwrap();

        assert_eq!(plan_names(&plan), ["CreateVPC", "CreateDB", "CreateApp"]);
        assert_eq!(plan.cost(), 3.0);
    }

    #[test]
    fn test_goal_already_satisfied_yields_empty_plan() {
        let planner = Planner::new(lifecycle_catalog());
        let current = WorldState::of([
            ("vpc", true.into()),
            ("db", true.into()),
            ("db_state", "started".into()),
        ]);
        let goal = WorldState::of([("db_state", "started".into())]);

        let plan = planner.plan(&current, &goal).unwrap();
        assert!(plan.is_empty());
        assert_eq!(plan.cost(), 0.0);
    }

    #[test]
    fn test_stop_running_database() {
        let planner = Planner::new(lifecycle_catalog());
        let current = WorldState::of([
            ("vpc", true.into()),
            ("db", true.into()),
            ("db_state", "started".into()),
        ]);
        let goal = WorldState::of([("db_state", "stopped".into())]);

        let plan = planner.plan(&current, &goal).unwrap();
        assert_eq!(plan_names(&plan), ["StopDB"]);
    }

    #[test]
    fn test_teardown_inserts_required_stop() {
        // DestroyApp requires the app stopped; the planner supplies the
        // StopApp step on its own.
        let planner = Planner::new(lifecycle_catalog());
        let current = WorldState::of([
            ("vpc", true.into()),
            ("db", true.into()),
            ("db_state", "started".into()),
            ("app", true.into()),
            ("app_state", "started".into()),
        ]);
        let goal = WorldState::of([("app", false.into())]);

        let plan = planner.plan(&current, &goal).unwrap();
        assert_eq!(plan_names(&plan), ["StopApp", "DestroyApp"]);
    }

    #[test]
    fn test_unreachable_goal_is_detected_before_search() {
        let planner = Planner::new(lifecycle_catalog());
        let goal = WorldState::of([("dns", true.into())]);

        let result = planner.plan(&bare_metal(), &goal);
        assert!(matches!(result, Err(GoapError::UnreachableGoal(_))));
    }

    #[test]
    fn test_depth_bound_is_a_typed_failure() {
        let planner = Planner::new(lifecycle_catalog());
        let goal = WorldState::of([("app", true.into())]);

        let result = planner.plan_bounded(&bare_metal(), &goal, 2);
        assert!(matches!(
            result,
            Err(GoapError::PlanNotFound(PlanFailure::DepthExceeded))
        ));

        let plan = planner.plan_bounded(&bare_metal(), &goal, 3).unwrap();
        assert_eq!(plan.len(), 3);
    }

    #[test]
    fn test_planning_is_deterministic() {
        let planner = Planner::new(lifecycle_catalog());
        let goal = WorldState::of([("app", true.into()), ("app_state", "started".into())]);

        let first = planner.plan(&bare_metal(), &goal).unwrap();
        for _ in 0..20 {
            let again = planner.plan(&bare_metal(), &goal).unwrap();
            assert_eq!(plan_names(&again), plan_names(&first));
        }
    }

    #[test]
    fn test_plans_are_sound() {
        // Replaying the plan's effects from the start state must land in a
        // state matching the goal, with every precondition holding en route.
        let planner = Planner::new(lifecycle_catalog());
        let goal = WorldState::of([("app", false.into()), ("db", false.into())]);

        let current = WorldState::of([
            ("vpc", true.into()),
            ("db", true.into()),
            ("db_state", "started".into()),
            ("app", true.into()),
            ("app_state", "started".into()),
        ]);
        let plan = planner.plan(&current, &goal).unwrap();

        let mut state = current;
        for action in &plan {
            assert!(
                state.matches(action.precondition()),
                "{} not applicable in {}",
                action,
                state
            );
            state = action.simulate(&state);
        }
        assert!(state.matches(&goal));
    }

    // -- reconciliation against a simulated cloud --

    type Cloud = Arc<Mutex<std::collections::HashMap<String, String>>>;

    fn cloud(pairs: &[(&str, &str)]) -> Cloud {
        Arc::new(Mutex::new(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        ))
    }

    fn cloud_sensors(cloud: &Cloud, bindings: &[&'static str]) -> Sensors {
        let mut sensors = Sensors::new();
        for binding in bindings {
            let cloud = cloud.clone();
            let binding = *binding;
            sensors
                .add(Sensor::new(
                    format!("{binding}_probe"),
                    binding,
                    Duration::from_secs(1),
                    FnSensor::new(move || {
                        let cloud = cloud.clone();
                        async move {
                            let value = cloud
                                .lock()
                                .unwrap()
                                .get(binding)
                                .cloned()
                                .unwrap_or_else(|| "false".to_string());
                            Ok(Observation::new(value, String::new(), 0))
                        }
                    }),
                ))
                .unwrap();
        }
        sensors
    }

    fn cloud_executor(cloud: &Cloud) -> Box<dyn ActionExecutor> {
        let cloud = cloud.clone();
        Box::new(FnExecutor::new(move |action: Action| {
            let cloud = cloud.clone();
            async move {
                let mut c = cloud.lock().unwrap();
                for (name, value) in action.effect().iter() {
                    c.insert(name.clone(), value.to_string());
                }
                Ok(ExecOutcome::Success(ActionResponse::new(
                    format!("{} applied", action.name()),
                    String::new(),
                    0,
                )))
            }
        }))
    }

    #[tokio::test]
    async fn test_reconcile_full_stack_provisioning() {
        let cloud = cloud(&[("vpc", "false"), ("db", "false"), ("app", "false")]);
        let sensors = cloud_sensors(&cloud, &["vpc", "db", "app", "db_state", "app_state"]);
        let reconciler = Reconciler::new(
            Planner::new(lifecycle_catalog()),
            sensors,
            cloud_executor(&cloud),
        );

        let goal = WorldState::of([("app", true.into()), ("app_state", "started".into())]);
        let outcome = reconciler.reconcile(&goal).await;

        assert!(outcome.is_completed(), "outcome: {:?}", outcome);
        let snapshot = cloud.lock().unwrap();
        assert_eq!(snapshot.get("vpc").map(String::as_str), Some("true"));
        assert_eq!(snapshot.get("db").map(String::as_str), Some("true"));
        assert_eq!(snapshot.get("app").map(String::as_str), Some("true"));
        assert_eq!(
            snapshot.get("app_state").map(String::as_str),
            Some("started")
        );
    }

    #[tokio::test]
    async fn test_reconcile_recovers_from_mid_plan_drift() {
        // A rogue operator stops the database right after CreateDB runs.
        // Verification after the next step exposes the drift and a fresh
        // plan repairs it.
        let cloud = cloud(&[("vpc", "false"), ("db", "false"), ("app", "false")]);
        let executions = Arc::new(Mutex::new(Vec::<String>::new()));

        let exec_cloud = cloud.clone();
        let exec_log = executions.clone();
        let executor = Box::new(FnExecutor::new(move |action: Action| {
            let cloud = exec_cloud.clone();
            let log = exec_log.clone();
            async move {
                let mut c = cloud.lock().unwrap();
                for (name, value) in action.effect().iter() {
                    c.insert(name.clone(), value.to_string());
                }
                let mut log = log.lock().unwrap();
                log.push(action.name().to_string());
                if action.name() == "CreateDB" && log.iter().filter(|n| *n == "CreateDB").count() == 1
                {
                    c.insert("db_state".to_string(), "stopped".to_string());
                }
                Ok(ExecOutcome::Success(ActionResponse::new(
                    String::new(),
                    String::new(),
                    0,
                )))
            }
        }));

        let sensors = cloud_sensors(&cloud, &["vpc", "db", "app", "db_state", "app_state"]);
        let config = ReconcilerConfig {
            backoff: Duration::from_millis(1),
            ..ReconcilerConfig::default()
        };
        let reconciler = Reconciler::with_config(
            Planner::new(lifecycle_catalog()),
            sensors,
            executor,
            config,
        );

        let goal = WorldState::of([
            ("db", true.into()),
            ("db_state", "started".into()),
            ("app", true.into()),
        ]);
        let outcome = reconciler.reconcile(&goal).await;

        assert!(outcome.is_completed(), "outcome: {:?}", outcome);
        let log = executions.lock().unwrap();
        assert!(
            log.contains(&"StartDB".to_string()),
            "repair step missing from {:?}",
            log
        );
        match outcome {
            ReconcileOutcome::Completed { final_state } => {
                assert_eq!(final_state.get("db_state"), Some(&Value::Str("started".into())));
            }
            _ => unreachable!(),
        }
    }
}
