//! Sensors: the observation side of the reconciliation loop.
//!
//! A sensor produces the current value of exactly one world-state variable
//! (its *binding*) by running a shell command or custom async code against
//! the real infrastructure. Sensor failures are typed ([`ObservationError`]):
//! the reconciliation loop treats a failed reading as "value unknown for this
//! cycle" and retries, it never crashes on one.
//!
//! Sensor capabilities are resolved when the collection is built: a sensor is
//! constructed *with* its implementation, so there is no name-based dispatch
//! at observation time and no way to register a sensor with two conflicting
//! capabilities.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use infraplan::{ObservationError, Observation, Sensor, SensorFn, Sensors};
//! use async_trait::async_trait;
//!
//! struct VpcProbe;
//!
//! #[async_trait]
//! impl SensorFn for VpcProbe {
//!     async fn observe(&self) -> Result<Observation, ObservationError> {
//!         // A real probe would call the cloud API here.
//!         Ok(Observation::new("true".to_string(), String::new(), 0))
//!     }
//! }
//!
//! let mut sensors = Sensors::new();
//! sensors.add(Sensor::new("vpc_probe", "vpc", Duration::from_secs(5), VpcProbe)).unwrap();
//! assert!(sensors.get("vpc_probe").is_some());
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use tokio::process::Command;

use crate::error::{GoapError, ObservationError, Result};
use crate::state::{Value, WorldState};

/// One raw reading from a sensor: captured output plus an exit status.
///
/// The parsed [`Value`] is derived from the reading: a non-zero status means
/// the probed resource is absent (`false`); otherwise `"true"`/`"false"`
/// outputs become booleans and anything else is kept as a string (lifecycle
/// phases like `"started"` or `"not_health"`).
#[derive(Debug, Clone)]
pub struct Observation {
    stdout: String,
    stderr: String,
    return_code: i32,
}

impl Observation {
    /// Creates an observation, trimming trailing newlines from both streams.
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

    pub fn is_success(&self) -> bool {
        self.return_code == 0
    }

    /// The world-state value this reading represents.
    pub fn value(&self) -> Value {
        if !self.is_success() {
            return Value::Bool(false);
        }
        match self.stdout.as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            other => Value::Str(other.to_string()),
        }
    }
}

impl fmt::Display for Observation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rc {})", self.value(), self.return_code)
    }
}

/// A sensor capability: produces one raw reading.
#[async_trait]
pub trait SensorFn: Send + Sync {
    async fn observe(&self) -> std::result::Result<Observation, ObservationError>;
}

/// Runs a shell command and reports its output as the reading.
///
/// Exit status 0 means the probe answered; the stdout is the value. A
/// non-zero status is still a valid reading (resource absent), only spawn
/// failures and undecodable output are observation errors.
pub struct ShellSensor {
    command: String,
}

impl ShellSensor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl SensorFn for ShellSensor {
    async fn observe(&self) -> std::result::Result<Observation, ObservationError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .await
            .map_err(|e| ObservationError::Transport(e.to_string()))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| ObservationError::Malformed(e.to_string()))?;
        let stderr = String::from_utf8(output.stderr)
            .map_err(|e| ObservationError::Malformed(e.to_string()))?;

        Ok(Observation::new(
            stdout,
            stderr,
            output.status.code().unwrap_or(-1),
        ))
    }
}

/// Adapter turning an async closure into a sensor capability.
///
/// ```
/// use infraplan::{FnSensor, Observation};
///
/// let probe = FnSensor::new(|| async {
///     Ok(Observation::new("started".to_string(), String::new(), 0))
/// });
/// ```
pub struct FnSensor<F> {
    func: F,
}

impl<F, Fut> FnSensor<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Observation, ObservationError>> + Send,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> SensorFn for FnSensor<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = std::result::Result<Observation, ObservationError>> + Send,
{
    async fn observe(&self) -> std::result::Result<Observation, ObservationError> {
        (self.func)().await
    }
}

/// A named sensor bound to one world-state variable, with an explicit
/// per-invocation timeout.
#[derive(Clone)]
pub struct Sensor {
    name: String,
    binding: String,
    timeout: Duration,
    func: Arc<dyn SensorFn>,
}

impl Sensor {
    pub fn new<F>(
        name: impl Into<String>,
        binding: impl Into<String>,
        timeout: Duration,
        func: F,
    ) -> Self
    where
        F: SensorFn + 'static,
    {
        Self {
            name: name.into(),
            binding: binding.into(),
            timeout,
            func: Arc::new(func),
        }
    }

    /// Convenience constructor for shell-command probes.
    pub fn shell(
        name: impl Into<String>,
        binding: impl Into<String>,
        timeout: Duration,
        command: impl Into<String>,
    ) -> Self {
        Self::new(name, binding, timeout, ShellSensor::new(command))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The world-state variable this sensor feeds.
    pub fn binding(&self) -> &str {
        &self.binding
    }

    /// Runs the capability, bounded by this sensor's timeout.
    pub async fn observe(&self) -> std::result::Result<Observation, ObservationError> {
        match tokio::time::timeout(self.timeout, self.func.observe()).await {
            Ok(result) => result,
            Err(_) => Err(ObservationError::Timeout(self.name.clone())),
        }
    }
}

impl fmt::Debug for Sensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sensor")
            .field("name", &self.name)
            .field("binding", &self.binding)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// The result of observing every sensor once: the assembled snapshot plus
/// the bindings that could not be read this cycle.
#[derive(Debug, Clone)]
pub struct ObservationRound {
    pub state: WorldState,
    pub failures: Vec<(String, ObservationError)>,
}

impl ObservationRound {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// A name-unique collection of sensors.
#[derive(Clone, Default)]
pub struct Sensors {
    sensors: Vec<Sensor>,
}

impl Sensors {
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
        }
    }

    /// Adds a sensor.
    ///
    /// # Errors
    ///
    /// `DuplicateSensor` if a sensor with the same name is already present.
    pub fn add(&mut self, sensor: Sensor) -> Result<()> {
        if self.get(sensor.name()).is_some() {
            return Err(GoapError::DuplicateSensor(sensor.name().to_string()));
        }
        self.sensors.push(sensor);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Sensor> {
        self.sensors.iter().find(|s| s.name() == name)
    }

    /// Removes a sensor by name; returns whether one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.sensors.len();
        self.sensors.retain(|s| s.name() != name);
        self.sensors.len() != before
    }

    pub fn len(&self) -> usize {
        self.sensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sensors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sensor> {
        self.sensors.iter()
    }

    /// Observes every sensor once, sequentially, and assembles a fresh
    /// [`WorldState`] from the readings.
    ///
    /// A failing sensor leaves its binding out of the snapshot and is
    /// reported in the round's failures instead of aborting the cycle.
    pub async fn observe_all(&self) -> ObservationRound {
        let mut state = WorldState::new();
        let mut failures = Vec::new();

        for sensor in &self.sensors {
            match sensor.observe().await {
                Ok(observation) => {
                    debug!("sensor {}: {} = {}", sensor.name(), sensor.binding(), observation);
                    state.set(sensor.binding(), observation.value());
                }
                Err(err) => {
                    warn!("sensor {} failed: {}", sensor.name(), err);
                    failures.push((sensor.binding().to_string(), err));
                }
            }
        }

        ObservationRound { state, failures }
    }
}

impl fmt::Debug for Sensors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.sensors.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed(value: &'static str) -> impl SensorFn {
        FnSensor::new(move || async move {
            Ok(Observation::new(value.to_string(), String::new(), 0))
        })
    }

    #[tokio::test]
    async fn test_observation_values() {
        assert_eq!(
            Observation::new("true\n".into(), String::new(), 0).value(),
            Value::Bool(true)
        );
        assert_eq!(
            Observation::new("started".into(), String::new(), 0).value(),
            Value::Str("started".into())
        );
        assert_eq!(
            Observation::new("not_health".into(), String::new(), 0).value(),
            Value::Str("not_health".into())
        );
        // Non-zero status means the resource is absent.
        assert_eq!(
            Observation::new(String::new(), "no such vpc".into(), 1).value(),
            Value::Bool(false)
        );
    }

    #[tokio::test]
    async fn test_duplicate_sensor_rejected() {
        let mut sensors = Sensors::new();
        sensors
            .add(Sensor::new("vpc", "vpc", Duration::from_secs(1), fixed("true")))
            .unwrap();
        let result = sensors.add(Sensor::new(
            "vpc",
            "other",
            Duration::from_secs(1),
            fixed("false"),
        ));
        assert!(matches!(result, Err(GoapError::DuplicateSensor(name)) if name == "vpc"));
    }

    #[tokio::test]
    async fn test_remove_reports_absence() {
        let mut sensors = Sensors::new();
        sensors
            .add(Sensor::new("db", "db", Duration::from_secs(1), fixed("stopped")))
            .unwrap();
        assert!(sensors.remove("db"));
        assert!(!sensors.remove("db"));
    }

    #[tokio::test]
    async fn test_observe_all_assembles_snapshot() {
        let mut sensors = Sensors::new();
        sensors
            .add(Sensor::new("vpc", "vpc", Duration::from_secs(1), fixed("true")))
            .unwrap();
        sensors
            .add(Sensor::new("db", "db", Duration::from_secs(1), fixed("stopped")))
            .unwrap();

        let round = sensors.observe_all().await;
        assert!(round.is_complete());
        assert_eq!(round.state.get("vpc"), Some(&Value::Bool(true)));
        assert_eq!(round.state.get("db"), Some(&Value::Str("stopped".into())));
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_the_round() {
        let mut sensors = Sensors::new();
        sensors
            .add(Sensor::new(
                "broken",
                "db",
                Duration::from_secs(1),
                FnSensor::new(|| async {
                    Err(ObservationError::Transport("connection refused".into()))
                }),
            ))
            .unwrap();
        sensors
            .add(Sensor::new("vpc", "vpc", Duration::from_secs(1), fixed("true")))
            .unwrap();

        let round = sensors.observe_all().await;
        assert!(!round.is_complete());
        assert_eq!(round.failures.len(), 1);
        assert_eq!(round.failures[0].0, "db");
        // The healthy sensor still contributed.
        assert_eq!(round.state.get("vpc"), Some(&Value::Bool(true)));
    }

    #[tokio::test]
    async fn test_sensor_timeout() {
        let sensor = Sensor::new(
            "slow",
            "db",
            Duration::from_millis(10),
            FnSensor::new(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(Observation::new("true".into(), String::new(), 0))
            }),
        );

        let result = sensor.observe().await;
        assert!(matches!(result, Err(ObservationError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_shell_sensor_reads_stdout() {
        let sensor = Sensor::shell("echo", "db", Duration::from_secs(5), "echo started");
        let observation = sensor.observe().await.unwrap();
        assert_eq!(observation.value(), Value::Str("started".into()));
    }

    #[tokio::test]
    async fn test_shell_sensor_nonzero_exit_means_absent() {
        let sensor = Sensor::shell("probe", "vpc", Duration::from_secs(5), "exit 3");
        let observation = sensor.observe().await.unwrap();
        assert_eq!(observation.return_code(), 3);
        assert_eq!(observation.value(), Value::Bool(false));
    }
}
