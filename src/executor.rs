//! Action executors: the side effects behind planned actions.
//!
//! The planner decides *what* to do; an [`ActionExecutor`] is the collaborator
//! that actually does it, by shelling out or calling a cloud API. The
//! reconciliation loop only consumes the classified [`ExecOutcome`]: success,
//! retryable failure, or fatal failure.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use crate::action::{Action, ActionResponse};
use crate::error::{GoapError, Result};

/// The classified result of executing one action.
#[derive(Debug, Clone)]
pub enum ExecOutcome {
    Success(ActionResponse),
    Failure {
        retryable: bool,
        response: ActionResponse,
    },
}

impl ExecOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ExecOutcome::Success(_))
    }

    pub fn response(&self) -> &ActionResponse {
        match self {
            ExecOutcome::Success(response) => response,
            ExecOutcome::Failure { response, .. } => response,
        }
    }
}

/// Invokes the real-world operation behind an action.
///
/// An `Err` means the executor itself could not run (unknown action, broken
/// transport) and is treated as fatal; failures of the operation are reported
/// through `ExecOutcome::Failure` with a retryability classification.
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    async fn execute(&self, action: &Action) -> Result<ExecOutcome>;
}

/// Success for HTTP-backed executors is any status in the 2xx range.
pub fn http_success(status: u16) -> bool {
    (200..=299).contains(&status)
}

/// Classifies a JSON API response body of the shape cloud SDKs return,
/// reading the HTTP status from `ResponseMetadata.HTTPStatusCode`.
///
/// 2xx is success; 5xx and 429 (throttling) are retryable; everything else
/// is fatal.
pub fn classify_api_response(body: &str) -> Result<ExecOutcome> {
    let parsed: serde_json::Value = serde_json::from_str(body)?;
    let status = parsed
        .pointer("/ResponseMetadata/HTTPStatusCode")
        .and_then(serde_json::Value::as_u64)
        .ok_or_else(|| GoapError::Execution {
            action: String::new(),
            retryable: false,
            detail: "response carries no HTTPStatusCode".to_string(),
        })? as u16;

    let response = ActionResponse::new(body.to_string(), String::new(), i32::from(status));
    if http_success(status) {
        Ok(ExecOutcome::Success(response))
    } else {
        Ok(ExecOutcome::Failure {
            retryable: status >= 500 || status == 429,
            response,
        })
    }
}

/// Executes actions by running registered shell commands.
///
/// Each action name maps to one command, resolved at registration time. A
/// non-zero exit is a fatal failure; a timeout is retryable (the operation
/// may simply be slow this cycle).
pub struct ShellExecutor {
    commands: HashMap<String, String>,
    timeout: Duration,
}

impl ShellExecutor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            commands: HashMap::new(),
            timeout,
        }
    }

    /// Registers the command to run for an action name.
    pub fn register(mut self, action: impl Into<String>, command: impl Into<String>) -> Self {
        self.commands.insert(action.into(), command.into());
        self
    }
}

#[async_trait]
impl ActionExecutor for ShellExecutor {
    async fn execute(&self, action: &Action) -> Result<ExecOutcome> {
        let command = self
            .commands
            .get(action.name())
            .ok_or_else(|| GoapError::Execution {
                action: action.name().to_string(),
                retryable: false,
                detail: "no command registered for action".to_string(),
            })?;

        debug!("executing {}: {}", action.name(), command);
        let run = Command::new("sh").arg("-c").arg(command).output();
        let output = match tokio::time::timeout(self.timeout, run).await {
            Ok(result) => result?,
            Err(_) => {
                return Ok(ExecOutcome::Failure {
                    retryable: true,
                    response: ActionResponse::new(
                        String::new(),
                        format!("{} timed out", action.name()),
                        -1,
                    ),
                })
            }
        };

        let response = ActionResponse::new(
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            output.status.code().unwrap_or(-1),
        );
        if response.is_success() {
            Ok(ExecOutcome::Success(response))
        } else {
            Ok(ExecOutcome::Failure {
                retryable: false,
                response,
            })
        }
    }
}

/// Adapter turning an async closure into an executor, mostly for tests and
/// in-process integrations.
pub struct FnExecutor<F> {
    func: F,
}

impl<F, Fut> FnExecutor<F>
where
    F: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExecOutcome>> + Send,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> ActionExecutor for FnExecutor<F>
where
    F: Fn(Action) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ExecOutcome>> + Send,
{
    async fn execute(&self, action: &Action) -> Result<ExecOutcome> {
        (self.func)(action.clone()).await
    }
}
