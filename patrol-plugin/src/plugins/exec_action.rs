//! The `exec` action: runs a subprocess on each lifecycle transition,
//! passing context through `PATROL_*` environment variables.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;

use crate::action::{ActionError, ActionRegistry, Actor};
use crate::error::PluginError;
use crate::value::{get_float_or, get_string, get_string_list_or_empty, Params};

const ENV_MONITOR: &str = "PATROL_MONITOR";
const ENV_EVENT: &str = "PATROL_EVENT";
const ENV_VALUE: &str = "PATROL_VALUE";
const ENV_DURATION: &str = "PATROL_DURATION";

struct ExecAction {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    timeout: Option<Duration>,
}

impl ExecAction {
    async fn run(&self, extra_env: &[(&str, String)]) -> Result<(), ActionError> {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.current_dir("/");
        cmd.kill_on_drop(true);
        cmd.stdout(Stdio::null());
        cmd.stderr(Stdio::null());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        for (k, v) in extra_env {
            cmd.env(k, v);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| ActionError(format!("spawning {}: {e}", self.command)))?;

        let wait = child.wait();
        let status = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, wait).await {
                Ok(result) => result,
                Err(_) => {
                    let _ = child.kill().await;
                    return Err(ActionError(format!(
                        "{} timed out after {timeout:?}",
                        self.command
                    )));
                }
            },
            None => wait.await,
        };

        match status {
            Ok(status) if status.success() => Ok(()),
            Ok(status) => Err(ActionError(format!(
                "{} exited with {status}",
                self.command
            ))),
            Err(e) => Err(ActionError(format!("waiting for {}: {e}", self.command))),
        }
    }
}

#[async_trait]
impl Actor for ExecAction {
    async fn init(&self, monitor_name: &str) -> Result<(), ActionError> {
        self.run(&[(ENV_MONITOR, monitor_name.to_owned()), (ENV_EVENT, "init".to_owned())])
            .await
    }

    async fn fail(&self, monitor_name: &str, value: f64) -> Result<(), ActionError> {
        self.run(&[
            (ENV_MONITOR, monitor_name.to_owned()),
            (ENV_EVENT, "fail".to_owned()),
            (ENV_VALUE, value.to_string()),
        ])
        .await
    }

    async fn recover(&self, monitor_name: &str, failure_duration: Duration) -> Result<(), ActionError> {
        self.run(&[
            (ENV_MONITOR, monitor_name.to_owned()),
            (ENV_EVENT, "recover".to_owned()),
            (ENV_DURATION, failure_duration.as_secs().to_string()),
        ])
        .await
    }

    fn describe(&self) -> String {
        format!("action:exec:{}", self.command)
    }
}

fn construct(params: &Params) -> Result<Box<dyn Actor>, PluginError> {
    let command = get_string("command", params)?;
    let args = get_string_list_or_empty("args", params)?;
    let env = get_string_list_or_empty("env", params)?
        .into_iter()
        .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_owned(), v.to_owned())))
        .collect();
    let timeout_secs = get_float_or("timeout", params, 0.0)?;
    let timeout = if timeout_secs > 0.0 {
        Some(Duration::from_secs_f64(timeout_secs))
    } else {
        None
    };

    Ok(Box::new(ExecAction {
        command,
        args,
        env,
        timeout,
    }))
}

pub fn register(registry: &ActionRegistry) {
    registry.register("exec", construct);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[tokio::test]
    async fn successful_command_reports_ok() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/true".into()));
        let action = construct(&params).unwrap();
        assert!(action.init("m1").await.is_ok());
        assert!(action.fail("m1", 1.0).await.is_ok());
        assert!(action.recover("m1", Duration::from_secs(1)).await.is_ok());
    }

    #[tokio::test]
    async fn failing_command_reports_error() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/false".into()));
        let action = construct(&params).unwrap();
        assert!(action.fail("m1", 1.0).await.is_err());
    }

    #[tokio::test]
    async fn timeout_kills_and_errors() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/sleep".into()));
        params.insert(
            "args".into(),
            Value::List(vec![Value::String("5".into())]),
        );
        params.insert("timeout".into(), Value::Float(0.05));
        let action = construct(&params).unwrap();
        assert!(action.fail("m1", 1.0).await.is_err());
    }

    #[test]
    fn missing_command_is_an_error() {
        assert!(construct(&Params::new()).is_err());
    }
}
