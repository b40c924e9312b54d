//! The `exec` probe: runs a subprocess and interprets its exit status (or,
//! in `parse` mode, its trimmed stdout) as the probe value.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::PluginError;
use crate::probe::{ProbeContext, ProbeRegistry, Prober};
use crate::value::{get_bool_or, get_float_or, get_string, get_string_list_or_empty, Params};

struct ExecProbe {
    command: String,
    args: Vec<String>,
    env: Vec<(String, String)>,
    parse: bool,
    errval: f64,
}

impl ExecProbe {
    fn fail_value(&self) -> f64 {
        if self.parse {
            self.errval
        } else {
            1.0
        }
    }

    fn interpret(&self, stdout: &[u8], success: bool) -> f64 {
        if self.parse {
            match std::str::from_utf8(stdout).ok().map(str::trim) {
                Some(s) => s.parse::<f64>().unwrap_or(self.errval),
                None => self.errval,
            }
        } else if success {
            0.0
        } else {
            1.0
        }
    }
}

#[async_trait]
impl Prober for ExecProbe {
    async fn probe(&self, ctx: &ProbeContext) -> f64 {
        let mut cmd = Command::new(&self.command);
        cmd.args(&self.args);
        cmd.current_dir("/");
        cmd.kill_on_drop(true);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        for (k, v) in &self.env {
            cmd.env(k, v);
        }

        let mut child = match cmd.spawn() {
            Ok(c) => c,
            Err(_) => return self.fail_value(),
        };

        tokio::select! {
            _ = ctx.cancelled() => {
                let _ = child.kill().await;
                self.fail_value()
            }
            result = child.wait_with_output() => {
                match result {
                    Ok(out) => self.interpret(&out.stdout, out.status.success()),
                    Err(_) => self.fail_value(),
                }
            }
        }
    }

    fn describe(&self) -> String {
        format!("probe:exec:{}", self.command)
    }
}

fn construct(params: &Params) -> Result<Box<dyn Prober>, PluginError> {
    let command = get_string("command", params)?;
    let args = get_string_list_or_empty("args", params)?;
    let parse = get_bool_or("parse", params, false)?;
    let errval = get_float_or("errval", params, 1.0)?;
    let env = get_string_list_or_empty("env", params)?
        .into_iter()
        .filter_map(|kv| kv.split_once('=').map(|(k, v)| (k.to_owned(), v.to_owned())))
        .collect();

    Ok(Box::new(ExecProbe {
        command,
        args,
        env,
        parse,
        errval,
    }))
}

pub fn register(registry: &ProbeRegistry) {
    registry.register("exec", construct);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use tokio_util::sync::CancellationToken;

    fn ctx() -> ProbeContext {
        ProbeContext::new(tokio::time::Instant::now(), CancellationToken::new())
    }

    #[tokio::test]
    async fn success_exit_is_healthy() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/true".into()));
        let probe = construct(&params).unwrap();
        assert_eq!(probe.probe(&ctx()).await, 0.0);
    }

    #[tokio::test]
    async fn failure_exit_is_conventional_failure() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/false".into()));
        let probe = construct(&params).unwrap();
        assert_eq!(probe.probe(&ctx()).await, 1.0);
    }

    #[tokio::test]
    async fn missing_binary_is_failure_value() {
        let mut params = Params::new();
        params.insert(
            "command".into(),
            Value::String("/no/such/binary-xyz".into()),
        );
        let probe = construct(&params).unwrap();
        assert_eq!(probe.probe(&ctx()).await, 1.0);
    }

    #[tokio::test]
    async fn parse_mode_reads_stdout() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/echo".into()));
        params.insert(
            "args".into(),
            Value::List(vec![Value::String("0.42".into())]),
        );
        params.insert("parse".into(), Value::Bool(true));
        let probe = construct(&params).unwrap();
        assert_eq!(probe.probe(&ctx()).await, 0.42);
    }

    #[tokio::test]
    async fn parse_mode_falls_back_to_errval_on_bad_output() {
        let mut params = Params::new();
        params.insert("command".into(), Value::String("/bin/echo".into()));
        params.insert(
            "args".into(),
            Value::List(vec![Value::String("not-a-number".into())]),
        );
        params.insert("parse".into(), Value::Bool(true));
        params.insert("errval".into(), Value::Float(2.5));
        let probe = construct(&params).unwrap();
        assert_eq!(probe.probe(&ctx()).await, 2.5);
    }

    #[test]
    fn missing_command_is_an_error() {
        assert!(construct(&Params::new()).is_err());
    }
}
