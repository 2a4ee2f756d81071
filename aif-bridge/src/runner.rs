//! Launches one pipeline script and folds its result into a [`BridgeOutcome`].

use crate::operation::BridgeOutcome;
use log::{info, warn};
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Default upper bound on a single script run.
pub const DEFAULT_TIMEOUT_SECS: u64 = 600;

/// Interpreter used when none is configured.
pub fn default_executable() -> &'static str {
    if cfg!(windows) {
        "python"
    } else {
        "python3"
    }
}

/// Runs scripts with a fixed interpreter.
#[derive(Debug, Clone)]
pub struct PythonRunner {
    executable: String,
    timeout: Duration,
}

impl PythonRunner {
    pub fn new(executable: impl Into<String>) -> Self {
        PythonRunner {
            executable: executable.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `script` (relative to `cwd` unless absolute) with `args`.
    ///
    /// Never fails: a missing script, a launch error, a timeout and a
    /// non-zero exit all come back as `success: false` with a log. On timeout
    /// the child is killed.
    pub async fn run_script(&self, script: &Path, cwd: &Path, args: &[String]) -> BridgeOutcome {
        let script_path = if script.is_absolute() {
            script.to_path_buf()
        } else {
            cwd.join(script)
        };
        if let Err(err) = tokio::fs::metadata(&script_path).await {
            return BridgeOutcome::failure(format!(
                "script not found: {}\n{}",
                script_path.display(),
                err
            ));
        }

        info!(
            "launching {} {} {:?} in {}",
            self.executable,
            script_path.display(),
            args,
            cwd.display()
        );
        let child = Command::new(&self.executable)
            .arg(&script_path)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn();
        let child = match child {
            Ok(c) => c,
            Err(err) => {
                warn!("failed to launch {}: {}", self.executable, err);
                return BridgeOutcome::failure(format!(
                    "failed to launch '{}': {}",
                    self.executable, err
                ));
            }
        };

        // dropping the wait future drops the child, which kills it
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return BridgeOutcome::failure(format!("failed to collect output: {err}"));
            }
            Err(_) => {
                warn!(
                    "{} timed out after {}s",
                    script_path.display(),
                    self.timeout.as_secs()
                );
                return BridgeOutcome::failure(format!(
                    "timed out after {}s: {}",
                    self.timeout.as_secs(),
                    script_path.display()
                ));
            }
        };

        let mut log = String::from_utf8_lossy(&output.stdout).into_owned();
        log.push_str(&String::from_utf8_lossy(&output.stderr));
        let success = output.status.success();
        if !success {
            warn!("{} exited with {}", script_path.display(), output.status);
        }
        BridgeOutcome {
            success,
            log: log.trim().to_string(),
        }
    }
}

#[cfg(all(test, unix))]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    /// A scratch backend directory holding `src/<name>` shell scripts.
    pub(crate) fn backend_with(tag: &str, scripts: &[(&str, &str)]) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("aif-bridge-{}-{}", tag, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join("src")).unwrap();
        for (name, body) in scripts {
            std::fs::write(dir.join("src").join(name), body).unwrap();
        }
        dir
    }

    #[tokio::test]
    async fn combines_stdout_and_stderr() {
        let dir = backend_with("combine", &[("ok.py", "echo out\necho err 1>&2\n")]);
        let outcome = PythonRunner::new("sh")
            .run_script(Path::new("src/ok.py"), &dir, &[])
            .await;
        assert!(outcome.success);
        assert_eq!(outcome.log, "out\nerr");
    }

    #[tokio::test]
    async fn non_zero_exit_is_unsuccessful() {
        let dir = backend_with("fail", &[("bad.py", "echo broken\nexit 3\n")]);
        let outcome = PythonRunner::new("sh")
            .run_script(Path::new("src/bad.py"), &dir, &[])
            .await;
        assert!(!outcome.success);
        assert_eq!(outcome.log, "broken");
    }

    #[tokio::test]
    async fn missing_script_is_reported() {
        let dir = backend_with("missing", &[]);
        let outcome = PythonRunner::new("sh")
            .run_script(Path::new("src/nope.py"), &dir, &[])
            .await;
        assert!(!outcome.success);
        assert!(outcome.log.starts_with("script not found"));
    }

    #[tokio::test]
    async fn missing_interpreter_is_reported() {
        let dir = backend_with("nointerp", &[("ok.py", "true\n")]);
        let outcome = PythonRunner::new("aif-no-such-interpreter")
            .run_script(Path::new("src/ok.py"), &dir, &[])
            .await;
        assert!(!outcome.success);
        assert!(outcome.log.starts_with("failed to launch"));
    }

    #[tokio::test]
    async fn timeout_yields_one_failed_outcome() {
        let dir = backend_with("slow", &[("slow.py", "sleep 5\n")]);
        let outcome = PythonRunner::new("sh")
            .with_timeout(Duration::from_millis(100))
            .run_script(Path::new("src/slow.py"), &dir, &[])
            .await;
        assert!(!outcome.success);
        assert!(outcome.log.starts_with("timed out"));
    }
}
