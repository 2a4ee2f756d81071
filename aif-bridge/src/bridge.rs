use crate::error::{BridgeError, Result};
use crate::operation::{BridgeOutcome, Operation, PredictParams};
use crate::runner::PythonRunner;
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Launches pipeline scripts from a backend directory, one per kind at a time.
#[derive(Debug)]
pub struct MlBridge {
    runner: PythonRunner,
    backend_dir: PathBuf,
    in_flight: [AtomicBool; 3],
}

/// Marks an operation as running until dropped.
#[derive(Debug)]
pub struct InFlight<'a> {
    flag: &'a AtomicBool,
    operation: Operation,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
        debug!("{} released", self.operation);
    }
}

impl MlBridge {
    pub fn new(runner: PythonRunner, backend_dir: impl Into<PathBuf>) -> Self {
        MlBridge {
            runner,
            backend_dir: backend_dir.into(),
            in_flight: Default::default(),
        }
    }

    /// Claim `operation`, or fail with [`BridgeError::Busy`] if a request of
    /// the same kind holds it. Different kinds never block each other.
    pub fn try_begin(&self, operation: Operation) -> Result<InFlight<'_>> {
        let flag = &self.in_flight[operation.index()];
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map_err(|_| BridgeError::Busy(operation))?;
        Ok(InFlight { flag, operation })
    }

    #[cfg(test)]
    fn is_running(&self, operation: Operation) -> bool {
        self.in_flight[operation.index()].load(Ordering::Acquire)
    }

    /// Run the script for `operation` with `args`, working in the backend
    /// directory. Script failures come back inside the outcome.
    pub async fn run(&self, operation: Operation, args: &[String]) -> Result<BridgeOutcome> {
        let _guard = self.try_begin(operation)?;
        info!("{} requested", operation);
        let outcome = self
            .runner
            .run_script(Path::new(operation.script()), &self.backend_dir, args)
            .await;
        info!(
            "{} finished: {}",
            operation,
            if outcome.success { "ok" } else { "failed" }
        );
        Ok(outcome)
    }

    pub async fn prepare(&self) -> Result<BridgeOutcome> {
        self.run(Operation::Prepare, &[]).await
    }

    pub async fn train(&self) -> Result<BridgeOutcome> {
        self.run(Operation::Train, &[]).await
    }

    pub async fn predict(&self, params: &PredictParams) -> Result<BridgeOutcome> {
        self.run(Operation::Predict, &params.to_args()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_kind_is_busy_until_guard_drops() {
        let bridge = MlBridge::new(PythonRunner::new("sh"), "unused");
        let guard = bridge.try_begin(Operation::Train).unwrap();
        assert!(bridge.is_running(Operation::Train));
        assert!(matches!(
            bridge.try_begin(Operation::Train),
            Err(BridgeError::Busy(Operation::Train))
        ));
        // other kinds are independent
        let _predict = bridge.try_begin(Operation::Predict).unwrap();
        assert!(bridge.is_running(Operation::Predict));
        drop(guard);
        assert!(!bridge.is_running(Operation::Train));
        assert!(bridge.try_begin(Operation::Train).is_ok());
    }

    #[cfg(unix)]
    mod process {
        use super::*;
        use crate::runner::tests::backend_with;

        #[tokio::test]
        async fn predict_forwards_params() {
            let dir = backend_with("predict", &[("predict.py", "echo \"$@\"\n")]);
            let bridge = MlBridge::new(PythonRunner::new("sh"), dir.clone());
            let outcome = bridge
                .predict(&PredictParams {
                    refill_amount: Some(450.0),
                    forecast_days: Some(7),
                    ..Default::default()
                })
                .await
                .unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.log, "--refill_amount 450 --forecast_days 7");
            assert!(!bridge.is_running(Operation::Predict));
        }

        #[tokio::test]
        async fn busy_request_is_rejected_without_launching() {
            let dir = backend_with("busy", &[("train.py", "echo trained\n")]);
            let bridge = MlBridge::new(PythonRunner::new("sh"), dir.clone());
            let _held = bridge.try_begin(Operation::Train).unwrap();
            assert!(matches!(
                bridge.train().await,
                Err(BridgeError::Busy(Operation::Train))
            ));
            let prepared = bridge.prepare().await.unwrap();
            assert!(!prepared.success);
            assert!(prepared.log.starts_with("script not found"));
        }

        #[tokio::test]
        async fn failed_script_releases_the_slot() {
            let dir = backend_with("release", &[("train.py", "exit 1\n")]);
            let bridge = MlBridge::new(PythonRunner::new("sh"), dir.clone());
            assert!(!bridge.train().await.unwrap().success);
            assert!(!bridge.is_running(Operation::Train));
            assert!(!bridge.train().await.unwrap().success);
        }
    }
}
