//! Boundary to the external machine-learning pipeline.
//!
//! The forecasting model runs as an opaque script. This crate launches it,
//! collects its combined output, and guards the two files it shares with the
//! dashboard: the training dataset (import/export) and the predictions file
//! (read by the windowing pipeline).
//!
//! # Usage
//!
//! ```no_run
//! use aif_bridge::{MlBridge, PredictParams, PythonRunner};
//!
//! # async fn demo() -> Result<(), aif_bridge::BridgeError> {
//! let bridge = MlBridge::new(PythonRunner::new("python3"), "backend/ai_pipeline");
//! let outcome = bridge
//!     .predict(&PredictParams {
//!         forecast_days: Some(30),
//!         ..Default::default()
//!     })
//!     .await?;
//! if !outcome.success {
//!     eprintln!("{}", outcome.log);
//! }
//! # Ok(())
//! # }
//! ```

pub mod artifacts;
mod bridge;
pub mod error;
pub mod operation;
mod runner;

pub use artifacts::ArtifactStore;
pub use bridge::{InFlight, MlBridge};
pub use error::BridgeError;
pub use operation::{BridgeOutcome, Operation, PredictParams};
pub use runner::{default_executable, PythonRunner, DEFAULT_TIMEOUT_SECS};
