//! Command implementations for the AIF CLI.
//!
//! Read-only subcommands (validate, dashboard, anomalies) work on any
//! forecast CSV. Subcommands that touch the ML pipeline or its artifacts
//! require `--enable-ml`.

use aif_bridge::{default_executable, ArtifactStore, MlBridge, PythonRunner, DEFAULT_TIMEOUT_SECS};
use aif_core::calendar_day::to_calendar_day;
use aif_core::CalendarDay;
use clap::{Args, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

pub mod dashboard;
pub mod ml;

/// Settings shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct Settings {
    /// Working directory of the ML pipeline; artifacts live in its data/ folder
    #[arg(long, env = "AIF_BACKEND_DIR", default_value = "backend/ai_pipeline", global = true)]
    pub backend_dir: PathBuf,

    /// Python interpreter for the pipeline scripts (falls back to $PYTHON)
    #[arg(long, env = "PYTHON_EXECUTABLE", global = true)]
    pub python: Option<String>,

    /// Allow import, export, train and predict
    #[arg(long, env = "AIF_ENABLE_ML", global = true)]
    pub enable_ml: bool,

    /// Upper bound on one pipeline script run
    #[arg(long, env = "AIF_BRIDGE_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    pub timeout_secs: u64,
}

impl Settings {
    pub fn python_executable(&self) -> String {
        self.python
            .clone()
            .or_else(|| std::env::var("PYTHON").ok().filter(|p| !p.is_empty()))
            .unwrap_or_else(|| default_executable().to_string())
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::from_backend_dir(&self.backend_dir)
    }

    pub fn bridge(&self) -> MlBridge {
        let runner = PythonRunner::new(self.python_executable())
            .with_timeout(Duration::from_secs(self.timeout_secs));
        MlBridge::new(runner, self.backend_dir.clone())
    }

    /// Refuse `action` unless the ML capability is switched on.
    pub fn require_ml(&self, action: &str) -> anyhow::Result<()> {
        if !self.enable_ml {
            anyhow::bail!("{action} is disabled; pass --enable-ml or set AIF_ENABLE_ML=true");
        }
        Ok(())
    }
}

/// Accepts every date shape the display path reads.
pub fn parse_day(value: &str) -> Result<CalendarDay, String> {
    to_calendar_day(value).ok_or_else(|| format!("unrecognized date '{value}'"))
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Validate a forecast CSV and report advisory findings
    Validate {
        /// CSV to check
        path: PathBuf,
    },

    /// Window the forecast around a base date and show statistics and warnings
    Dashboard {
        /// Forecast CSV (defaults to the predictions artifact)
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        /// Base date; defaults to today, the latest earlier day, or the median day
        #[arg(short = 'b', long, value_parser = parse_day)]
        base_date: Option<CalendarDay>,

        /// Move the base date by this many days
        #[arg(long, allow_negative_numbers = true)]
        shift: Option<i64>,

        /// Jump to the first day of a month, "YYYY-MM"
        #[arg(long, conflicts_with = "base_date")]
        month: Option<String>,

        /// Refill level in m³, 0 to 1000
        #[arg(short = 'l', long, default_value_t = aif_data::session::DEFAULT_REFILL_LEVEL)]
        refill_level: f64,

        /// Days shown on each side of the base date
        #[arg(short = 'r', long, default_value_t = aif_data::window::DEFAULT_WINDOW_RADIUS_DAYS)]
        radius: i64,

        /// Jump size in m³ that counts as an anomaly
        #[arg(long, default_value_t = aif_data::warnings::DEFAULT_ANOMALY_THRESHOLD)]
        anomaly_threshold: f64,

        /// Print the view as JSON
        #[arg(long)]
        json: bool,
    },

    /// List unflagged inventory jumps
    Anomalies {
        /// Forecast CSV (defaults to the predictions artifact)
        #[arg(short = 'f', long)]
        file: Option<PathBuf>,

        #[arg(long, default_value_t = aif_data::warnings::DEFAULT_ANOMALY_THRESHOLD)]
        threshold: f64,
    },

    /// Replace the training dataset with a validated upload, then prepare it
    Import {
        /// Upload; its file name must be training_data.csv
        path: PathBuf,
    },

    /// Copy the validated training dataset to a destination
    Export {
        /// Destination path
        destination: PathBuf,
    },

    /// Run the training script
    Train,

    /// Run the prediction script
    Predict {
        #[arg(long)]
        refill_threshold: Option<f64>,

        #[arg(long)]
        refill_amount: Option<f64>,

        #[arg(long)]
        refill_target_post_level: Option<f64>,

        #[arg(long)]
        forecast_days: Option<u32>,
    },
}

pub async fn run(settings: Settings, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Validate { path } => dashboard::run_validate(&path),
        Command::Dashboard {
            file,
            base_date,
            shift,
            month,
            refill_level,
            radius,
            anomaly_threshold,
            json,
        } => {
            let request = dashboard::DashboardRequest {
                base_date,
                shift,
                month,
                refill_level,
                radius,
                anomaly_threshold,
                json,
            };
            dashboard::run_dashboard(&settings, file.as_deref(), &request)
        }
        Command::Anomalies { file, threshold } => {
            dashboard::run_anomalies(&settings, file.as_deref(), threshold)
        }
        Command::Import { path } => ml::run_import(&settings, &path).await,
        Command::Export { destination } => ml::run_export(&settings, &destination),
        Command::Train => ml::run_train(&settings).await,
        Command::Predict {
            refill_threshold,
            refill_amount,
            refill_target_post_level,
            forecast_days,
        } => {
            let params = aif_bridge::PredictParams {
                refill_threshold,
                refill_amount,
                refill_target_post_level,
                forecast_days,
            };
            ml::run_predict(&settings, &params).await
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn settings(backend_dir: PathBuf, enable_ml: bool) -> Settings {
        Settings {
            backend_dir,
            python: Some("sh".to_string()),
            enable_ml,
            timeout_secs: 5,
        }
    }

    #[test]
    fn parse_day_accepts_display_shapes() {
        let expected = CalendarDay::from_ymd_opt(2025, 3, 10).unwrap();
        assert_eq!(parse_day("2025-03-10"), Ok(expected));
        assert_eq!(parse_day("2025-03-10T23:00:00"), Ok(expected));
        // 20:00 UTC is the next morning at UTC+9
        assert_eq!(parse_day("2025-03-09T20:00:00Z"), Ok(expected));
        assert!(parse_day("10/03/2025").is_err());
    }

    #[test]
    fn explicit_python_wins() {
        let s = settings(PathBuf::from("backend"), false);
        assert_eq!(s.python_executable(), "sh");
        assert_eq!(s.store().predictions_path(), PathBuf::from("backend/data/predictions.csv"));
    }

    #[test]
    fn ml_gate_is_off_by_default() {
        let s = settings(PathBuf::from("backend"), false);
        let err = s.require_ml("train").unwrap_err();
        assert!(err.to_string().contains("--enable-ml"));
        assert!(settings(PathBuf::from("backend"), true).require_ml("train").is_ok());
    }
}
