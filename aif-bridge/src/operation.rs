use serde::{Deserialize, Serialize};
use std::fmt;

/// The three things the external pipeline knows how to do.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// Fill gaps in the freshly imported training data
    Prepare,
    Train,
    Predict,
}

impl Operation {
    /// Script path relative to the backend directory.
    pub fn script(&self) -> &'static str {
        match self {
            Operation::Prepare => "src/prepare_data.py",
            Operation::Train => "src/train.py",
            Operation::Predict => "src/predict.py",
        }
    }

    pub(crate) fn index(&self) -> usize {
        match self {
            Operation::Prepare => 0,
            Operation::Train => 1,
            Operation::Predict => 2,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Prepare => "prepare",
            Operation::Train => "train",
            Operation::Predict => "predict",
        };
        f.write_str(name)
    }
}

/// Optional knobs forwarded verbatim to the prediction script. Each is passed
/// only when set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictParams {
    pub refill_threshold: Option<f64>,
    pub refill_amount: Option<f64>,
    pub refill_target_post_level: Option<f64>,
    pub forecast_days: Option<u32>,
}

impl PredictParams {
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();
        let mut push = |flag: &str, value: Option<String>| {
            if let Some(value) = value {
                args.push(flag.to_string());
                args.push(value);
            }
        };
        push("--refill_threshold", self.refill_threshold.map(|v| v.to_string()));
        push("--refill_amount", self.refill_amount.map(|v| v.to_string()));
        push(
            "--refill_target_post_level",
            self.refill_target_post_level.map(|v| v.to_string()),
        );
        push("--forecast_days", self.forecast_days.map(|v| v.to_string()));
        args
    }
}

/// Exactly one of these comes back for every accepted request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BridgeOutcome {
    pub success: bool,
    /// stdout followed by stderr, trimmed
    pub log: String,
}

impl BridgeOutcome {
    pub fn failure(log: impl Into<String>) -> Self {
        BridgeOutcome {
            success: false,
            log: log.into(),
        }
    }
}
