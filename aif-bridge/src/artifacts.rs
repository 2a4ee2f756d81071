//! The two files shared with the pipeline, under `<backend-dir>/data/`.

use crate::error::{BridgeError, Result};
use aif_core::Dataset;
use aif_utils::uploads::{validate_file_name, validate_file_size, MAX_UPLOAD_MB};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Training dataset, the import/export target.
pub const TRAINING_DATA_FILE: &str = "training_data.csv";
/// Forecast written by the prediction script.
pub const PREDICTIONS_FILE: &str = "predictions.csv";

#[derive(Debug, Clone)]
pub struct ArtifactStore {
    data_dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        ArtifactStore {
            data_dir: data_dir.into(),
        }
    }

    pub fn from_backend_dir(backend_dir: &Path) -> Self {
        ArtifactStore::new(backend_dir.join("data"))
    }

    pub fn training_data_path(&self) -> PathBuf {
        self.data_dir.join(TRAINING_DATA_FILE)
    }

    pub fn predictions_path(&self) -> PathBuf {
        self.data_dir.join(PREDICTIONS_FILE)
    }

    /// Read and validate the predictions artifact.
    pub fn load_predictions(&self) -> Result<Dataset> {
        read_dataset(&self.predictions_path())
    }

    /// Accept an uploaded training file.
    ///
    /// The name, size and full content are checked before anything is
    /// written; the file then replaces the artifact through a rename so a
    /// reader never sees a partial write.
    pub fn import_training_data(&self, file_name: &str, bytes: &[u8]) -> Result<Dataset> {
        validate_file_name(file_name, TRAINING_DATA_FILE)?;
        validate_file_size(bytes.len() as u64, MAX_UPLOAD_MB)?;
        let text = std::str::from_utf8(bytes).map_err(|_| BridgeError::Encoding {
            path: PathBuf::from(file_name),
        })?;
        let dataset = Dataset::parse(text)?;

        fs::create_dir_all(&self.data_dir).map_err(|e| BridgeError::io(&self.data_dir, e))?;
        let target = self.training_data_path();
        let staging = self.data_dir.join(format!(".{TRAINING_DATA_FILE}.tmp"));
        fs::write(&staging, bytes).map_err(|e| BridgeError::io(&staging, e))?;
        if let Err(e) = fs::rename(&staging, &target) {
            let _ = fs::remove_file(&staging);
            return Err(BridgeError::io(&target, e));
        }
        info!("imported {} rows into {}", dataset.len(), target.display());
        Ok(dataset)
    }

    /// Re-validate the training artifact and write it to `destination`.
    pub fn export_training_data(&self, destination: &Path) -> Result<Dataset> {
        let dataset = read_dataset(&self.training_data_path())?;
        fs::write(destination, dataset.serialize())
            .map_err(|e| BridgeError::io(destination, e))?;
        info!(
            "exported {} rows to {}",
            dataset.len(),
            destination.display()
        );
        Ok(dataset)
    }
}

fn read_dataset(path: &Path) -> Result<Dataset> {
    let bytes = fs::read(path).map_err(|e| BridgeError::io(path, e))?;
    let text = String::from_utf8(bytes).map_err(|_| BridgeError::Encoding {
        path: path.to_path_buf(),
    })?;
    Ok(Dataset::parse(&text)?)
}
