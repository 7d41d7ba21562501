use crate::adapters::LocalStorage;
use crate::core::classifier::VotingClassifier;
use crate::core::preprocessing::Preprocessor;
use crate::domain::ports::{Classifier, ConfigProvider, Storage, Transformer};
use crate::utils::error::{ChurnError, Result};
use std::sync::Arc;

pub const DEFAULT_PREPROCESSOR_FILE: &str = "preprocessing.json";
pub const DEFAULT_MODEL_FILE: &str = "best_model_voting.json";

/// The loaded, read-only artifact pair. Cloning shares the same artifacts.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub transformer: Arc<Preprocessor>,
    pub model: Arc<VotingClassifier>,
}

pub struct ArtifactStore<S: Storage> {
    storage: S,
    preprocessor_file: String,
    model_file: String,
    threshold_override: Option<f64>,
}

impl<S: Storage> ArtifactStore<S> {
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            preprocessor_file: DEFAULT_PREPROCESSOR_FILE.to_string(),
            model_file: DEFAULT_MODEL_FILE.to_string(),
            threshold_override: None,
        }
    }

    pub fn with_files(mut self, preprocessor_file: &str, model_file: &str) -> Self {
        self.preprocessor_file = preprocessor_file.to_string();
        self.model_file = model_file.to_string();
        self
    }

    pub fn with_threshold(mut self, threshold: Option<f64>) -> Self {
        self.threshold_override = threshold;
        self
    }

    fn read(&self, file: &str) -> Result<Vec<u8>> {
        if !self.storage.exists(file) {
            return Err(ChurnError::ArtifactMissing {
                path: self.storage.display_path(file),
            });
        }
        let bytes = self.storage.read_file(file)?;
        tracing::debug!(
            "Read artifact {} ({} bytes)",
            self.storage.display_path(file),
            bytes.len()
        );
        Ok(bytes)
    }

    /// Loads both artifacts. Any failure here is fatal for the process.
    pub fn load(&self) -> Result<Artifacts> {
        let model_bytes = self.read(&self.model_file)?;
        let preprocessor_bytes = self.read(&self.preprocessor_file)?;

        let mut model = VotingClassifier::from_slice(&model_bytes)
            .map_err(|reason| ChurnError::corrupt(&self.storage.display_path(&self.model_file), reason))?;
        let transformer = Preprocessor::from_slice(&preprocessor_bytes).map_err(|reason| {
            ChurnError::corrupt(&self.storage.display_path(&self.preprocessor_file), reason)
        })?;

        if transformer.n_features_out() != model.n_features() {
            return Err(ChurnError::corrupt(
                &self.storage.display_path(&self.model_file),
                format!(
                    "model expects {} features but the preprocessor produces {}",
                    model.n_features(),
                    transformer.n_features_out()
                ),
            ));
        }

        if let Some(threshold) = self.threshold_override {
            tracing::info!(
                "Decision threshold overridden: {} -> {}",
                model.threshold(),
                threshold
            );
            model = model.with_threshold(threshold);
        }

        tracing::info!(
            "✅ Loaded artifacts: {} input columns, {} features, {} estimators",
            transformer.required_columns().len(),
            transformer.n_features_out(),
            model.estimators.len()
        );

        Ok(Artifacts {
            transformer: Arc::new(transformer),
            model: Arc::new(model),
        })
    }
}

impl ArtifactStore<LocalStorage> {
    pub fn from_config<C: ConfigProvider>(config: &C) -> Self {
        Self::new(LocalStorage::new(config.artifact_dir()))
            .with_files(config.preprocessor_file(), config.model_file())
            .with_threshold(config.decision_threshold())
    }
}
