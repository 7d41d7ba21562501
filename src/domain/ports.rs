use crate::domain::model::{FeatureMatrix, Table};
use crate::utils::error::Result;

pub trait Storage: Send + Sync {
    fn exists(&self, path: &str) -> bool;
    fn read_file(&self, path: &str) -> Result<Vec<u8>>;
    fn write_file(&self, path: &str, data: &[u8]) -> Result<()>;
    /// Human-readable location of `path`, used in messages.
    fn display_path(&self, path: &str) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn artifact_dir(&self) -> &str;
    fn preprocessor_file(&self) -> &str;
    fn model_file(&self) -> &str;
    fn decision_threshold(&self) -> Option<f64>;
    fn output_path(&self) -> &str;
    fn export_file_name(&self) -> &str;
    fn compress_export(&self) -> bool;
    fn preview_rows(&self) -> usize;
    fn with_probability(&self) -> bool;
}

/// A fitted, stateless feature encoder. It owns the input schema.
pub trait Transformer: Send + Sync {
    /// Columns a table must carry to be transformed.
    fn required_columns(&self) -> Vec<&str>;
    /// Width of every transformed row.
    fn n_features_out(&self) -> usize;
    fn transform(&self, table: &Table) -> Result<FeatureMatrix>;
}

/// A fitted, stateless binary classifier.
pub trait Classifier: Send + Sync {
    fn n_features(&self) -> usize;
    fn threshold(&self) -> f64;
    /// Probability of class 1 for each row.
    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>>;

    fn predict(&self, features: &FeatureMatrix) -> Result<Vec<u8>> {
        let threshold = self.threshold();
        Ok(self
            .predict_proba(features)?
            .into_iter()
            .map(|p| u8::from(p >= threshold))
            .collect())
    }
}
