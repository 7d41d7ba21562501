pub mod artifacts;
pub mod classifier;
pub mod inference;
pub mod preprocessing;
pub mod table;

pub use crate::domain::model::{CustomerRecord, FeatureMatrix, Prediction, Table};
pub use crate::domain::ports::{Classifier, ConfigProvider, Storage, Transformer};
pub use crate::utils::error::Result;
