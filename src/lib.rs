pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::toml_config::AppConfig;

pub use adapters::LocalStorage;
pub use app::batch::BatchPipeline;
pub use crate::core::{
    artifacts::{ArtifactStore, Artifacts},
    inference::InferenceAdapter,
};
pub use domain::model::{CustomerRecord, Prediction, Table};
pub use utils::error::{ChurnError, InferenceError, Result};
