//! Inference adapter: records in, predictions out.
//!
//! Both operations run the same path, transformer then classifier, and either
//! succeed for every row or fail as a whole.

use crate::core::artifacts::Artifacts;
use crate::core::classifier::VotingClassifier;
use crate::core::preprocessing::Preprocessor;
use crate::domain::model::{CustomerRecord, Prediction, Table, PREDICTION_COLUMN, PROBABILITY_COLUMN};
use crate::domain::ports::{Classifier, Transformer};
use crate::utils::error::{InferenceError, Result};
use std::sync::Arc;
use std::time::Instant;

pub struct InferenceAdapter<T: Transformer = Preprocessor, C: Classifier = VotingClassifier> {
    transformer: Arc<T>,
    model: Arc<C>,
}

impl<T: Transformer, C: Classifier> Clone for InferenceAdapter<T, C> {
    fn clone(&self) -> Self {
        Self {
            transformer: Arc::clone(&self.transformer),
            model: Arc::clone(&self.model),
        }
    }
}

impl InferenceAdapter {
    pub fn from_artifacts(artifacts: &Artifacts) -> Self {
        Self::new(
            Arc::clone(&artifacts.transformer),
            Arc::clone(&artifacts.model),
        )
    }
}

impl<T: Transformer, C: Classifier> InferenceAdapter<T, C> {
    pub fn new(transformer: Arc<T>, model: Arc<C>) -> Self {
        Self { transformer, model }
    }

    pub fn transformer(&self) -> &T {
        &self.transformer
    }

    pub fn model(&self) -> &C {
        &self.model
    }

    fn score(&self, table: &Table) -> Result<Vec<Prediction>> {
        let started = Instant::now();
        let features = self.transformer.transform(table)?;
        if features.n_rows == 0 {
            return Err(InferenceError::EmptyBatch.into());
        }

        let threshold = self.model.threshold();
        let predictions: Vec<Prediction> = self
            .model
            .predict_proba(&features)?
            .into_iter()
            .map(|probability| Prediction {
                label: u8::from(probability >= threshold),
                probability,
            })
            .collect();

        tracing::debug!(
            "Scored {} rows in {:?}",
            predictions.len(),
            started.elapsed()
        );
        Ok(predictions)
    }

    /// Scores one record and returns its label and churn probability.
    pub fn predict_one(&self, record: &CustomerRecord) -> Result<Prediction> {
        let table = record.to_table();
        let prediction = self.score(&table)?.remove(0);
        tracing::debug!(
            "Single prediction: label={}, probability={:.4}",
            prediction.label,
            prediction.probability
        );
        Ok(prediction)
    }

    /// Scores every row and returns the input table with a prediction column.
    pub fn predict_batch(&self, records: Table) -> Result<Table> {
        self.predict_batch_inner(records, false)
    }

    /// Like [`predict_batch`](Self::predict_batch) but also writes a probability column.
    pub fn predict_batch_with_probability(&self, records: Table) -> Result<Table> {
        self.predict_batch_inner(records, true)
    }

    fn predict_batch_inner(&self, mut records: Table, with_probability: bool) -> Result<Table> {
        let predictions = self.score(&records)?;

        let churners = predictions.iter().filter(|p| p.is_churn()).count();
        tracing::info!(
            "🔮 Batch scored: {} rows, {} predicted to churn",
            predictions.len(),
            churners
        );

        records.set_column(
            PREDICTION_COLUMN,
            predictions.iter().map(|p| p.label.to_string()).collect(),
        );
        if with_probability {
            records.set_column(
                PROBABILITY_COLUMN,
                predictions
                    .iter()
                    .map(|p| format!("{:.4}", p.probability))
                    .collect(),
            );
        }
        Ok(records)
    }
}
