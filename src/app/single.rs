use crate::core::inference::InferenceAdapter;
use crate::domain::model::{CustomerRecord, Prediction};
use crate::domain::ports::{Classifier, Transformer};
use crate::utils::error::Result;
use crate::utils::validation::Validate;

/// Validates the form input, then scores it. Out-of-range input never reaches the model.
pub fn predict_single<T: Transformer, C: Classifier>(
    adapter: &InferenceAdapter<T, C>,
    record: &CustomerRecord,
) -> Result<Prediction> {
    record.validate()?;
    adapter.predict_one(record)
}

pub fn render_prediction(prediction: &Prediction) -> String {
    let verdict = if prediction.is_churn() {
        "❌ This customer is likely to churn."
    } else {
        "✅ This customer is likely to stay."
    };
    format!(
        "Prediction Result\nChurn Probability: {:.2}\n{}",
        prediction.probability, verdict
    )
}

pub fn render_prediction_json(prediction: &Prediction) -> Result<String> {
    Ok(serde_json::to_string(prediction)?)
}
