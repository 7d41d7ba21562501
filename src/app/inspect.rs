use crate::core::artifacts::Artifacts;
use crate::domain::ports::{Classifier, Transformer};

pub fn render_summary(artifacts: &Artifacts) -> String {
    let transformer = &artifacts.transformer;
    let model = &artifacts.model;

    let mut lines = vec!["📋 Artifact Summary:".to_string()];
    lines.push(format!(
        "  Required columns: {}",
        transformer.required_columns().join(", ")
    ));
    for step in &transformer.steps {
        lines.push(format!(
            "  Step {}: {} -> {} features",
            step.kind(),
            step.columns().join(", "),
            step.width()
        ));
    }
    lines.push(format!("  Model input features: {}", model.n_features()));
    for (i, named) in model.estimators.iter().enumerate() {
        lines.push(format!(
            "  Estimator {} ({}), weight {}",
            named.name,
            named.estimator.kind(),
            model.weight(i)
        ));
    }
    lines.push(format!("  Decision threshold: {}", model.threshold()));
    lines.join("\n")
}
