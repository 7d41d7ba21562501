//! Fitted soft-voting ensemble.
//!
//! The ensemble probability is the weighted mean of its members' class-1
//! probabilities, the way scikit-learn's `VotingClassifier(voting="soft")`
//! combines them.

use crate::domain::model::FeatureMatrix;
use crate::domain::ports::Classifier;
use crate::utils::error::{InferenceError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingClassifier {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    pub n_features: usize,
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// One weight per estimator; empty means equal weights.
    #[serde(default)]
    pub weights: Vec<f64>,
    pub estimators: Vec<NamedEstimator>,
}

fn default_format_version() -> u32 {
    1
}

fn default_threshold() -> f64 {
    0.5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedEstimator {
    pub name: String,
    #[serde(flatten)]
    pub estimator: Estimator,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Estimator {
    LogisticRegression { coef: Vec<f64>, intercept: f64 },
    DecisionTree(Tree),
    RandomForest { trees: Vec<Tree> },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// Rows with `x[feature] <= threshold` go left.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { proba: f64 },
}

fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

impl Tree {
    fn check(&self, n_features: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err("tree has no nodes".to_string());
        }
        for (i, node) in self.nodes.iter().enumerate() {
            match *node {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if feature >= n_features {
                        return Err(format!(
                            "node {} splits on feature {} but the model has {} features",
                            i, feature, n_features
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("node {} has a non-finite threshold", i));
                    }
                    // Children must point forward so traversal always terminates.
                    for child in [left, right] {
                        if child <= i || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child index {}", i, child));
                        }
                    }
                }
                Node::Leaf { proba } => {
                    if !(0.0..=1.0).contains(&proba) {
                        return Err(format!("leaf {} has probability {} outside [0, 1]", i, proba));
                    }
                }
            }
        }
        Ok(())
    }

    fn proba(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match self.nodes[idx] {
                Node::Leaf { proba } => return proba,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => idx = if x[feature] <= threshold { left } else { right },
            }
        }
    }
}

impl Estimator {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::LogisticRegression { .. } => "logistic_regression",
            Self::DecisionTree(_) => "decision_tree",
            Self::RandomForest { .. } => "random_forest",
        }
    }

    fn check(&self, n_features: usize) -> std::result::Result<(), String> {
        match self {
            Self::LogisticRegression { coef, intercept } => {
                if coef.len() != n_features {
                    return Err(format!(
                        "logistic_regression has {} coefficients but the model has {} features",
                        coef.len(),
                        n_features
                    ));
                }
                if coef.iter().chain(std::iter::once(intercept)).any(|v| !v.is_finite()) {
                    return Err("logistic_regression has a non-finite coefficient".to_string());
                }
                Ok(())
            }
            Self::DecisionTree(tree) => tree.check(n_features),
            Self::RandomForest { trees } => {
                if trees.is_empty() {
                    return Err("random_forest has no trees".to_string());
                }
                trees.iter().try_for_each(|t| t.check(n_features))
            }
        }
    }

    fn proba(&self, x: &[f64]) -> f64 {
        match self {
            Self::LogisticRegression { coef, intercept } => {
                let z = coef.iter().zip(x).map(|(c, v)| c * v).sum::<f64>() + intercept;
                sigmoid(z)
            }
            Self::DecisionTree(tree) => tree.proba(x),
            Self::RandomForest { trees } => {
                trees.iter().map(|t| t.proba(x)).sum::<f64>() / trees.len() as f64
            }
        }
    }
}

impl VotingClassifier {
    /// Parses and checks a model artifact. Errors are plain reasons; the caller names the file.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, String> {
        let model: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        model.check()?;
        Ok(model)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.format_version != 1 {
            return Err(format!("unsupported format_version {}", self.format_version));
        }
        if self.n_features == 0 {
            return Err("n_features must be positive".to_string());
        }
        if self.estimators.is_empty() {
            return Err("ensemble has no estimators".to_string());
        }
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(format!("threshold {} outside [0, 1]", self.threshold));
        }
        if !self.weights.is_empty() {
            if self.weights.len() != self.estimators.len() {
                return Err(format!(
                    "{} weights for {} estimators",
                    self.weights.len(),
                    self.estimators.len()
                ));
            }
            if self.weights.iter().any(|w| !w.is_finite() || *w < 0.0)
                || self.weights.iter().sum::<f64>() <= 0.0
            {
                return Err("weights must be non-negative with a positive sum".to_string());
            }
        }
        for named in &self.estimators {
            named
                .estimator
                .check(self.n_features)
                .map_err(|e| format!("estimator '{}': {}", named.name, e))?;
        }
        Ok(())
    }

    /// Replaces the decision threshold stored in the artifact.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn weight(&self, i: usize) -> f64 {
        self.weights.get(i).copied().unwrap_or(1.0)
    }

    fn row_proba(&self, x: &[f64]) -> f64 {
        let (sum, total) = self
            .estimators
            .iter()
            .enumerate()
            .fold((0.0, 0.0), |(sum, total), (i, named)| {
                let w = self.weight(i);
                (sum + w * named.estimator.proba(x), total + w)
            });
        (sum / total).clamp(0.0, 1.0)
    }
}

impl Classifier for VotingClassifier {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn threshold(&self) -> f64 {
        self.threshold
    }

    fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
        if features.n_cols != self.n_features {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features,
                actual: features.n_cols,
            }
            .into());
        }
        Ok(features.rows().map(|x| self.row_proba(x)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ChurnError;

    fn model() -> VotingClassifier {
        let json = serde_json::json!({
            "n_features": 2,
            "weights": [1.0, 3.0],
            "estimators": [
                { "name": "lr", "kind": "logistic_regression", "coef": [1.0, 0.0], "intercept": 0.0 },
                {
                    "name": "dt",
                    "kind": "decision_tree",
                    "nodes": [
                        { "feature": 1, "threshold": 0.5, "left": 1, "right": 2 },
                        { "proba": 0.2 },
                        { "proba": 0.9 }
                    ]
                }
            ]
        });
        VotingClassifier::from_slice(json.to_string().as_bytes()).unwrap()
    }

    fn matrix(rows: &[[f64; 2]]) -> FeatureMatrix {
        FeatureMatrix {
            n_rows: rows.len(),
            n_cols: 2,
            values: rows.iter().flatten().copied().collect(),
        }
    }

    #[test]
    fn test_weighted_soft_vote() {
        let m = model();
        assert_eq!(m.threshold(), 0.5);

        // lr gives 0.5 at x0 = 0; dt gives 0.2 left and 0.9 right.
        let probs = m.predict_proba(&matrix(&[[0.0, 0.0], [0.0, 1.0]])).unwrap();
        assert!((probs[0] - (0.5 + 3.0 * 0.2) / 4.0).abs() < 1e-12);
        assert!((probs[1] - (0.5 + 3.0 * 0.9) / 4.0).abs() < 1e-12);

        let labels = m.predict(&matrix(&[[0.0, 0.0], [0.0, 1.0]])).unwrap();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn test_label_follows_threshold_inclusively() {
        let m = model().with_threshold(0.275);
        // (0.5 + 0.6) / 4 == 0.275 exactly at the boundary.
        let labels = m.predict(&matrix(&[[0.0, 0.0]])).unwrap();
        assert_eq!(labels, vec![1]);
    }

    #[test]
    fn test_sigmoid_is_stable_for_large_inputs() {
        assert_eq!(sigmoid(1000.0), 1.0);
        assert_eq!(sigmoid(-1000.0), 0.0);
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-15);
    }

    #[test]
    fn test_feature_count_mismatch() {
        let m = model();
        let features = FeatureMatrix::zeros(1, 3);
        assert!(matches!(
            m.predict_proba(&features),
            Err(ChurnError::Inference(InferenceError::FeatureCount {
                expected: 2,
                actual: 3
            }))
        ));
    }

    #[test]
    fn test_random_forest_averages_trees() {
        let json = r#"{
            "n_features": 1,
            "estimators": [{
                "name": "rf",
                "kind": "random_forest",
                "trees": [
                    {"nodes": [{"proba": 0.25}]},
                    {"nodes": [{"feature": 0, "threshold": 0.0, "left": 1, "right": 2}, {"proba": 0.0}, {"proba": 0.75}]}
                ]
            }]
        }"#;
        let m = VotingClassifier::from_slice(json.as_bytes()).unwrap();
        let features = FeatureMatrix {
            n_rows: 2,
            n_cols: 1,
            values: vec![-1.0, 1.0],
        };
        assert_eq!(m.predict_proba(&features).unwrap(), vec![0.125, 0.5]);
    }

    #[test]
    fn test_invalid_models_are_rejected() {
        let cycle = r#"{"n_features":1,"estimators":[{"name":"dt","kind":"decision_tree",
            "nodes":[{"feature":0,"threshold":0.0,"left":0,"right":1},{"proba":0.5}]}]}"#;
        assert!(VotingClassifier::from_slice(cycle.as_bytes())
            .unwrap_err()
            .contains("invalid child index"));

        let short_coef = r#"{"n_features":3,"estimators":[{"name":"lr","kind":"logistic_regression",
            "coef":[1.0],"intercept":0.0}]}"#;
        assert!(VotingClassifier::from_slice(short_coef.as_bytes())
            .unwrap_err()
            .contains("estimator 'lr'"));

        let bad_weights = r#"{"n_features":1,"weights":[1.0,1.0],"estimators":[{"name":"dt",
            "kind":"decision_tree","nodes":[{"proba":0.5}]}]}"#;
        assert!(VotingClassifier::from_slice(bad_weights.as_bytes()).is_err());

        let bad_leaf = r#"{"n_features":1,"estimators":[{"name":"dt","kind":"decision_tree",
            "nodes":[{"proba":1.5}]}]}"#;
        assert!(VotingClassifier::from_slice(bad_leaf.as_bytes()).is_err());
    }
}
