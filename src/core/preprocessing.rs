//! Fitted column transformer.
//!
//! Mirrors a scikit-learn `ColumnTransformer` made of an imputing standard
//! scaler over numeric columns and a one-hot encoder over categorical ones.
//! Columns that no step names are dropped.

use crate::domain::model::{FeatureMatrix, Table};
use crate::domain::ports::Transformer;
use crate::utils::error::{InferenceError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preprocessor {
    #[serde(default = "default_format_version")]
    pub format_version: u32,
    pub steps: Vec<Step>,
}

fn default_format_version() -> u32 {
    1
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Numeric(NumericStep),
    OneHot(OneHotStep),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericStep {
    pub columns: Vec<String>,
    /// Fill value per column for blank cells; `null` disables imputation for that column.
    #[serde(default)]
    pub impute: Vec<Option<f64>>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandleUnknown {
    #[default]
    Error,
    Ignore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotStep {
    pub columns: Vec<String>,
    pub categories: Vec<Vec<String>>,
    #[serde(default)]
    pub handle_unknown: HandleUnknown,
}

impl Step {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Numeric(_) => "numeric",
            Self::OneHot(_) => "one_hot",
        }
    }

    pub fn columns(&self) -> &[String] {
        match self {
            Self::Numeric(step) => &step.columns,
            Self::OneHot(step) => &step.columns,
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Self::Numeric(step) => step.columns.len(),
            Self::OneHot(step) => step.categories.iter().map(Vec::len).sum(),
        }
    }

    fn check(&self) -> std::result::Result<(), String> {
        match self {
            Self::Numeric(step) => {
                let n = step.columns.len();
                if n == 0 {
                    return Err("numeric step has no columns".to_string());
                }
                if step.mean.len() != n || step.scale.len() != n {
                    return Err(format!(
                        "numeric step has {} columns but {} means and {} scales",
                        n,
                        step.mean.len(),
                        step.scale.len()
                    ));
                }
                if !step.impute.is_empty() && step.impute.len() != n {
                    return Err(format!(
                        "numeric step has {} columns but {} impute values",
                        n,
                        step.impute.len()
                    ));
                }
                if step.mean.iter().chain(&step.scale).any(|v| !v.is_finite()) {
                    return Err("numeric step contains a non-finite mean or scale".to_string());
                }
                Ok(())
            }
            Self::OneHot(step) => {
                if step.columns.is_empty() {
                    return Err("one_hot step has no columns".to_string());
                }
                if step.categories.len() != step.columns.len() {
                    return Err(format!(
                        "one_hot step has {} columns but {} category lists",
                        step.columns.len(),
                        step.categories.len()
                    ));
                }
                if let Some(pos) = step.categories.iter().position(Vec::is_empty) {
                    return Err(format!(
                        "one_hot column '{}' has no categories",
                        step.columns[pos]
                    ));
                }
                Ok(())
            }
        }
    }
}

impl Preprocessor {
    /// Parses and checks a preprocessor artifact. Errors are plain reasons; the caller names the file.
    pub fn from_slice(bytes: &[u8]) -> std::result::Result<Self, String> {
        let preprocessor: Self = serde_json::from_slice(bytes).map_err(|e| e.to_string())?;
        preprocessor.check()?;
        Ok(preprocessor)
    }

    fn check(&self) -> std::result::Result<(), String> {
        if self.format_version != 1 {
            return Err(format!("unsupported format_version {}", self.format_version));
        }
        if self.steps.is_empty() {
            return Err("preprocessor has no steps".to_string());
        }
        self.steps.iter().try_for_each(Step::check)
    }

    fn resolve(&self, table: &Table) -> Result<Vec<Vec<usize>>> {
        let mut missing: Vec<String> = Vec::new();
        let mut indices = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            let mut step_indices = Vec::with_capacity(step.columns().len());
            for column in step.columns() {
                match table.column_index(column) {
                    Some(idx) => step_indices.push(idx),
                    None => {
                        if !missing.contains(column) {
                            missing.push(column.clone());
                        }
                    }
                }
            }
            indices.push(step_indices);
        }

        if !missing.is_empty() {
            return Err(InferenceError::SchemaMismatch { missing }.into());
        }
        Ok(indices)
    }
}

fn cell(row: &[String], idx: usize) -> &str {
    row.get(idx).map(String::as_str).unwrap_or("")
}

fn encode_numeric(
    step: &NumericStep,
    indices: &[usize],
    row_no: usize,
    row: &[String],
    out: &mut [f64],
) -> Result<()> {
    for (k, &idx) in indices.iter().enumerate() {
        let raw = cell(row, idx).trim();
        let value = if raw.is_empty() {
            step.impute.get(k).copied().flatten()
        } else {
            raw.parse::<f64>().ok().filter(|v| v.is_finite())
        };

        let value = value.ok_or_else(|| InferenceError::InvalidValue {
            column: step.columns[k].clone(),
            row: row_no,
            value: raw.to_string(),
        })?;

        let scale = if step.scale[k] == 0.0 { 1.0 } else { step.scale[k] };
        out[k] = (value - step.mean[k]) / scale;
    }
    Ok(())
}

fn encode_one_hot(
    step: &OneHotStep,
    indices: &[usize],
    row_no: usize,
    row: &[String],
    out: &mut [f64],
) -> Result<()> {
    let mut offset = 0;
    for (k, &idx) in indices.iter().enumerate() {
        let categories = &step.categories[k];
        let value = cell(row, idx);
        match categories.iter().position(|c| c == value) {
            Some(pos) => out[offset + pos] = 1.0,
            None if step.handle_unknown == HandleUnknown::Ignore => {}
            None => {
                return Err(InferenceError::UnknownCategory {
                    column: step.columns[k].clone(),
                    row: row_no,
                    value: value.to_string(),
                }
                .into())
            }
        }
        offset += categories.len();
    }
    Ok(())
}

impl Transformer for Preprocessor {
    fn required_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        for column in self.steps.iter().flat_map(|s| s.columns()) {
            if !columns.contains(&column.as_str()) {
                columns.push(column);
            }
        }
        columns
    }

    fn n_features_out(&self) -> usize {
        self.steps.iter().map(Step::width).sum()
    }

    fn transform(&self, table: &Table) -> Result<FeatureMatrix> {
        let indices = self.resolve(table)?;
        let mut features = FeatureMatrix::zeros(table.len(), self.n_features_out());

        for (i, row) in table.rows.iter().enumerate() {
            let out = features.row_mut(i);
            let mut offset = 0;
            for (step, step_indices) in self.steps.iter().zip(&indices) {
                let width = step.width();
                let slot = &mut out[offset..offset + width];
                match step {
                    Step::Numeric(s) => encode_numeric(s, step_indices, i + 1, row, slot)?,
                    Step::OneHot(s) => encode_one_hot(s, step_indices, i + 1, row, slot)?,
                }
                offset += width;
            }
        }

        Ok(features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::error::ChurnError;

    fn preprocessor() -> Preprocessor {
        let json = serde_json::json!({
            "format_version": 1,
            "steps": [
                {
                    "kind": "numeric",
                    "columns": ["tenure", "TotalCharges"],
                    "impute": [null, 100.0],
                    "mean": [10.0, 200.0],
                    "scale": [5.0, 0.0]
                },
                {
                    "kind": "one_hot",
                    "columns": ["Contract"],
                    "categories": [["Month-to-month", "One year", "Two year"]]
                }
            ]
        });
        Preprocessor::from_slice(json.to_string().as_bytes()).unwrap()
    }

    fn table(columns: &[&str], rows: &[&[&str]]) -> Table {
        Table {
            columns: columns.iter().map(|c| c.to_string()).collect(),
            rows: rows
                .iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        }
    }

    #[test]
    fn test_transform_scales_and_encodes() {
        let p = preprocessor();
        assert_eq!(p.n_features_out(), 5);
        assert_eq!(p.required_columns(), vec!["tenure", "TotalCharges", "Contract"]);

        let t = table(
            &["Contract", "extra", "TotalCharges", "tenure"],
            &[&["One year", "ignored", "250", "20"]],
        );
        let features = p.transform(&t).unwrap();

        assert_eq!(features.n_rows, 1);
        // Zero scale is treated as one.
        assert_eq!(features.row(0), &[2.0, 50.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_blank_cell_is_imputed_only_where_configured() {
        let p = preprocessor();

        let t = table(&["tenure", "TotalCharges", "Contract"], &[&["10", " ", "Two year"]]);
        let features = p.transform(&t).unwrap();
        assert_eq!(features.row(0), &[0.0, -100.0, 0.0, 0.0, 1.0]);

        let t = table(&["tenure", "TotalCharges", "Contract"], &[&["", "1", "Two year"]]);
        let err = p.transform(&t).unwrap_err();
        assert!(err.is_schema_mismatch());
    }

    #[test]
    fn test_missing_columns_are_all_reported() {
        let p = preprocessor();
        let t = table(&["TotalCharges"], &[&["1"]]);

        match p.transform(&t) {
            Err(ChurnError::Inference(InferenceError::SchemaMismatch { missing })) => {
                assert_eq!(missing, vec!["tenure", "Contract"]);
            }
            other => panic!("expected schema mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_mistyped_value_names_row_and_column() {
        let p = preprocessor();
        let t = table(
            &["tenure", "TotalCharges", "Contract"],
            &[&["1", "1", "One year"], &["abc", "1", "One year"]],
        );

        match p.transform(&t) {
            Err(ChurnError::Inference(InferenceError::InvalidValue { column, row, value })) => {
                assert_eq!(column, "tenure");
                assert_eq!(row, 2);
                assert_eq!(value, "abc");
            }
            other => panic!("expected invalid value, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_category_policy() {
        let mut p = preprocessor();
        let t = table(&["tenure", "TotalCharges", "Contract"], &[&["1", "1", "Weekly"]]);

        assert!(matches!(
            p.transform(&t),
            Err(ChurnError::Inference(InferenceError::UnknownCategory { .. }))
        ));

        if let Step::OneHot(step) = &mut p.steps[1] {
            step.handle_unknown = HandleUnknown::Ignore;
        }
        let features = p.transform(&t).unwrap();
        assert_eq!(&features.row(0)[2..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_inconsistent_artifact_is_rejected() {
        let json = r#"{"steps":[{"kind":"numeric","columns":["tenure"],"mean":[1.0,2.0],"scale":[1.0]}]}"#;
        let err = Preprocessor::from_slice(json.as_bytes()).unwrap_err();
        assert!(err.contains("1 columns but 2 means"));

        let json = r#"{"steps":[{"kind":"target_encoder","columns":["tenure"]}]}"#;
        assert!(Preprocessor::from_slice(json.as_bytes()).is_err());

        assert!(Preprocessor::from_slice(br#"{"steps":[]}"#).is_err());
    }
}
