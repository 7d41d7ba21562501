use crate::utils::error::Result;
use crate::utils::validation::{validate_range, Validate};
use serde::{Deserialize, Serialize};

/// Name of the column `predict_batch` writes labels into.
pub const PREDICTION_COLUMN: &str = "Churn_Prediction";
/// Name of the optional probability column.
pub const PROBABILITY_COLUMN: &str = "Churn_Probability";

/// Column order of a single-record table.
pub const RECORD_COLUMNS: [&str; 8] = [
    "gender",
    "SeniorCitizen",
    "tenure",
    "MonthlyCharges",
    "TotalCharges",
    "Contract",
    "InternetService",
    "PaymentMethod",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Gender {
    #[cfg_attr(feature = "cli", value(name = "Male"))]
    Male,
    #[cfg_attr(feature = "cli", value(name = "Female"))]
    Female,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Contract {
    #[serde(rename = "Month-to-month")]
    #[cfg_attr(feature = "cli", value(name = "Month-to-month"))]
    MonthToMonth,
    #[serde(rename = "One year")]
    #[cfg_attr(feature = "cli", value(name = "One year"))]
    OneYear,
    #[serde(rename = "Two year")]
    #[cfg_attr(feature = "cli", value(name = "Two year"))]
    TwoYear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum InternetService {
    #[serde(rename = "DSL")]
    #[cfg_attr(feature = "cli", value(name = "DSL"))]
    Dsl,
    #[serde(rename = "Fiber optic")]
    #[cfg_attr(feature = "cli", value(name = "Fiber optic"))]
    FiberOptic,
    #[serde(rename = "No")]
    #[cfg_attr(feature = "cli", value(name = "No"))]
    No,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum PaymentMethod {
    #[serde(rename = "Electronic check")]
    #[cfg_attr(feature = "cli", value(name = "Electronic check"))]
    ElectronicCheck,
    #[serde(rename = "Mailed check")]
    #[cfg_attr(feature = "cli", value(name = "Mailed check"))]
    MailedCheck,
    #[serde(rename = "Bank transfer")]
    #[cfg_attr(feature = "cli", value(name = "Bank transfer"))]
    BankTransfer,
    #[serde(rename = "Credit card")]
    #[cfg_attr(feature = "cli", value(name = "Credit card"))]
    CreditCard,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "Male",
            Self::Female => "Female",
        }
    }
}

impl Contract {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MonthToMonth => "Month-to-month",
            Self::OneYear => "One year",
            Self::TwoYear => "Two year",
        }
    }
}

impl InternetService {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dsl => "DSL",
            Self::FiberOptic => "Fiber optic",
            Self::No => "No",
        }
    }
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ElectronicCheck => "Electronic check",
            Self::MailedCheck => "Mailed check",
            Self::BankTransfer => "Bank transfer",
            Self::CreditCard => "Credit card",
        }
    }
}

/// One customer as entered on the form or received as a JSON line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerRecord {
    pub gender: Gender,
    #[serde(rename = "SeniorCitizen")]
    pub senior_citizen: u8,
    pub tenure: i64,
    #[serde(rename = "MonthlyCharges")]
    pub monthly_charges: f64,
    #[serde(rename = "TotalCharges")]
    pub total_charges: f64,
    #[serde(rename = "Contract")]
    pub contract: Contract,
    #[serde(rename = "InternetService")]
    pub internet_service: InternetService,
    #[serde(rename = "PaymentMethod")]
    pub payment_method: PaymentMethod,
}

impl Default for CustomerRecord {
    fn default() -> Self {
        Self {
            gender: Gender::Male,
            senior_citizen: 0,
            tenure: 12,
            monthly_charges: 50.0,
            total_charges: 1000.0,
            contract: Contract::MonthToMonth,
            internet_service: InternetService::Dsl,
            payment_method: PaymentMethod::ElectronicCheck,
        }
    }
}

impl CustomerRecord {
    /// One-row table with exactly the [`RECORD_COLUMNS`] schema.
    pub fn to_table(&self) -> Table {
        Table {
            columns: RECORD_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: vec![vec![
                self.gender.as_str().to_string(),
                self.senior_citizen.to_string(),
                self.tenure.to_string(),
                self.monthly_charges.to_string(),
                self.total_charges.to_string(),
                self.contract.as_str().to_string(),
                self.internet_service.as_str().to_string(),
                self.payment_method.as_str().to_string(),
            ]],
        }
    }
}

impl Validate for CustomerRecord {
    fn validate(&self) -> Result<()> {
        validate_range("SeniorCitizen", self.senior_citizen, 0, 1)?;
        validate_range("tenure", self.tenure, 0, 72)?;
        validate_range("MonthlyCharges", self.monthly_charges, 0.0, 200.0)?;
        validate_range("TotalCharges", self.total_charges, 0.0, 10000.0)?;
        Ok(())
    }
}

/// Tabular data with string cells kept exactly as read.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let idx = self.column_index(name)?;
        Some(
            self.rows
                .iter()
                .map(|row| row.get(idx).map(String::as_str).unwrap_or(""))
                .collect(),
        )
    }

    /// Writes `values` into `name`, replacing an existing column in place or appending a new one.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) {
        debug_assert_eq!(values.len(), self.rows.len());
        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    if idx < row.len() {
                        row[idx] = value;
                    } else {
                        row.resize(idx, String::new());
                        row.push(value);
                    }
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
    }

    /// First `n` rows, for previews.
    pub fn head(&self, n: usize) -> Table {
        Table {
            columns: self.columns.clone(),
            rows: self.rows.iter().take(n).cloned().collect(),
        }
    }
}

/// Dense row-major feature matrix produced by a transformer.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix {
    pub n_rows: usize,
    pub n_cols: usize,
    pub values: Vec<f64>,
}

impl FeatureMatrix {
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        Self {
            n_rows,
            n_cols,
            values: vec![0.0; n_rows * n_cols],
        }
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn row_mut(&mut self, i: usize) -> &mut [f64] {
        &mut self.values[i * self.n_cols..(i + 1) * self.n_cols]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.n_rows).map(move |i| self.row(i))
    }
}

/// Label and class-1 probability for one record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: u8,
    pub probability: f64,
}

impl Prediction {
    pub fn is_churn(&self) -> bool {
        self.label == 1
    }
}
