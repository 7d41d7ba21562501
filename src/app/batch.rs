use crate::core::classifier::VotingClassifier;
use crate::core::inference::InferenceAdapter;
use crate::core::preprocessing::Preprocessor;
use crate::core::table::{read_csv, to_csv_bytes};
use crate::domain::model::{Table, PREDICTION_COLUMN};
use crate::domain::ports::{Classifier, ConfigProvider, Storage, Transformer};
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;
use std::io::Write;
use std::path::Path;
use zip::write::{FileOptions, ZipWriter};

/// What a successful batch request hands back to the user.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub rows: usize,
    pub churners: usize,
    pub preview: Table,
    pub output_path: String,
}

/// Reads an uploaded CSV, scores it as one batch and exports the result.
pub struct BatchPipeline<
    S: Storage,
    C: ConfigProvider,
    T: Transformer = Preprocessor,
    M: Classifier = VotingClassifier,
> {
    adapter: InferenceAdapter<T, M>,
    storage: S,
    config: C,
    monitor: SystemMonitor,
}

impl<S: Storage, C: ConfigProvider, T: Transformer, M: Classifier> BatchPipeline<S, C, T, M> {
    pub fn new(adapter: InferenceAdapter<T, M>, storage: S, config: C) -> Self {
        Self::new_with_monitoring(adapter, storage, config, false)
    }

    pub fn new_with_monitoring(
        adapter: InferenceAdapter<T, M>,
        storage: S,
        config: C,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            adapter,
            storage,
            config,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub fn extract(&self, input: &Path) -> Result<Table> {
        tracing::info!("📂 Reading batch file: {}", input.display());
        let file = std::fs::File::open(input)?;
        read_csv(file)
    }

    pub fn score(&self, table: Table) -> Result<Table> {
        if self.config.with_probability() {
            self.adapter.predict_batch_with_probability(table)
        } else {
            self.adapter.predict_batch(table)
        }
    }

    /// Writes the scored table and returns where it went.
    pub fn load(&self, table: &Table) -> Result<String> {
        let csv_name = resolve_file_name(self.config.export_file_name());
        let csv_data = to_csv_bytes(table)?;

        let (file_name, data) = if self.config.compress_export() {
            let zip_name = match csv_name.strip_suffix(".csv") {
                Some(stem) => format!("{}.zip", stem),
                None => format!("{}.zip", csv_name),
            };

            let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
            zip.start_file::<_, ()>(csv_name.as_str(), FileOptions::default())?;
            zip.write_all(&csv_data)?;
            let cursor = zip.finish()?;
            (zip_name, cursor.into_inner())
        } else {
            (csv_name, csv_data)
        };

        tracing::debug!("Writing {} ({} bytes) to storage", file_name, data.len());
        self.storage.write_file(&file_name, &data)?;
        Ok(self.storage.display_path(&file_name))
    }

    /// Runs the whole request. Nothing is written unless every row scored.
    pub fn run(&self, input: &Path) -> Result<BatchOutcome> {
        let table = self.extract(input)?;
        self.monitor.log_stats("After reading input");

        let scored = self.score(table)?;
        self.monitor.log_stats("After inference");

        let output_path = self.load(&scored)?;
        self.monitor.log_stats("After export");
        self.monitor.log_final_stats();

        let churners = scored
            .column(PREDICTION_COLUMN)
            .map(|labels| labels.iter().filter(|l| **l == "1").count())
            .unwrap_or(0);

        Ok(BatchOutcome {
            rows: scored.len(),
            churners,
            preview: scored.head(self.config.preview_rows()),
            output_path,
        })
    }
}

/// Expands `{timestamp}` (UTC) in an export file name.
pub fn resolve_file_name(pattern: &str) -> String {
    if pattern.contains("{timestamp}") {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S").to_string();
        pattern.replace("{timestamp}", &timestamp)
    } else {
        pattern.to_string()
    }
}

/// Plain-text grid of a table, columns padded to their widest cell.
pub fn render_table(table: &Table) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let format_row = |cells: &[String]| {
        widths
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let cell = cells.get(i).map(String::as_str).unwrap_or("");
                format!("{:<width$}", cell, width = *w)
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut lines = vec![format_row(table.columns.as_slice())];
    lines.extend(table.rows.iter().map(|row| format_row(row.as_slice())));
    lines.join("\n")
}

pub fn render_outcome(outcome: &BatchOutcome) -> String {
    format!(
        "✅ Batch prediction completed!\n{} rows scored, {} predicted to churn.\n\n{}\n\n📁 Predictions saved to: {}",
        outcome.rows,
        outcome.churners,
        render_table(&outcome.preview),
        outcome.output_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_file_name() {
        assert_eq!(resolve_file_name("out.csv"), "out.csv");

        let resolved = resolve_file_name("scored_{timestamp}.csv");
        assert!(resolved.starts_with("scored_"));
        assert!(resolved.ends_with(".csv"));
        assert!(!resolved.contains('{'));
        // scored_ + YYYYMMDD_HHMMSS + .csv
        assert_eq!(resolved.len(), "scored_".len() + 15 + ".csv".len());
    }

    #[test]
    fn test_render_table_aligns_columns() {
        let table = Table {
            columns: vec!["gender".to_string(), "Churn_Prediction".to_string()],
            rows: vec![
                vec!["Female".to_string(), "1".to_string()],
                vec!["Male".to_string(), "0".to_string()],
            ],
        };
        assert_eq!(
            render_table(&table),
            "gender  Churn_Prediction\nFemale  1\nMale    0"
        );
    }
}
