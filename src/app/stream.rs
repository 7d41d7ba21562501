use crate::app::single::predict_single;
use crate::core::inference::InferenceAdapter;
use crate::domain::model::CustomerRecord;
use crate::domain::ports::{Classifier, Transformer};
use crate::utils::error::Result;
use serde::Serialize;
use std::io::{BufRead, Write};

#[derive(Debug, Serialize)]
struct StreamResponse {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Answers one JSON record per line. A failed line is reported and the stream goes on;
/// only I/O errors on the streams themselves end it.
pub fn run_stream<T, C, R, W>(
    adapter: &InferenceAdapter<T, C>,
    input: R,
    mut output: W,
) -> Result<StreamSummary>
where
    T: Transformer,
    C: Classifier,
    R: BufRead,
    W: Write,
{
    let mut summary = StreamSummary::default();

    for (line_no, line) in input.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let result = serde_json::from_str::<CustomerRecord>(&line)
            .map_err(Into::into)
            .and_then(|record| predict_single(adapter, &record));

        let response = match result {
            Ok(prediction) => {
                summary.succeeded += 1;
                StreamResponse {
                    ok: true,
                    label: Some(prediction.label),
                    probability: Some(prediction.probability),
                    error: None,
                }
            }
            Err(e) => {
                summary.failed += 1;
                tracing::warn!("Line {} rejected: {}", line_no + 1, e);
                StreamResponse {
                    ok: false,
                    label: None,
                    probability: None,
                    error: Some(e.user_friendly_message()),
                }
            }
        };

        serde_json::to_writer(&mut output, &response)?;
        output.write_all(b"\n")?;
        output.flush()?;
    }

    tracing::info!(
        "Stream finished: {} answered, {} rejected",
        summary.succeeded,
        summary.failed
    );
    Ok(summary)
}
