use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, AppResult, MetricsError};
use crate::fleet::FleetResult;

use super::summary_output::{SummaryContext, csv_record};

/// Appends one CSV row for this run to the history file at `path`.
///
/// The file is created when missing. The CSV header is written only when the
/// file is empty, so repeated runs accumulate rows under a single header.
///
/// # Errors
///
/// Returns `MetricsError::HistoryWrite` when the file cannot be opened or
/// written.
pub(crate) async fn append_history(
    path: &Path,
    result: &FleetResult,
    context: SummaryContext,
) -> AppResult<()> {
    let write_failed = |source: std::io::Error| {
        AppError::metrics(MetricsError::HistoryWrite {
            path: path.to_path_buf(),
            source,
        })
    };

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .await
        .map_err(write_failed)?;
    let existing_len = file.metadata().await.map_err(write_failed)?.len();

    let (header, row) = csv_record(result, context);
    let record = if existing_len == 0 {
        format!("{}\n{}\n", header, row)
    } else {
        format!("{}\n", row)
    };
    file.write_all(record.as_bytes())
        .await
        .map_err(write_failed)?;
    file.flush().await.map_err(write_failed)?;
    Ok(())
}
