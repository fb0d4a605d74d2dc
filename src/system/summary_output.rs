use std::time::Duration;

use serde_json::json;

use crate::args::OutputFormat;
use crate::error::AppResult;
use crate::fleet::FleetResult;

/// Width labels are padded to with dots in the text summary.
const LABEL_WIDTH: usize = 45;
/// SI byte units, as used for human-readable sizes.
const BYTE_UNITS: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
/// Placeholder for a value no process observed.
const NOT_AVAILABLE: &str = "n/a";

/// Run options echoed alongside the merged statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SummaryContext {
    pub(crate) worker_count: usize,
    pub(crate) random: bool,
}

struct SummaryField {
    label: &'static str,
    text: String,
    raw: String,
}

impl SummaryField {
    fn same(label: &'static str, value: String) -> Self {
        Self {
            label,
            text: value.clone(),
            raw: value,
        }
    }
}

pub(crate) fn render_summary(
    result: &FleetResult,
    context: SummaryContext,
    format: OutputFormat,
) -> AppResult<String> {
    match format {
        OutputFormat::Text => Ok(text_summary(result, context)),
        OutputFormat::Csv => Ok(csv_summary(result, context)),
        OutputFormat::Json => json_summary(result, context),
    }
}

fn summary_fields(result: &FleetResult, context: SummaryContext) -> Vec<SummaryField> {
    vec![
        SummaryField::same("Transactions", result.transactions.to_string()),
        SummaryField::same("Availability (%)", format!("{:.2}", percent(result.availability))),
        SummaryField::same(
            "Elapsed Time (ms)",
            format!("{:.2}", duration_ms(result.elapsed_time)),
        ),
        SummaryField {
            label: "Total Bytes Sent",
            text: human_bytes(to_f64(result.total_bytes_sent)),
            raw: result.total_bytes_sent.to_string(),
        },
        SummaryField {
            label: "Total Bytes Received",
            text: human_bytes(to_f64(result.total_bytes_received)),
            raw: result.total_bytes_received.to_string(),
        },
        SummaryField::same(
            "Average Response Time (ms)",
            format!("{:.2}", duration_ms(result.average_response_time)),
        ),
        SummaryField::same(
            "Average Transaction Rate (requests/sec)",
            format!("{:.2}", result.transaction_rate),
        ),
        SummaryField::same("Concurrency", format!("{:.2}", result.concurrency_rate)),
        SummaryField {
            label: "Data Send Rate (bytes/sec)",
            text: format!("{}/s", human_bytes(result.data_send_rate)),
            raw: format!("{:.2}", result.data_send_rate),
        },
        SummaryField {
            label: "Data Receive Rate (bytes/sec)",
            text: format!("{}/s", human_bytes(result.data_receive_rate)),
            raw: format!("{:.2}", result.data_receive_rate),
        },
        SummaryField::same(
            "Successful Transactions",
            result.successful_transactions.to_string(),
        ),
        SummaryField::same("Failed Transactions", result.failed_transactions.to_string()),
        SummaryField::same(
            "Longest Transaction (ms)",
            format!("{:.2}", duration_ms(result.longest_transaction)),
        ),
        SummaryField {
            label: "Shortest Transaction (ms)",
            text: result.shortest_transaction.map_or_else(
                || NOT_AVAILABLE.to_owned(),
                |shortest| format!("{:.2}", duration_ms(shortest)),
            ),
            raw: result
                .shortest_transaction
                .map(|shortest| format!("{:.2}", duration_ms(shortest)))
                .unwrap_or_default(),
        },
        SummaryField::same("Processes", result.processes.to_string()),
        SummaryField::same("Worker Count", context.worker_count.to_string()),
        SummaryField::same("Random", context.random.to_string()),
    ]
}

fn text_summary(result: &FleetResult, context: SummaryContext) -> String {
    let lines: Vec<String> = summary_fields(result, context)
        .iter()
        .map(|field| format!("{:.<width$}: {}", field.label, field.text, width = LABEL_WIDTH))
        .collect();
    format!(
        "volley v{} | {} worker processes\n{}\n",
        env!("CARGO_PKG_VERSION"),
        result.processes,
        lines.join("\n")
    )
}

fn csv_summary(result: &FleetResult, context: SummaryContext) -> String {
    let (header, row) = csv_record(result, context);
    format!("{}\n{}\n", header, row)
}

/// CSV header line and value line, both without a trailing newline.
pub(crate) fn csv_record(result: &FleetResult, context: SummaryContext) -> (String, String) {
    let fields = summary_fields(result, context);
    let header: Vec<&str> = fields.iter().map(|field| field.label).collect();
    let values: Vec<&str> = fields.iter().map(|field| field.raw.as_str()).collect();
    (header.join(","), values.join(","))
}

fn json_summary(result: &FleetResult, context: SummaryContext) -> AppResult<String> {
    let payload = json!({
        "processes": result.processes,
        "worker_count": context.worker_count,
        "random": context.random,
        "transactions": result.transactions,
        "successful_transactions": result.successful_transactions,
        "failed_transactions": result.failed_transactions,
        "availability": result.availability,
        "total_bytes_sent": result.total_bytes_sent,
        "total_bytes_received": result.total_bytes_received,
        "average_response_time_ms": duration_ms(result.average_response_time),
        "longest_transaction_ms": duration_ms(result.longest_transaction),
        "shortest_transaction_ms": result.shortest_transaction.map(duration_ms),
        "transaction_rate": result.transaction_rate,
        "data_send_rate": result.data_send_rate,
        "data_receive_rate": result.data_receive_rate,
        "concurrency_rate": result.concurrency_rate,
        "elapsed_time_ms": duration_ms(result.elapsed_time),
    });
    let mut rendered = serde_json::to_string_pretty(&payload)?;
    rendered.push('\n');
    Ok(rendered)
}

#[expect(clippy::float_arithmetic, reason = "Reporting durations in milliseconds.")]
fn duration_ms(value: Duration) -> f64 {
    value.as_secs_f64() * 1_000.0
}

#[expect(clippy::float_arithmetic, reason = "Reporting availability as a percentage.")]
fn percent(ratio: f64) -> f64 {
    ratio * 100.0
}

const fn to_f64(value: u64) -> f64 {
    value as f64
}

/// SI-scaled size, e.g. `1.5 kB` or `83 MB`.
#[expect(clippy::float_arithmetic, reason = "Scaling byte counts to SI units.")]
fn human_bytes(bytes: f64) -> String {
    if !bytes.is_finite() || bytes < 10.0 {
        return format!("{:.0} B", bytes.max(0.0));
    }
    let mut value = bytes;
    let mut unit = "B";
    for next in BYTE_UNITS.iter().skip(1) {
        if value < 1_000.0 {
            break;
        }
        value /= 1_000.0;
        unit = next;
    }
    let rounded = (value * 10.0).round() / 10.0;
    if rounded < 10.0 {
        format!("{:.1} {}", rounded, unit)
    } else {
        format!("{:.0} {}", rounded, unit)
    }
}
