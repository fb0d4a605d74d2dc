use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    Run(RunRequest),
    RunResult(Box<WireProcessResult>),
    Ping,
    Pong(PingResponse),
    Kill,
    Killed(KillResponse),
    Error(ErrorMessage),
}

impl WireMessage {
    /// Wire tag of the message, for diagnostics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            WireMessage::Run(_) => "run",
            WireMessage::RunResult(_) => "run_result",
            WireMessage::Ping => "ping",
            WireMessage::Pong(_) => "pong",
            WireMessage::Kill => "kill",
            WireMessage::Killed(_) => "killed",
            WireMessage::Error(_) => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRequest {
    pub iterations: i32,
    pub lines: Vec<String>,
    pub random: bool,
    pub worker_count: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResponse {
    pub healthy: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillResponse {
    pub killed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}

/// `ProcessResult` as it crosses the wire; durations are whole nanoseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireProcessResult {
    pub transactions: u64,
    pub successful_transactions: u64,
    pub failed_transactions: u64,
    pub total_bytes_sent: u64,
    pub total_bytes_received: u64,
    pub average_response_time_ns: u64,
    pub longest_transaction_ns: u64,
    #[serde(default)]
    pub shortest_transaction_ns: Option<u64>,
    pub transaction_rate: f64,
    pub data_send_rate: f64,
    pub data_receive_rate: f64,
    pub concurrency_rate: f64,
    pub availability: f64,
    pub elapsed_time_ns: u64,
}
