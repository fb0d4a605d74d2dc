//! JSON-lines RPC between the controller and its worker processes.
mod client;
mod protocol;
mod server;
mod wire;

#[cfg(test)]
mod tests;

pub use client::WorkerClient;
pub use protocol::{
    ErrorMessage, KillResponse, MAX_MESSAGE_BYTES, PingResponse, RunRequest, WireMessage,
    WireProcessResult, read_message, send_message,
};
pub use server::{ShutdownHandle, WorkerServer};
pub use wire::{run_request, wire_worker_count};
