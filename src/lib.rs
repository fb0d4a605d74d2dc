//! Core library for the `volley` CLI.
//!
//! `volley` replays a file of HTTP work items from a fleet of worker
//! processes. The controller spawns the workers, drives them over a small
//! JSON-lines RPC protocol and merges their statistics into one summary.
//! The crate exposes the building blocks the binary uses: CLI arguments,
//! configuration, the execution engine, the RPC layer and the fleet
//! controller.
pub mod args;
pub mod config;
pub mod engine;
pub mod entry;
pub mod error;
pub mod fleet;
pub mod http;
pub mod metrics;
pub mod rpc;
pub(crate) mod system;

#[cfg(feature = "fuzzing")]
pub mod fuzzing;
