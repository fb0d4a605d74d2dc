//! Work items and the transport that executes them.
mod client;
mod size;
mod transport;
mod work_item;


pub use client::{ReqwestTransport, TransportSettings};
pub use transport::{Transport, TransportResponse};
pub use work_item::{HttpVerb, WorkItem, load_work_items, parse_work_items};
