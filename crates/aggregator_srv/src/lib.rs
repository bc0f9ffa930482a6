#![deny(missing_docs)]
//! hopdist aggregator server is a long-running tcp collector for the
//! results of hop-count relaxation workers.
//!
//! Each worker group opens one connection per result, sends a single
//! length-prefixed json frame, and waits for the literal `OK`
//! acknowledgment. See [hopdist_api] for the wire format.
//!
//! The server keeps the latest result per worker id in a [Registry].
//! A [CompletionMonitor] polls that registry until the expected number
//! of distinct workers has reported.
//!
//! A malformed or stalled submission is logged and dropped with its
//! connection. Nothing a single peer sends can stop the server from
//! accepting further connections.

mod config;
pub use config::*;

mod registry;
pub use registry::*;

mod monitor;
pub use monitor::*;

mod server;
pub use server::*;
