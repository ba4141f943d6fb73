// src/exec/mod.rs

//! Process execution layer.
//!
//! This module runs external binaries with `tokio::process::Command` and
//! returns their complete output.
//!
//! - [`request`] defines `ExecutionRequest` / `ExecutionResult`.
//! - [`runner`] owns `ProcessRunner`: spawn, concurrent drains, exit wait,
//!   deadline handling.
//! - [`capture`] accumulates per-stream bytes, optionally bounded.
//! - [`sink`] forwards lines in real time (`tracing`, recording, none).
//! - [`backend`] provides the `ProcessBackend` trait so callers can swap in
//!   a fake runner in tests.

pub mod backend;
pub mod capture;
pub mod request;
pub mod runner;
pub mod sink;

pub use backend::{BoxFuture, ProcessBackend};
pub use capture::Capture;
pub use request::{CommandOutput, ExecutionRequest, ExecutionResult};
pub use runner::ProcessRunner;
pub use sink::{LineSink, NullSink, RecordingSink, Stream, TracingSink};
