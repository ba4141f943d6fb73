// src/exec/backend.rs

//! Pluggable process backend abstraction.
//!
//! The orchestrator and the CLI-backed collaborators talk to a
//! `ProcessBackend` instead of a concrete runner. Production code uses
//! [`ProcessRunner`]; tests substitute a fake that returns canned
//! [`ExecutionResult`]s without spawning anything.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;
use crate::exec::request::{ExecutionRequest, ExecutionResult};
use crate::exec::runner::ProcessRunner;

/// Boxed, sendable future used across the crate's trait seams.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Trait abstracting how a process request is executed.
pub trait ProcessBackend: Send + Sync {
    /// Execute `request` and return its complete result.
    ///
    /// Implementations must follow the [`ProcessRunner::run`] contract:
    /// a nonzero exit is a successful call carrying that exit code.
    fn run<'a>(&'a self, request: &'a ExecutionRequest) -> BoxFuture<'a, Result<ExecutionResult>>;
}

impl ProcessBackend for ProcessRunner {
    fn run<'a>(&'a self, request: &'a ExecutionRequest) -> BoxFuture<'a, Result<ExecutionResult>> {
        Box::pin(ProcessRunner::run(self, request))
    }
}
