// src/engine/mod.rs

//! Install orchestration.
//!
//! - [`stage`]: the linear stage sequence.
//! - [`orchestrator`]: runs the stages against the process backend and the
//!   collaborators.
//! - [`locks`]: per-cluster serialisation across concurrent installs.
//! - [`report`]: the serialisable result handed to outer callers.

pub mod locks;
pub mod orchestrator;
pub mod report;
pub mod stage;

pub use locks::ClusterLocks;
pub use orchestrator::{InstallOutcome, Orchestrator, Prepared, Validated};
pub use report::{Credentials, InstallReport};
pub use stage::Stage;
