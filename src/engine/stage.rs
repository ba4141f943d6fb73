// src/engine/stage.rs

use std::fmt;

use serde::Serialize;

/// Pipeline stage of an orchestrated install.
///
/// The pipeline is strictly linear; every stage either hands over to
/// [`Stage::next`] or ends the run with a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Validate,
    Prepare,
    Execute,
    Extract,
    Finalize,
}

impl Stage {
    pub const ORDER: [Stage; 5] = [
        Stage::Validate,
        Stage::Prepare,
        Stage::Execute,
        Stage::Extract,
        Stage::Finalize,
    ];

    pub fn next(self) -> Option<Stage> {
        match self {
            Stage::Validate => Some(Stage::Prepare),
            Stage::Prepare => Some(Stage::Execute),
            Stage::Execute => Some(Stage::Extract),
            Stage::Extract => Some(Stage::Finalize),
            Stage::Finalize => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Validate => "validate",
            Stage::Prepare => "prepare",
            Stage::Execute => "execute",
            Stage::Extract => "extract",
            Stage::Finalize => "finalize",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
