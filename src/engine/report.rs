// src/engine/report.rs

//! The outward result surface: one serialisable object per install.

use std::path::PathBuf;

use serde::Serialize;

use crate::engine::orchestrator::InstallOutcome;
use crate::engine::stage::Stage;
use crate::errors::{StageFailure, stderr_tail};
use crate::extract::StructuredInstallationInfo;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub cluster: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    /// Present once the installer ran (also for timeouts and strict
    /// extraction failures). A collaborator CLI failing in Validate or
    /// Prepare leaves it empty; its output is only in `message`.
    pub exit_code: Option<i32>,
    pub fields: StructuredInstallationInfo,
    pub credentials: Option<Credentials>,
    pub kubeconfig: Option<String>,
    pub config_path: Option<PathBuf>,
    pub stdout: String,
    pub stderr_tail: String,
}

impl InstallReport {
    pub fn new(cluster: &str, result: &Result<InstallOutcome, StageFailure>) -> Self {
        match result {
            Ok(outcome) => Self::success(outcome),
            Err(failure) => Self::failure(cluster, failure),
        }
    }

    pub fn success(outcome: &InstallOutcome) -> Self {
        let info = &outcome.info;
        let credentials = match (&info.username, &info.password) {
            (Some(user), Some(password)) => Some(Credentials {
                user: user.clone(),
                password: password.clone(),
            }),
            _ => None,
        };
        Self {
            cluster: outcome.cluster.clone(),
            success: true,
            message: format!("Openshift cluster {} was created successfully", outcome.cluster),
            failed_stage: None,
            exit_code: Some(outcome.execution.exit_code),
            fields: info.clone(),
            credentials,
            kubeconfig: info.kubeconfig_path().map(str::to_string),
            config_path: Some(outcome.config_path.clone()),
            stdout: outcome.execution.stdout.clone(),
            stderr_tail: stderr_tail(&outcome.execution.stderr),
        }
    }

    pub fn failure(cluster: &str, failure: &StageFailure) -> Self {
        let installer_ran = matches!(failure.stage, Stage::Execute | Stage::Extract);
        let captured = failure.captured().filter(|_| installer_ran);
        Self {
            cluster: cluster.to_string(),
            success: false,
            message: failure.to_string(),
            failed_stage: Some(failure.stage),
            exit_code: captured.map(|r| r.exit_code),
            fields: StructuredInstallationInfo::default(),
            credentials: None,
            kubeconfig: None,
            config_path: None,
            stdout: captured.map(|r| r.stdout.clone()).unwrap_or_default(),
            stderr_tail: captured.map(|r| stderr_tail(&r.stderr)).unwrap_or_default(),
        }
    }
}
