// src/extract/field.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The fixed set of fields mined from installer output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    ApiServerUrl,
    WebConsoleUrl,
    KubeconfigExportCommand,
    Username,
    Password,
}

impl Field {
    pub const ALL: [Field; 5] = [
        Field::ApiServerUrl,
        Field::WebConsoleUrl,
        Field::KubeconfigExportCommand,
        Field::Username,
        Field::Password,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Field::ApiServerUrl => "api_server_url",
            Field::WebConsoleUrl => "web_console_url",
            Field::KubeconfigExportCommand => "kubeconfig_export_command",
            Field::Username => "username",
            Field::Password => "password",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Field::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown field: {wanted} (expected one of {})",
                    Field::ALL.map(Field::as_str).join(", ")
                )
            })
    }
}

/// Structured data mined from the installer log.
///
/// Each field is independently present or absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StructuredInstallationInfo {
    pub api_server_url: Option<String>,
    pub web_console_url: Option<String>,
    pub kubeconfig_export_command: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl StructuredInstallationInfo {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref()
    }

    pub fn is_present(&self, field: Field) -> bool {
        self.get(field).is_some()
    }

    /// Set `field` unless it already holds a value. Returns whether the value
    /// was stored.
    pub fn set_if_absent(&mut self, field: Field, value: String) -> bool {
        let slot = self.slot_mut(field);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// Path part of the kubeconfig export command
    /// (`export KUBECONFIG=/path` → `/path`).
    pub fn kubeconfig_path(&self) -> Option<&str> {
        let cmd = self.kubeconfig_export_command.as_deref()?;
        let (_, value) = cmd.split_once('=')?;
        let value = value.trim().trim_matches(|c| c == '"' || c == '\'');
        (!value.is_empty()).then_some(value)
    }

    pub fn missing(&self) -> Vec<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !self.is_present(*f))
            .collect()
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::ApiServerUrl => &self.api_server_url,
            Field::WebConsoleUrl => &self.web_console_url,
            Field::KubeconfigExportCommand => &self.kubeconfig_export_command,
            Field::Username => &self.username,
            Field::Password => &self.password,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::ApiServerUrl => &mut self.api_server_url,
            Field::WebConsoleUrl => &mut self.web_console_url,
            Field::KubeconfigExportCommand => &mut self.kubeconfig_export_command,
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
        }
    }
}
