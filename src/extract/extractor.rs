// src/extract/extractor.rs

use tracing::{debug, warn};

use crate::errors::{ProvisionError, Result};
use crate::extract::field::{Field, StructuredInstallationInfo};
use crate::extract::rules::{FieldRule, installer_rules};

/// Absence policy for [`Extractor::extract`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Unmatched fields are simply absent.
    #[default]
    Lenient,
    /// The listed fields must all be found. The first missing one, in this
    /// order, fails the call.
    Strict(Vec<Field>),
}

impl Strictness {
    /// Build from a strict flag and a required-field list.
    pub fn from_flag(strict: bool, required: &[Field]) -> Self {
        if strict {
            Strictness::Strict(required.to_vec())
        } else {
            Strictness::Lenient
        }
    }
}

/// Applies an ordered rule set to free-form text.
///
/// Extraction is a pure function of `(text, rules, strictness)`: running it
/// twice on the same input yields the same result.
#[derive(Debug, Clone)]
pub struct Extractor {
    rules: Vec<FieldRule>,
}

impl Extractor {
    pub fn new(rules: Vec<FieldRule>) -> Self {
        Self { rules }
    }

    /// Extractor preloaded with [`installer_rules`].
    pub fn installer() -> Result<Self> {
        Ok(Self::new(installer_rules()?))
    }

    pub fn rules(&self) -> &[FieldRule] {
        &self.rules
    }

    /// Evaluate every rule against the whole of `text`.
    ///
    /// Rules run in order and independently; when several rules target the
    /// same field, the first one that matches supplies the value.
    pub fn extract(&self, text: &str, strictness: &Strictness) -> Result<StructuredInstallationInfo> {
        let mut info = StructuredInstallationInfo::default();

        for rule in &self.rules {
            if info.is_present(rule.field()) {
                continue;
            }
            match rule.find(text) {
                Some(value) => {
                    debug!(field = %rule.field(), pattern = rule.pattern(), "rule matched");
                    info.set_if_absent(rule.field(), value);
                }
                None => {
                    debug!(field = %rule.field(), pattern = rule.pattern(), "rule did not match");
                }
            }
        }

        if let Strictness::Strict(required) = strictness {
            if let Some(missing) = required.iter().copied().find(|f| !info.is_present(*f)) {
                warn!(field = %missing, "required field missing from output");
                return Err(ProvisionError::Extraction(missing));
            }
        }

        Ok(info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = r#"level=info msg="Waiting up to 20m0s for the Kubernetes API at https://api.hub.ocp.example.com:6443..."
level=info msg="Install complete!"
level=info msg="To access the cluster as the system:admin user when using 'oc', run 'export KUBECONFIG=/home/me/clusters/hub/auth/kubeconfig'"
level=info msg="Access the OpenShift web-console here: https://console-openshift-console.apps.hub.ocp.example.com"
level=info msg="Login to the console with user: \"kubeadmin\", and password: \"AbCd-1234-EfGh\""
"#;

    #[test]
    fn extracts_all_fields_from_logfmt_output() {
        let info = Extractor::installer()
            .unwrap()
            .extract(LOG, &Strictness::Strict(Field::ALL.to_vec()))
            .unwrap();

        assert_eq!(
            info.api_server_url.as_deref(),
            Some("https://api.hub.ocp.example.com:6443")
        );
        assert_eq!(
            info.web_console_url.as_deref(),
            Some("https://console-openshift-console.apps.hub.ocp.example.com")
        );
        assert_eq!(
            info.kubeconfig_export_command.as_deref(),
            Some("export KUBECONFIG=/home/me/clusters/hub/auth/kubeconfig")
        );
        assert_eq!(info.username.as_deref(), Some("kubeadmin"));
        assert_eq!(info.password.as_deref(), Some("AbCd-1234-EfGh"));
    }

    #[test]
    fn first_matching_rule_wins_per_field() {
        let rules = vec![
            FieldRule::new(Field::Username, r"primary=(\w+)", 1).unwrap(),
            FieldRule::new(Field::Username, r"fallback=(\w+)", 1).unwrap(),
        ];
        let ex = Extractor::new(rules);

        let both = ex.extract("fallback=b primary=a", &Strictness::Lenient).unwrap();
        assert_eq!(both.username.as_deref(), Some("a"));

        let only_fallback = ex.extract("fallback=b", &Strictness::Lenient).unwrap();
        assert_eq!(only_fallback.username.as_deref(), Some("b"));
    }

    #[test]
    fn leftmost_occurrence_is_used() {
        let ex = Extractor::installer().unwrap();
        let text = "Kubernetes API at https://first:6443\nKubernetes API at https://second:6443";
        let info = ex.extract(text, &Strictness::Lenient).unwrap();
        assert_eq!(info.api_server_url.as_deref(), Some("https://first:6443"));
    }

    #[test]
    fn strict_reports_first_missing_in_declared_order() {
        let ex = Extractor::installer().unwrap();
        let err = ex
            .extract(
                "nothing useful here",
                &Strictness::Strict(vec![Field::Password, Field::ApiServerUrl]),
            )
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Extraction(Field::Password)));
    }

    #[test]
    fn strict_with_no_required_fields_never_fails() {
        let ex = Extractor::installer().unwrap();
        let info = ex.extract("", &Strictness::Strict(vec![])).unwrap();
        assert_eq!(info, StructuredInstallationInfo::default());
    }
}
