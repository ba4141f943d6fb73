// src/extract/rules.rs

//! Field extraction rules and the built-in rule set for installer logs.
//!
//! The installer offers no machine-readable summary, so these patterns are
//! pinned to the human-readable lines it prints at the end of a successful
//! `create cluster`, for example:
//!
//! ```text
//! INFO Install complete!
//! INFO To access the cluster as the system:admin user when using 'oc', run 'export KUBECONFIG=/home/me/clusters/hub/auth/kubeconfig'
//! INFO Access the OpenShift web-console here: https://console-openshift-console.apps.hub.ocp.example.com
//! INFO Login to the console with user: "kubeadmin", and password: "xyz123"
//! ```
//!
//! and, earlier, `Waiting up to 20m0s for the Kubernetes API at https://api.hub.ocp.example.com:6443...`.

use regex::{Regex, RegexBuilder};

use crate::errors::Result;
use crate::extract::field::Field;

/// Literal truncation markers the installer appends to long values.
const TRUNCATION_MARKERS: [&str; 2] = ["...", "\u{2026}"];

/// URL body: stops at whitespace, quotes and backslashes (escaped quotes in
/// logfmt output).
const URL: &str = r#"https?://[^\s"'\\]+"#;

/// Optional transformation applied to a captured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostProcess {
    #[default]
    None,
    /// Remove one trailing truncation marker (`...` or `…`).
    StripTruncationMarker,
}

impl PostProcess {
    pub fn apply(self, value: &str) -> String {
        match self {
            PostProcess::None => value.to_string(),
            PostProcess::StripTruncationMarker => TRUNCATION_MARKERS
                .iter()
                .find_map(|m| value.strip_suffix(m))
                .unwrap_or(value)
                .to_string(),
        }
    }
}

/// One extraction rule: the first (leftmost) case-insensitive match of
/// `pattern` yields capture group `group` as the value of `field`.
#[derive(Debug, Clone)]
pub struct FieldRule {
    field: Field,
    pattern: Regex,
    group: usize,
    post: PostProcess,
}

impl FieldRule {
    /// Compile a case-insensitive rule.
    pub fn new(field: Field, pattern: &str, group: usize) -> Result<Self> {
        let pattern = RegexBuilder::new(pattern).case_insensitive(true).build()?;
        Ok(Self {
            field,
            pattern,
            group,
            post: PostProcess::None,
        })
    }

    pub fn with_post(mut self, post: PostProcess) -> Self {
        self.post = post;
        self
    }

    pub fn field(&self) -> Field {
        self.field
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    /// Value for this rule in `text`, or `None` if the phrase does not occur
    /// (or the group did not participate in the match).
    pub fn find(&self, text: &str) -> Option<String> {
        let caps = self.pattern.captures(text)?;
        let raw = caps.get(self.group)?.as_str();
        let value = self.post.apply(raw);
        (!value.is_empty()).then_some(value)
    }
}

/// Rules for `openshift-install create cluster` output, in evaluation order.
///
/// A field may have several rules; the first one that matches wins.
pub fn installer_rules() -> Result<Vec<FieldRule>> {
    let credentials = r#"user:\s*\\?"([^"\\]+)\\?",?\s*and\s+password:\s*\\?"([^"\\]+)\\?""#;

    Ok(vec![
        FieldRule::new(Field::ApiServerUrl, &format!(r"Kubernetes API at\s+({URL})"), 1)?
            .with_post(PostProcess::StripTruncationMarker),
        FieldRule::new(
            Field::WebConsoleUrl,
            &format!(r"web[- ]console here:\s*({URL})"),
            1,
        )?
        .with_post(PostProcess::StripTruncationMarker),
        FieldRule::new(
            Field::KubeconfigExportCommand,
            r"run\s+'((?:export\s+)?[a-z_][a-z0-9_]*=[^'\s]+)'",
            1,
        )?,
        FieldRule::new(
            Field::KubeconfigExportCommand,
            r#"(export\s+KUBECONFIG=[^\s'"\\]+)"#,
            1,
        )?,
        FieldRule::new(Field::Username, credentials, 1)?,
        FieldRule::new(Field::Password, credentials, 2)?,
    ])
}
