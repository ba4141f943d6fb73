//! Literal installer output excerpts.
//!
//! These pin the extraction rules to the wording `openshift-install` prints;
//! change them only together with evidence of new installer wording.

/// Tail of a successful `create cluster` run in the installer's plain format.
pub const INSTALL_LOG: &str = "\
INFO Credentials loaded from the \"default\" profile in file \"/home/me/.aws/credentials\"
INFO Consuming Install Config from target directory
INFO Creating infrastructure resources...
INFO Waiting up to 20m0s (until 11:52AM) for the Kubernetes API at https://api.hub.ocp.example.com:6443...
INFO API v1.27.6+f67aeb3 up
INFO Waiting up to 30m0s (until 12:05PM) for bootstrapping to complete...
INFO Destroying the bootstrap resources...
INFO Waiting up to 40m0s (until 12:29PM) for the cluster at https://api.hub.ocp.example.com:6443 to initialize...
INFO Checking to see if there is a route at openshift-console/console...
INFO Install complete!
INFO To access the cluster as the system:admin user when using 'oc', run 'export KUBECONFIG=/home/me/clusters/hub/auth/kubeconfig'
INFO Access the OpenShift web-console here: https://console-openshift-console.apps.hub.ocp.example.com
INFO Login to the console with user: \"kubeadmin\", and password: \"xyz123-AbCd-EfGh-IjKl\"
INFO Time elapsed: 38m12s
";

/// The same run logged in logfmt, where quotes inside `msg` are escaped.
pub const INSTALL_LOG_LOGFMT: &str = r#"time="2024-03-01T11:32:10Z" level=info msg="Waiting up to 20m0s (until 11:52AM) for the Kubernetes API at https://api.hub.ocp.example.com:6443..."
time="2024-03-01T12:10:44Z" level=info msg="Install complete!"
time="2024-03-01T12:10:44Z" level=info msg="To access the cluster as the system:admin user when using 'oc', run 'export KUBECONFIG=/home/me/clusters/hub/auth/kubeconfig'"
time="2024-03-01T12:10:44Z" level=info msg="Access the OpenShift web-console here: https://console-openshift-console.apps.hub.ocp.example.com"
time="2024-03-01T12:10:44Z" level=info msg="Login to the console with user: \"kubeadmin\", and password: \"xyz123-AbCd-EfGh-IjKl\""
"#;

/// A run that reached the API but never printed the console line.
pub const INSTALL_LOG_NO_CONSOLE: &str = "\
INFO Waiting up to 20m0s for the Kubernetes API at https://api.edge.ocp.example.com:6443...
INFO Install complete!
INFO To access the cluster as the system:admin user when using 'oc', run 'export KUBECONFIG=/home/me/clusters/edge/auth/kubeconfig'
INFO Login to the console with user: \"kubeadmin\", and password: \"edge-pass\"
";

/// Typical stderr of a failed run.
pub const INSTALL_FAILURE_STDERR: &str = "\
level=error msg=Error: creating EC2 VPC: VpcLimitExceeded: The maximum number of VPCs has been reached.
level=error msg=failed to fetch Cluster: failed to generate asset \"Cluster\": failure applying terraform for \"cluster\" stage
level=fatal msg=Bootstrap failed to complete
";

/// Installer log for `cluster`, in the plain format.
pub fn install_log_for(cluster: &str) -> String {
    INSTALL_LOG.replace(".hub.", &format!(".{cluster}.")).replace("/hub/", &format!("/{cluster}/"))
}
