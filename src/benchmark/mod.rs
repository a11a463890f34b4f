/// Benchmark runs
///
/// Applies a Benchmark custom resource with kubectl so the already-deployed
/// benchmark-operator picks it up and starts the run. The kubeconfig and the
/// CR manifest arrive as strings and live in temp files only while kubectl
/// runs.
use anyhow::Result;
use tracing::info;

use crate::config::PluginConfig;
use crate::steps::{CrParams, into_step_output, StepOutput};
use crate::utils::command::{self, Invocation};
use crate::utils::files;

pub struct BenchmarkRunner {
    config: PluginConfig,
}

impl BenchmarkRunner {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    /// Check if kubectl is installed
    pub async fn check_kubectl_installed(kubectl_bin: &str) -> Result<()> {
        command::check_tool_installed(
            kubectl_bin,
            &["version", "--client"],
            "https://kubernetes.io/docs/tasks/tools/",
        )
        .await
    }

    /// Apply the benchmark CR and hand the run over to the operator.
    pub async fn deploy_cr(&self, params: &CrParams) -> Result<StepOutput> {
        info!("Importing kubeconfig...");
        let kubeconfig = files::materialize("kubeconfig", &params.kubeconfig)?;

        info!("Importing CR...");
        let cr_file = files::materialize("custom resource", &params.customresource)?;

        info!("Starting benchmark...");
        let outcome = Invocation::new(&self.config.kubectl_bin)
            .args(["apply", "-f"])
            .arg(cr_file.path())
            .current_dir("/")
            .kubeconfig(kubeconfig.path())
            .env_policy(self.config.environment)
            .run()
            .await;
        let output = into_step_output(outcome, "Benchmark successfully run!");

        if output.is_success() {
            info!("Benchmark CR applied");
        }
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::command::EnvPolicy;
    use crate::utils::testing;
    use std::fs;
    use std::path::Path;

    fn capture_body(cap: &Path) -> String {
        format!(
            "pwd > \"{cap}/cwd\"\n\
             printf '%s\\n' \"$@\" > \"{cap}/args\"\n\
             cat \"$KUBECONFIG\" > \"{cap}/kubeconfig\"\n\
             cat \"$3\" > \"{cap}/cr\"\n\
             printf '%s' \"$KUBECONFIG\" > \"{cap}/kubeconfig_path\"\n\
             printf '%s' \"$3\" > \"{cap}/cr_path\"\n\
             exit 0\n",
            cap = cap.display()
        )
    }

    fn test_config(kubectl_bin: &Path) -> PluginConfig {
        PluginConfig {
            environment: EnvPolicy::Merge,
            kubectl_bin: kubectl_bin.display().to_string(),
            ..PluginConfig::default()
        }
    }

    fn test_params() -> CrParams {
        CrParams {
            customresource: "apiVersion: ripsaw.cloudbulldozer.io/v1alpha1\nkind: Benchmark\n"
                .to_string(),
            kubeconfig: "apiVersion: v1\nkind: Config\n".to_string(),
        }
    }

    #[tokio::test]
    async fn deploy_cr_applies_the_manifest_with_kubectl() {
        let temp = tempfile::tempdir().unwrap();
        let cap = temp.path().join("cap");
        fs::create_dir(&cap).unwrap();
        let kubectl_bin = testing::write_stub_tool(temp.path(), "kubectl", &capture_body(&cap));
        let config = test_config(&kubectl_bin);

        let params = test_params();
        let output = BenchmarkRunner::new(config)
            .deploy_cr(&params)
            .await
            .unwrap();

        assert_eq!(output, StepOutput::success("Benchmark successfully run!"));

        let args = fs::read_to_string(cap.join("args")).unwrap();
        let args: Vec<&str> = args.lines().collect();
        assert_eq!(args[0], "apply");
        assert_eq!(args[1], "-f");
        assert_eq!(args[2], fs::read_to_string(cap.join("cr_path")).unwrap());

        assert_eq!(fs::read_to_string(cap.join("cwd")).unwrap().trim(), "/");
        assert_eq!(
            fs::read_to_string(cap.join("kubeconfig")).unwrap(),
            params.kubeconfig
        );
        assert_eq!(
            fs::read_to_string(cap.join("cr")).unwrap(),
            params.customresource
        );
    }

    #[tokio::test]
    async fn kubeconfig_and_cr_use_distinct_temp_files() {
        let temp = tempfile::tempdir().unwrap();
        let cap = temp.path().join("cap");
        fs::create_dir(&cap).unwrap();
        let kubectl_bin = testing::write_stub_tool(temp.path(), "kubectl", &capture_body(&cap));
        let config = test_config(&kubectl_bin);

        BenchmarkRunner::new(config)
            .deploy_cr(&test_params())
            .await
            .unwrap();

        let kubeconfig_path = fs::read_to_string(cap.join("kubeconfig_path")).unwrap();
        let cr_path = fs::read_to_string(cap.join("cr_path")).unwrap();
        assert_ne!(kubeconfig_path, cr_path);
    }

    #[tokio::test]
    async fn kubectl_failure_becomes_the_error_output() {
        let temp = tempfile::tempdir().unwrap();
        let kubectl_bin = testing::write_stub_tool(
            temp.path(),
            "kubectl",
            "echo 'error: unable to recognize' >&2\nexit 1\n",
        );
        let config = test_config(&kubectl_bin);

        let output = BenchmarkRunner::new(config)
            .deploy_cr(&test_params())
            .await
            .unwrap();

        assert_eq!(
            output,
            StepOutput::error(format!(
                "{} failed with return code 1:\nerror: unable to recognize\n",
                kubectl_bin.display()
            ))
        );
    }

    #[tokio::test]
    async fn kubectl_probe_reports_a_missing_tool() {
        let err = BenchmarkRunner::check_kubectl_installed("/nonexistent/kubectl")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not installed"));
    }

    #[tokio::test]
    async fn temp_files_are_removed_after_the_step() {
        let temp = tempfile::tempdir().unwrap();
        let cap = temp.path().join("cap");
        fs::create_dir(&cap).unwrap();
        let kubectl_bin = testing::write_stub_tool(temp.path(), "kubectl", &capture_body(&cap));
        let config = test_config(&kubectl_bin);

        BenchmarkRunner::new(config)
            .deploy_cr(&test_params())
            .await
            .unwrap();

        let kubeconfig_path = fs::read_to_string(cap.join("kubeconfig_path")).unwrap();
        let cr_path = fs::read_to_string(cap.join("cr_path")).unwrap();
        assert!(!Path::new(&kubeconfig_path).exists());
        assert!(!Path::new(&cr_path).exists());
    }
}
