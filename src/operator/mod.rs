/// Benchmark Operator lifecycle
///
/// Deploys and removes the benchmark-operator by driving `make deploy` and
/// `make undeploy` inside the operator checkout. The caller's kubeconfig
/// arrives as a string and is materialized to a temp file for the duration
/// of the command, handed over through the KUBECONFIG variable.
use std::path::Path;

use anyhow::Result;
use tracing::info;

use crate::config::PluginConfig;
use crate::steps::{InputParams, into_step_output, StepOutput};
use crate::utils::command::{self, Invocation};
use crate::utils::files;

pub struct OperatorManager {
    config: PluginConfig,
}

impl OperatorManager {
    pub fn new(config: PluginConfig) -> Self {
        Self { config }
    }

    /// Check if make is installed
    pub async fn check_make_installed(make_bin: &str) -> Result<()> {
        command::check_tool_installed(
            make_bin,
            &["--version"],
            "https://www.gnu.org/software/make/",
        )
        .await
    }

    /// Deploy the benchmark-operator to the cluster.
    pub async fn start(&self, params: &InputParams) -> Result<StepOutput> {
        info!("Importing kubeconfig...");
        let kubeconfig = files::materialize("kubeconfig", &params.kubeconfig)?;

        info!("Starting benchmark-operator...");
        let outcome = self.make("deploy", kubeconfig.path()).run().await;
        let output = into_step_output(outcome, "Benchmark Operator successfully deployed!");

        if output.is_success() {
            info!("Benchmark-operator deployment complete");
        }
        Ok(output)
    }

    /// Remove the benchmark-operator from the cluster.
    pub async fn stop(&self, params: &InputParams) -> Result<StepOutput> {
        info!("Importing kubeconfig...");
        let kubeconfig = files::materialize("kubeconfig", &params.kubeconfig)?;

        info!("Stopping benchmark-operator...");
        let outcome = self.make("undeploy", kubeconfig.path()).run().await;
        let output = into_step_output(outcome, "Benchmark Operator successfully removed!");

        if output.is_success() {
            info!("Benchmark-operator removed");
        }
        Ok(output)
    }

    fn make(&self, target: &str, kubeconfig_path: &Path) -> Invocation {
        Invocation::new(&self.config.make_bin)
            .arg(target)
            .current_dir(&self.config.operator_dir)
            .kubeconfig(kubeconfig_path)
            .env_policy(self.config.environment)
    }
}
