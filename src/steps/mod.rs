/// Step schemas and registry
///
/// A step is one externally callable unit of the plugin. Each one declares
/// its input schema, and every result is the same two-variant shape: a
/// success message or an error explanation, tagged by `output_id`.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::benchmark::BenchmarkRunner;
use crate::config::PluginConfig;
use crate::operator::OperatorManager;
use crate::utils::command::RunOutcome;

/// Input parameters for the start and stop steps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputParams {
    /// Kubeconfig granting access to the target cluster, passed as content
    pub kubeconfig: String,
}

/// Input parameters for the cr step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CrParams {
    /// Benchmark custom resource manifest, passed as content
    pub customresource: String,

    /// Kubeconfig granting access to the target cluster, passed as content
    pub kubeconfig: String,
}

/// Result of one step.
///
/// Serializes as `{"output_id": "success", "output": {"message": ...}}` or
/// `{"output_id": "error", "output": {"error": ...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "output_id", content = "output", rename_all = "lowercase")]
pub enum StepOutput {
    /// The step completed; `message` says what was done.
    Success { message: String },
    /// The step failed; `error` explains why.
    Error { error: String },
}

impl StepOutput {
    pub fn success(message: impl Into<String>) -> Self {
        StepOutput::Success {
            message: message.into(),
        }
    }

    pub fn error(error: impl Into<String>) -> Self {
        StepOutput::Error {
            error: error.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StepOutput::Success { .. })
    }
}

/// Metadata for one registered step.
#[derive(Debug, Clone, Copy)]
pub struct StepDefinition {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// The steps this plugin exposes.
pub const STEPS: &[StepDefinition] = &[
    StepDefinition {
        id: "start",
        name: "Start Benchmark Operator",
        description: "Deploys the Benchmark Operator",
    },
    StepDefinition {
        id: "stop",
        name: "Stop Benchmark Operator",
        description: "Undeploys the Benchmark Operator",
    },
    StepDefinition {
        id: "cr",
        name: "Deploy a CR File",
        description: "Passes a CR file to the benchmark-operator to start a benchmark",
    },
];

/// Run the step with the given id, validating `params` against the step's
/// input schema first.
///
/// Unknown ids and schema violations are caller errors and come back as
/// `Err`; anything the external command does wrong comes back inside
/// [`StepOutput::Error`].
pub async fn dispatch(
    config: &PluginConfig,
    id: &str,
    params: serde_json::Value,
) -> Result<StepOutput> {
    match id {
        "start" => {
            let params: InputParams = parse_params(id, params)?;
            OperatorManager::new(config.clone()).start(&params).await
        }
        "stop" => {
            let params: InputParams = parse_params(id, params)?;
            OperatorManager::new(config.clone()).stop(&params).await
        }
        "cr" => {
            let params: CrParams = parse_params(id, params)?;
            BenchmarkRunner::new(config.clone()).deploy_cr(&params).await
        }
        _ => anyhow::bail!(
            "unknown step {:?}; registered steps: {}",
            id,
            STEPS
                .iter()
                .map(|step| step.id)
                .collect::<Vec<_>>()
                .join(", ")
        ),
    }
}

fn parse_params<T: serde::de::DeserializeOwned>(id: &str, params: serde_json::Value) -> Result<T> {
    serde_json::from_value(params).with_context(|| format!("invalid input for step {:?}", id))
}

/// Fold a runner outcome into the step's two-variant result.
///
/// Command failures and spawn errors both land in [`StepOutput::Error`], so
/// nothing from the command-execution path escapes as a fault. Captured
/// output from a successful run is logged for visibility.
pub(crate) fn into_step_output(outcome: Result<RunOutcome>, success_message: &str) -> StepOutput {
    match outcome {
        Ok(RunOutcome::Success { output }) => {
            if !output.trim().is_empty() {
                info!("{}", output.trim());
            }
            StepOutput::success(success_message)
        }
        Ok(RunOutcome::Failure(failure)) => StepOutput::error(failure.to_string()),
        Err(error) => StepOutput::error(format!("{:#}", error)),
    }
}

impl InputParams {
    /// Example parameters for the start and stop steps.
    pub fn example() -> Self {
        Self {
            kubeconfig: EXAMPLE_KUBECONFIG.to_string(),
        }
    }
}

impl CrParams {
    /// Example parameters for the cr step.
    pub fn example() -> Self {
        Self {
            customresource: EXAMPLE_CR.to_string(),
            kubeconfig: EXAMPLE_KUBECONFIG.to_string(),
        }
    }
}

const EXAMPLE_KUBECONFIG: &str = "\
apiVersion: v1
kind: Config
current-context: target
clusters:
  - name: target
    cluster:
      server: https://kubernetes.example.com:6443
contexts:
  - name: target
    context:
      cluster: target
      user: admin
users:
  - name: admin
    user:
      token: replace-me
";

const EXAMPLE_CR: &str = "\
apiVersion: ripsaw.cloudbulldozer.io/v1alpha1
kind: Benchmark
metadata:
  name: uperf-benchmark
  namespace: benchmark-operator
spec:
  workload:
    name: uperf
    args:
      pair: 1
      protos:
        - tcp
      test_types:
        - stream
";
