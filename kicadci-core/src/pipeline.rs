//! Fail-fast pipeline execution.
//!
//! Steps run strictly in order. Each step is traced (`+ <argv>`) before it
//! starts; the first failure stops the run and nothing is rolled back.

use crate::ports::{StepFailure, StepRunner};
use crate::settings::ExecSettings;
use anyhow::Context;
use kicadci_domain::Planner;
use kicadci_types::{BuildRequest, ConfigurationError, Pipeline, Step};
use std::io::Write;
use tracing::{debug, info};

/// Marker prefixed to every trace line.
pub const TRACE_PREFIX: &str = "+ ";

/// Error type for pipeline results. Every variant maps to exit code 1.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error(transparent)]
    ArtifactGeneration(#[from] ArtifactGenerationError),
    #[error("{0:#}")]
    Internal(#[from] anyhow::Error),
}

impl ToolError {
    pub fn exit_code(&self) -> u8 {
        match self {
            ToolError::Configuration(_)
            | ToolError::ArtifactGeneration(_)
            | ToolError::Internal(_) => 1,
        }
    }
}

/// A pipeline step could not be started or did not succeed.
#[derive(Debug, thiserror::Error)]
#[error("step {step} `{program}` failed: {cause}")]
pub struct ArtifactGenerationError {
    /// 1-based index of the failed step.
    pub step: usize,
    pub program: String,
    pub cause: StepFailure,
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// Steps traced (and, unless dry-run, executed).
    pub steps: usize,
    pub dry_run: bool,
}

fn trace_step(trace: &mut dyn Write, step: &Step) -> anyhow::Result<()> {
    writeln!(trace, "{}{}", TRACE_PREFIX, step.display_line()).context("write trace line")?;
    // Children write to the same stream; the line must land first.
    trace.flush().context("flush trace")
}

/// Run `pipeline` under `settings`, stopping at the first failing step.
pub fn run_pipeline(
    pipeline: &Pipeline,
    settings: &ExecSettings,
    runner: &dyn StepRunner,
    trace: &mut dyn Write,
) -> Result<RunOutcome, ToolError> {
    info!(
        steps = pipeline.len(),
        project_dir = settings.project_dir.as_str(),
        dry_run = settings.dry_run,
        "starting pipeline"
    );
    for (key, value) in settings.env.iter() {
        debug!(key, value, "child environment");
    }

    for (idx, step) in pipeline.iter().enumerate() {
        debug!(step = idx + 1, program = step.program(), "running step");
        trace_step(trace, step)?;
        if settings.dry_run {
            continue;
        }

        if let Err(cause) = runner.run_step(step, settings) {
            debug!(step = idx + 1, %cause, "pipeline aborted");
            return Err(ArtifactGenerationError {
                step: idx + 1,
                program: step.program().to_string(),
                cause,
            }
            .into());
        }
    }

    debug!(steps = pipeline.len(), "pipeline finished");
    Ok(RunOutcome {
        steps: pipeline.len(),
        dry_run: settings.dry_run,
    })
}

/// Plan `request` with `planner` and run the result.
pub fn run_request(
    request: &BuildRequest,
    planner: &Planner,
    settings: &ExecSettings,
    runner: &dyn StepRunner,
    trace: &mut dyn Write,
) -> Result<RunOutcome, ToolError> {
    let pipeline = planner.plan(request);
    run_pipeline(&pipeline, settings, runner, trace)
}
