//! Default process-backed port implementation.

use crate::ports::{StepFailure, StepRunner};
use crate::settings::ExecSettings;
use kicadci_domain::LayerSelectionRule;
use kicadci_domain::layers::LAYER_SELECTION_FIELD;
use kicadci_types::{CommandDescriptor, Step};
use std::process::{Command, Stdio};
use tracing::debug;

/// Spawns commands with inherited stdout/stderr and rewrites board files
/// in-process.
#[derive(Debug, Clone, Default)]
pub struct SystemStepRunner;

impl SystemStepRunner {
    fn run_command(cmd: &CommandDescriptor, settings: &ExecSettings) -> Result<(), StepFailure> {
        let status = Command::new(&cmd.program)
            .args(&cmd.args)
            .envs(settings.env.iter())
            .current_dir(&settings.project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(StepFailure::Spawn)?;

        debug!(program = cmd.program.as_str(), ?status, "step finished");
        if status.success() {
            Ok(())
        } else {
            Err(StepFailure::Exited {
                code: status.code(),
            })
        }
    }
}

impl StepRunner for SystemStepRunner {
    fn run_step(&self, step: &Step, settings: &ExecSettings) -> Result<(), StepFailure> {
        match step {
            Step::Command(cmd) => Self::run_command(cmd, settings),
            Step::SubstituteLayerSelection { file, value } => {
                let rule = LayerSelectionRule {
                    field: LAYER_SELECTION_FIELD,
                    value: value.clone(),
                };
                let path = settings.project_dir.join(file);
                kicadci_edit::apply_rule_to_file(&path, &rule)?;
                Ok(())
            }
        }
    }
}
