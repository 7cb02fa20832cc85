//! Port traits abstracting step execution away from the pipeline.

use crate::settings::ExecSettings;
use kicadci_edit::EditError;
use kicadci_types::Step;
use thiserror::Error;

/// Why a single step did not complete successfully.
#[derive(Debug, Error)]
pub enum StepFailure {
    /// The program could not be started.
    #[error("could not start: {0}")]
    Spawn(#[source] std::io::Error),

    /// The program ran and exited unsuccessfully.
    #[error("{}", exit_message(.code))]
    Exited { code: Option<i32> },

    /// The in-process board-file rewrite failed.
    #[error(transparent)]
    Edit(#[from] EditError),
}

fn exit_message(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Runs one step to completion.
pub trait StepRunner {
    fn run_step(&self, step: &Step, settings: &ExecSettings) -> Result<(), StepFailure>;
}
