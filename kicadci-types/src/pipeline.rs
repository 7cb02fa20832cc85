use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// One external program invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDescriptor {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandDescriptor {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Program followed by its arguments.
    pub fn argv(&self) -> Vec<String> {
        std::iter::once(self.program.clone())
            .chain(self.args.iter().cloned())
            .collect()
    }
}

/// Name under which the in-process `layerselection` rewrite shows up in traces.
pub const SUBSTITUTE_LAYER_SELECTION: &str = "substitute-layerselection";

/// A single pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Step {
    /// Run an external program to completion.
    Command(CommandDescriptor),
    /// Rewrite the `layerselection` field of a board file to `value`.
    SubstituteLayerSelection { file: Utf8PathBuf, value: String },
}

impl Step {
    /// Argument vector rendered in the trace line for this step.
    pub fn argv(&self) -> Vec<String> {
        match self {
            Step::Command(cmd) => cmd.argv(),
            Step::SubstituteLayerSelection { file, value } => vec![
                SUBSTITUTE_LAYER_SELECTION.to_string(),
                file.to_string(),
                value.clone(),
            ],
        }
    }

    /// Program (or pseudo-program) name used in logs and errors.
    pub fn program(&self) -> &str {
        match self {
            Step::Command(cmd) => &cmd.program,
            Step::SubstituteLayerSelection { .. } => SUBSTITUTE_LAYER_SELECTION,
        }
    }

    /// Space-joined argv, as printed after the `+ ` trace marker.
    pub fn display_line(&self) -> String {
        self.argv().join(" ")
    }
}

/// Ordered list of steps for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pipeline {
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Pipeline {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a Pipeline {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
