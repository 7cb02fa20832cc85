use crate::layers::{LayerSelectionRule, board_file};
use kicadci_types::{BuildRequest, CommandDescriptor, Pipeline, Project, Step};
use serde::Deserialize;
use tracing::debug;

/// Locations of the external exporters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Toolchain {
    /// Interpreter for the exporter scripts.
    pub python: String,
    pub schematic_script: String,
    pub bom_script: String,
    pub gerber_script: String,
    /// Footprint library table generator, run without arguments.
    pub fp_lib_table: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            python: "python2".to_string(),
            schematic_script: "/bin/ci-scripts/export_schematic.py".to_string(),
            bom_script: "/bin/ci-scripts/export_bom.py".to_string(),
            gerber_script: "/bin/ci-scripts/export_grb.py".to_string(),
            fp_lib_table: "gen_fp_lib_table.sh".to_string(),
        }
    }
}

impl Toolchain {
    fn script(&self, script: &str, project: &Project) -> CommandDescriptor {
        // Unbuffered so exporter output interleaves correctly with trace lines.
        CommandDescriptor::new(
            self.python.clone(),
            ["-u", script, project.name.as_str()],
        )
    }

    pub fn schematic(&self, project: &Project) -> CommandDescriptor {
        self.script(&self.schematic_script, project)
    }

    pub fn bom(&self, project: &Project) -> CommandDescriptor {
        self.script(&self.bom_script, project)
    }

    pub fn gerber(&self, project: &Project) -> CommandDescriptor {
        self.script(&self.gerber_script, project)
    }

    pub fn fp_lib_table(&self) -> CommandDescriptor {
        CommandDescriptor::new(self.fp_lib_table.clone(), Vec::<String>::new())
    }
}

/// Turns a [`BuildRequest`] into an ordered [`Pipeline`].
///
/// Order is fixed: schematic, BOM, then the three gerber steps
/// (footprint table, `layerselection` rewrite, gerber export).
#[derive(Debug, Clone, Default)]
pub struct Planner {
    toolchain: Toolchain,
}

impl Planner {
    pub fn new(toolchain: Toolchain) -> Self {
        Self { toolchain }
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn plan(&self, request: &BuildRequest) -> Pipeline {
        let project = &request.project;
        let artifacts = &request.artifacts;
        let mut steps = Vec::new();

        if artifacts.schematic {
            steps.push(Step::Command(self.toolchain.schematic(project)));
        }
        if artifacts.bom {
            steps.push(Step::Command(self.toolchain.bom(project)));
        }
        if let Some(layers) = artifacts.layers() {
            let rule = LayerSelectionRule::for_selection(layers);
            steps.push(Step::Command(self.toolchain.fp_lib_table()));
            steps.push(Step::SubstituteLayerSelection {
                file: board_file(project),
                value: rule.value,
            });
            steps.push(Step::Command(self.toolchain.gerber(project)));
        }

        debug!(
            project = project.name.as_str(),
            client = request.client.code.as_str(),
            steps = steps.len(),
            "planned pipeline"
        );
        Pipeline::new(steps)
    }
}
