mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::builder::FalseyValueParser;
use clap::{Args, Parser, Subcommand};
use config::ConfigMerger;
use kicadci_core::adapters::SystemStepRunner;
use kicadci_core::pipeline::{ToolError, run_pipeline};
use kicadci_core::settings::ExecSettings;
use kicadci_core::{BuildRequest, Pipeline, Planner};
use kicadci_types::{Client, Project};
use std::io::Write;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "kicadci",
    version,
    about = "Export schematics, BOMs and gerbers from a KiCad project in CI."
)]
struct Cli {
    #[command(subcommand)]
    cmd: Option<Command>,

    #[command(flatten)]
    inputs: InputArgs,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the pipeline (default when no subcommand is given).
    Run,
    /// Print the planned pipeline without running it.
    Plan(PlanArgs),
}

/// Plugin inputs. Every flag can also come from its `PLUGIN_*` variable.
#[derive(Debug, Args)]
struct InputArgs {
    /// Enterprise client code.
    #[arg(long = "client.code", env = "PLUGIN_CLIENT_CODE", default_value = "", global = true)]
    client_code: String,

    /// Client name.
    #[arg(long = "client.name", env = "PLUGIN_CLIENT_NAME", default_value = "", global = true)]
    client_name: String,

    /// Enterprise project code.
    #[arg(long = "project.code", env = "PLUGIN_PROJECT_CODE", default_value = "", global = true)]
    project_code: String,

    /// Project name; the board file is `<name>.kicad_pcb`.
    #[arg(long = "project.name", env = "PLUGIN_PROJECT_NAME", default_value = "", global = true)]
    project_name: String,

    /// Generate the schematic.
    #[arg(
        long = "options.schematic",
        env = "PLUGIN_SCHEMATIC",
        value_parser = FalseyValueParser::new(),
        global = true
    )]
    schematic: bool,

    /// Generate the bill of materials.
    #[arg(
        long = "options.bom",
        env = "PLUGIN_BOM",
        value_parser = FalseyValueParser::new(),
        global = true
    )]
    bom: bool,

    /// Generate gerber files for the given layers, e.g. '{"fcu":true,"fs":true}'.
    #[arg(long = "options.gerber", env = "PLUGIN_GERBER", global = true)]
    gerber: Option<String>,

    /// Directory holding the KiCad project (default: current directory).
    #[arg(long, default_value = ".", global = true)]
    project_dir: Utf8PathBuf,

    /// Config file (default: <project_dir>/kicadci.toml when present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Extra child environment as KEY=VALUE (repeatable).
    #[arg(long = "env", global = true)]
    env: Vec<String>,

    /// Trace every step without running any.
    #[arg(long, default_value_t = false, global = true)]
    dry_run: bool,
}

#[derive(Debug, Args)]
struct PlanArgs {
    /// Output format (text, json).
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        error!("{}", e);
        return ExitCode::from(e.exit_code());
    }
    ExitCode::SUCCESS
}

fn real_main() -> Result<(), ToolError> {
    // stdout carries trace lines and exporter output; logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd.unwrap_or(Command::Run) {
        Command::Run => cmd_run(&cli.inputs),
        Command::Plan(args) => cmd_plan(&cli.inputs, &args),
    }
}

/// Resolved inputs shared by every subcommand.
struct Prepared {
    request: BuildRequest,
    pipeline: Pipeline,
    settings: ExecSettings,
}

fn prepare(inputs: &InputArgs) -> Result<Prepared, ToolError> {
    let request = BuildRequest::from_inputs(
        Client {
            code: inputs.client_code.clone(),
            name: inputs.client_name.clone(),
        },
        Project {
            code: inputs.project_code.clone(),
            name: inputs.project_name.clone(),
        },
        inputs.schematic,
        inputs.bom,
        inputs.gerber.as_deref(),
    )?;

    let file_config = config::load_or_default(inputs.config.as_deref(), &inputs.project_dir)
        .context("load kicadci.toml config")?;
    let cli_env = config::parse_cli_env(&inputs.env)?;
    let merged = ConfigMerger::new(file_config).merge(&cli_env);

    debug!(
        "merged config: toolchain={:?}, env={:?}",
        merged.toolchain, merged.env
    );

    let pipeline = Planner::new(merged.toolchain).plan(&request);
    let settings = ExecSettings {
        project_dir: inputs.project_dir.clone(),
        env: merged.env,
        dry_run: inputs.dry_run,
    };

    Ok(Prepared {
        request,
        pipeline,
        settings,
    })
}

fn cmd_run(inputs: &InputArgs) -> Result<(), ToolError> {
    let Prepared {
        request,
        pipeline,
        settings,
    } = prepare(inputs)?;

    info!(
        client = request.client.code.as_str(),
        project = request.project.name.as_str(),
        schematic = request.artifacts.schematic,
        bom = request.artifacts.bom,
        gerber = request.artifacts.gerber_requested(),
        "building artifacts"
    );

    let stdout = std::io::stdout();
    let mut trace = stdout.lock();
    let outcome = run_pipeline(&pipeline, &settings, &SystemStepRunner, &mut trace)?;

    info!(steps = outcome.steps, dry_run = outcome.dry_run, "pipeline succeeded");
    Ok(())
}

fn cmd_plan(inputs: &InputArgs, args: &PlanArgs) -> Result<(), ToolError> {
    let Prepared {
        pipeline, settings, ..
    } = prepare(inputs)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match args.format {
        OutputFormat::Text => write_plan_text(&mut out, &pipeline, &settings.project_dir)?,
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&pipeline).context("serialize pipeline")?;
            writeln!(out, "{}", json).context("write plan")?;
        }
    }
    Ok(())
}

fn write_plan_text(
    out: &mut dyn Write,
    pipeline: &Pipeline,
    project_dir: &Utf8Path,
) -> anyhow::Result<()> {
    if pipeline.is_empty() {
        writeln!(out, "No steps planned.")?;
        return Ok(());
    }
    writeln!(out, "Pipeline ({} steps, in {}):", pipeline.len(), project_dir)?;
    for (i, step) in pipeline.iter().enumerate() {
        writeln!(out, "  {}. {}", i + 1, step.display_line())?;
    }
    Ok(())
}
