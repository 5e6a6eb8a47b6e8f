//! donothing - step-by-step runbooks for your terminal.
//!
//! Runs procedures that mix manual checklists with automated steps.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use donothing::procedure::{discover_procedures, parse_procedure, ProcedureFile};
use donothing::{Config, InteractionSink, RunConfig, State, UnattendedSink};

/// Step-by-step runbooks that mix manual checklists with automation
#[derive(Parser)]
#[command(name = "donothing")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this config file instead of the default locations
    #[arg(long, global = true, env = "DONOTHING_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a procedure step by step
    Run {
        /// Procedure name or path to a procedure file
        target: String,

        /// Seed state before the first step (key=value)
        #[arg(short, long)]
        var: Vec<String>,

        /// Don't wait for confirmation at any prompt
        #[arg(short = 'y', long)]
        yes: bool,

        /// Print the final state as JSON once the procedure completes
        #[arg(long)]
        emit_state: bool,
    },

    /// Print a procedure's steps without running anything
    Show {
        /// Procedure name or path to a procedure file
        target: String,
    },

    /// List discovered procedures
    List {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Show configuration
    Config {
        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging; stdout is reserved for the procedure itself
    let filter = if cli.verbose { EnvFilter::new("debug") } else { EnvFilter::new("warn") };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(io::stderr))
        .with(filter)
        .init();

    let config = match cli.config {
        Some(ref path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };

    match cli.command {
        Commands::Run { target, var, yes, emit_state } => {
            cmd_run(&config, &target, &var, yes, emit_state)?;
        }
        Commands::Show { target } => {
            cmd_show(&config, &target)?;
        }
        Commands::List { format } => {
            cmd_list(&config, &format)?;
        }
        Commands::Config { path } => {
            cmd_config(&config, cli.config.as_deref(), path)?;
        }
        Commands::Completions { shell } => {
            cmd_completions(shell);
        }
    }

    Ok(())
}

/// Run a procedure.
fn cmd_run(
    config: &Config,
    target: &str,
    vars: &[String],
    yes: bool,
    emit_state: bool,
) -> Result<()> {
    let shell = config.general.shell.as_deref();
    let procedure = find_procedure(config, target)?.into_procedure(shell);
    let seed = parse_vars(vars)?;

    let sink: Box<dyn InteractionSink> =
        if yes { Box::new(UnattendedSink::stdout()) } else { Box::new(config.console_sink()) };
    let mut run_config: RunConfig = RunConfig { renderer: Box::new(config.renderer()), sink };

    let state = procedure
        .execute_with_state(&mut run_config, seed)
        .with_context(|| format!("Procedure '{}' did not complete", procedure.title))?;

    tracing::debug!(state = ?state, "Final state");

    if emit_state {
        println!("{}", serde_json::to_string_pretty(&state)?);
    }

    Ok(())
}

/// Print a procedure outline.
fn cmd_show(config: &Config, target: &str) -> Result<()> {
    let shell = config.general.shell.as_deref();
    let procedure = find_procedure(config, target)?.into_procedure(shell);
    print!("{}", config.renderer().outline(&procedure));
    Ok(())
}

/// List discovered procedures.
fn cmd_list(config: &Config, format: &str) -> Result<()> {
    let cwd = std::env::current_dir()?;
    let procedures = discover_procedures(&cwd, &config.general.expanded_procedure_dirs())?;

    match format {
        "json" => {
            let entries: Vec<_> = procedures
                .iter()
                .map(|(name, file)| {
                    serde_json::json!({
                        "name": name,
                        "title": file.title,
                        "description": file.description,
                        "steps": file.steps.len(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        "text" => {
            if procedures.is_empty() {
                println!("No procedures found.");
                return Ok(());
            }
            for (name, file) in &procedures {
                println!("{name:<20} {} ({} steps)", file.title, file.steps.len());
            }
        }
        other => anyhow::bail!("Unknown format '{}' (expected text or json)", other),
    }

    Ok(())
}

/// Show configuration.
fn cmd_config(config: &Config, explicit: Option<&Path>, path_only: bool) -> Result<()> {
    if path_only {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => Config::config_dir()
                .map(|d| d.join("config.toml"))
                .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?,
        };
        println!("{}", path.display());
        return Ok(());
    }

    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Generate shell completions.
fn cmd_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "donothing", &mut io::stdout());
}

/// Resolve a procedure by file path or by discovered name.
fn find_procedure(config: &Config, target: &str) -> Result<ProcedureFile> {
    let path = Path::new(target);
    if path.is_file() {
        return parse_procedure(path)
            .with_context(|| format!("Failed to parse procedure {}", path.display()));
    }

    let cwd = std::env::current_dir()?;
    discover_procedures(&cwd, &config.general.expanded_procedure_dirs())?
        .into_iter()
        .find(|(name, _)| name == target)
        .map(|(_, file)| file)
        .ok_or_else(|| anyhow::anyhow!("Procedure '{}' not found", target))
}

/// Parse `key=value` assignments into a seed state.
fn parse_vars(vars: &[String]) -> Result<State> {
    let mut state = State::new();
    for var in vars {
        let Some((key, value)) = var.split_once('=') else {
            anyhow::bail!("Invalid variable '{}' (expected key=value)", var);
        };
        if key.is_empty() {
            anyhow::bail!("Invalid variable '{}' (empty key)", var);
        }
        state.insert(key, value);
    }
    Ok(state)
}
