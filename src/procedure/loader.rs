//! Procedure files.
//!
//! Parses YAML procedure definitions and discovers them on disk.
//!
//! ```yaml
//! title: Rotate credentials
//! description: Rotate the staging database password
//! steps:
//!   - title: Announce
//!     instructions: Post in the channel.
//!   - title: Generate password
//!     run:
//!       command: openssl rand -hex 16
//!       output: password
//!   - title: Store it
//!     instructions: Save ${password} in the vault.
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::command::ShellCommand;
use super::schema::Procedure;
use super::template::placeholders;

/// A procedure as written in a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcedureFile {
    /// Title of the procedure
    pub title: String,

    /// Description shown under the title
    #[serde(default)]
    pub description: String,

    /// Steps in execution order
    #[serde(default)]
    pub steps: Vec<StepFile>,
}

/// A step as written in a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFile {
    /// Title of the step
    pub title: String,

    /// Instructions for a manual step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,

    /// Command for an automated step
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run: Option<RunFile>,
}

/// The `run` block of an automated step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFile {
    /// Shell command to execute
    pub command: String,

    /// State keys passed as `$1..$n`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<String>,

    /// State key to store stdout under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<String>,

    /// Working directory for the command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
}

impl ProcedureFile {
    /// Build an executable procedure.
    ///
    /// `shell` overrides the shell used for `run` commands.
    pub fn into_procedure(self, shell: Option<&str>) -> Procedure {
        let procedure = Procedure::new(self.title, self.description);

        self.steps.into_iter().fold(procedure, |procedure, step| match step.run {
            Some(run) => {
                let mut command = ShellCommand::new(run.command);
                if let Some(shell) = shell {
                    command = command.with_shell(shell);
                }
                if let Some(dir) = run.working_dir {
                    command = command.with_working_dir(dir);
                }

                let mut automation = command.into_automation().with_inputs(run.inputs);
                if let Some(output) = run.output {
                    automation = automation.with_output(output);
                }
                procedure.add_automated_step(step.title, automation)
            }
            None => procedure.add_step(step.title, step.instructions, None),
        })
    }
}

/// Parse a procedure from a file.
pub fn parse_procedure(path: &Path) -> anyhow::Result<ProcedureFile> {
    let content = std::fs::read_to_string(path)?;
    parse_procedure_str(&content)
}

/// Parse a procedure from a string.
pub fn parse_procedure_str(content: &str) -> anyhow::Result<ProcedureFile> {
    let procedure: ProcedureFile = serde_yaml::from_str(content)?;
    validate_procedure(&procedure)?;
    Ok(procedure)
}

/// Validate a procedure for common errors.
///
/// References to keys no earlier step produces are only warned about, since
/// state may be seeded when the procedure is run.
fn validate_procedure(procedure: &ProcedureFile) -> anyhow::Result<()> {
    if procedure.title.trim().is_empty() {
        anyhow::bail!("Procedure title cannot be empty");
    }

    let mut produced: HashSet<&str> = HashSet::new();

    for (i, step) in procedure.steps.iter().enumerate() {
        if step.title.trim().is_empty() {
            anyhow::bail!("Step {} has no title", i + 1);
        }

        match (&step.instructions, &step.run) {
            (Some(_), Some(_)) => {
                anyhow::bail!("Step '{}' has both instructions and a run command", step.title);
            }
            (Some(instructions), None) => {
                let names = placeholders(instructions)
                    .map_err(|e| anyhow::anyhow!("Step '{}': {}", step.title, e))?;
                for name in names {
                    if !produced.contains(name) {
                        tracing::warn!(
                            step = step.title,
                            key = name,
                            "Instructions reference a key no earlier step produces"
                        );
                    }
                }
            }
            (None, Some(run)) => {
                if run.command.trim().is_empty() {
                    anyhow::bail!("Step '{}' has an empty run command", step.title);
                }
                for input in &run.inputs {
                    if !produced.contains(input.as_str()) {
                        tracing::warn!(
                            step = step.title,
                            key = input,
                            "Command input is not produced by an earlier step"
                        );
                    }
                }
                if let Some(ref output) = run.output {
                    produced.insert(output.as_str());
                }
            }
            (None, None) => {}
        }
    }

    Ok(())
}

/// Discover procedures under `dir` and in any extra directories.
///
/// Looks in `.donothing/procedures/` and `procedures/` under `dir`. Results
/// are sorted by name; files that fail to parse are skipped with a warning.
pub fn discover_procedures(
    dir: &Path,
    extra_dirs: &[PathBuf],
) -> anyhow::Result<Vec<(String, ProcedureFile)>> {
    let mut procedures = Vec::new();

    let candidates = [dir.join(".donothing").join("procedures"), dir.join("procedures")];
    for candidate in candidates.iter().chain(extra_dirs) {
        if candidate.is_dir() {
            procedures.extend(scan_procedure_dir(candidate)?);
        }
    }

    procedures.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(procedures)
}

/// Scan a directory for procedure files.
fn scan_procedure_dir(dir: &Path) -> anyhow::Result<Vec<(String, ProcedureFile)>> {
    let mut procedures = Vec::new();

    for entry in std::fs::read_dir(dir)?.filter_map(Result::ok) {
        let path = entry.path();
        if !path.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            continue;
        }

        match parse_procedure(&path) {
            Ok(procedure) => {
                let name =
                    path.file_stem().and_then(|n| n.to_str()).unwrap_or("unknown").to_string();
                procedures.push((name, procedure));
            }
            Err(e) => {
                tracing::warn!(path = ?path, error = %e, "Failed to parse procedure");
            }
        }
    }

    Ok(procedures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::procedure::Value;

    #[test]
    fn test_parse_valid_procedure() {
        let yaml = r#"
title: Rotate credentials
description: Rotate the staging password
steps:
  - title: Announce
    instructions: Post in the channel.
  - title: Generate
    run:
      command: openssl rand -hex 16
      output: password
  - title: Store
    instructions: Save ${password} in the vault.
"#;

        let file = parse_procedure_str(yaml).unwrap();
        assert_eq!(file.title, "Rotate credentials");
        assert_eq!(file.steps.len(), 3);
        assert_eq!(file.steps[1].run.as_ref().unwrap().output.as_deref(), Some("password"));

        let procedure = file.into_procedure(None);
        assert_eq!(procedure.step_count(), 3);
        assert_eq!(procedure.manual_step_count(), 2);

        let automation = procedure.steps()[1].automation.as_ref().unwrap();
        assert_eq!(automation.output(), Some("password"));
        assert_eq!(automation.description(), Some("openssl rand -hex 16"));
    }

    #[test]
    fn test_empty_step_list_is_valid() {
        let file = parse_procedure_str("title: nothing\n").unwrap();
        assert!(file.steps.is_empty());
        assert!(file.description.is_empty());
    }

    #[test]
    fn test_empty_title_fails() {
        assert!(parse_procedure_str("title: \"\"\nsteps: []\n").is_err());
    }

    #[test]
    fn test_untitled_step_fails() {
        let yaml = r#"
title: test
steps:
  - title: ""
    instructions: something
"#;
        assert!(parse_procedure_str(yaml).is_err());
    }

    #[test]
    fn test_step_with_instructions_and_run_fails() {
        let yaml = r#"
title: test
steps:
  - title: confused
    instructions: do it by hand
    run:
      command: echo automated
"#;
        let err = parse_procedure_str(yaml).unwrap_err();
        assert!(err.to_string().contains("both instructions and a run command"));
    }

    #[test]
    fn test_empty_command_fails() {
        let yaml = r#"
title: test
steps:
  - title: nothing
    run:
      command: "  "
"#;
        assert!(parse_procedure_str(yaml).is_err());
    }

    #[test]
    fn test_malformed_placeholder_fails() {
        let yaml = r#"
title: test
steps:
  - title: broken
    instructions: "costs $5"
"#;
        let err = parse_procedure_str(yaml).unwrap_err();
        assert!(err.to_string().contains("invalid placeholder"));
    }

    #[test]
    fn test_unknown_placeholder_is_allowed() {
        let yaml = r#"
title: test
steps:
  - title: seeded
    instructions: "Deploy ${env}"
"#;
        assert!(parse_procedure_str(yaml).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_procedure_runs_commands() {
        use crate::interaction::RecordingSink;
        use crate::procedure::RunConfig;
        use crate::render::MarkdownRenderer;

        let yaml = r#"
title: greet
steps:
  - title: who
    run:
      command: echo world
      output: name
  - title: shout
    run:
      command: printf '%s!' "$1"
      inputs: [name]
      output: shouted
  - title: say
    instructions: "hello, ${shouted}"
"#;

        let procedure = parse_procedure_str(yaml).unwrap().into_procedure(None);
        let mut config = RunConfig::new(MarkdownRenderer::new(), RecordingSink::new());
        let state = procedure.execute(&mut config).unwrap();

        assert_eq!(state.get("shouted"), Some(&Value::from("world!")));
        assert!(config.sink.transcript().contains("hello, world!\n\n"));
    }

    #[test]
    fn test_discover_procedures() {
        let dir = tempfile::tempdir().unwrap();
        let primary = dir.path().join(".donothing").join("procedures");
        let extra = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(&primary).unwrap();

        std::fs::write(primary.join("release.yaml"), "title: Release\n").unwrap();
        std::fs::write(primary.join("broken.yml"), "title: [unterminated").unwrap();
        std::fs::write(primary.join("notes.txt"), "title: Not a procedure\n").unwrap();
        std::fs::write(extra.path().join("audit.yml"), "title: Audit\n").unwrap();

        let found = discover_procedures(dir.path(), &[extra.path().to_path_buf()]).unwrap();
        let names: Vec<_> = found.iter().map(|(n, _)| n.as_str()).collect();

        assert_eq!(names, vec!["audit", "release"]);
        assert_eq!(found[1].1.title, "Release");
    }

    #[test]
    fn test_discover_in_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_procedures(dir.path(), &[]).unwrap().is_empty());
    }
}
