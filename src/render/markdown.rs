//! Markdown renderer.

use super::Renderer;
use crate::procedure::{substitute, Automation, Procedure, ProcedureResult, State, Step, Value};

const DEFAULT_COMPLETION_MESSAGE: &str = "done!";

/// Renders procedures as Markdown text.
#[derive(Debug, Clone)]
pub struct MarkdownRenderer {
    /// Text of the final completion notice
    completion_message: String,
}

impl Default for MarkdownRenderer {
    fn default() -> Self {
        Self { completion_message: DEFAULT_COMPLETION_MESSAGE.to_string() }
    }
}

impl MarkdownRenderer {
    /// Create a renderer with the default completion message.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the completion message.
    #[must_use]
    pub fn with_completion_message(mut self, message: impl Into<String>) -> Self {
        self.completion_message = message.into();
        self
    }

    /// Render the whole procedure without executing it.
    ///
    /// Instructions are shown verbatim (placeholders are left in place) and
    /// automated steps list what they run and where the result goes.
    pub fn outline(&self, procedure: &Procedure) -> String {
        let state = State::new();
        let mut text = self.header(procedure);

        for (i, step) in procedure.steps().iter().enumerate() {
            text.push_str(&format!("## {}. {}\n\n", i + 1, step.title));

            match &step.automation {
                Some(automation) => {
                    text.push_str(&self.automated_note_for_execution(&state, step));
                    if let Some(description) = automation.description() {
                        text.push_str(&format!("Runs: `{description}`\n\n"));
                    }
                    if !automation.inputs().is_empty() {
                        let inputs: Vec<String> =
                            automation.inputs().iter().map(|k| format!("`{k}`")).collect();
                        text.push_str(&format!("**Inputs**: {}\n\n", inputs.join(", ")));
                    }
                    if let Some(output) = automation.output() {
                        text.push_str(&format!("**Outputs**: `{output}`\n\n"));
                    }
                }
                None => {
                    if let Some(instructions) = &step.instructions {
                        text.push_str(&format!("{instructions}\n\n"));
                    }
                }
            }
        }

        text
    }
}

impl Renderer for MarkdownRenderer {
    fn header(&self, procedure: &Procedure) -> String {
        format!("\n# {}\n\n{}\n\n", procedure.title, procedure.description)
    }

    fn step_title(&self, _state: &State, step: &Step) -> String {
        format!("## {}\n\n", step.title)
    }

    fn step_instructions_for_execution(
        &self,
        state: &State,
        step: &Step,
    ) -> ProcedureResult<String> {
        match &step.instructions {
            Some(instructions) => {
                Ok(format!("{}\n\n", substitute(instructions, state, &step.title)?))
            }
            None => Ok(String::new()),
        }
    }

    fn automated_note_for_execution(&self, _state: &State, _step: &Step) -> String {
        "Executing step automatically.\n\n".to_string()
    }

    fn automated_output(&self, _state: &State, automation: &Automation, result: &Value) -> String {
        format!("**Outputs**:\n  - `{}`: {}\n\n", automation.output().unwrap_or_default(), result)
    }

    fn completion(&self, _procedure: &Procedure) -> String {
        format!("{}\n", self.completion_message)
    }
}
