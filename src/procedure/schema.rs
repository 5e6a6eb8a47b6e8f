//! Procedure data model.
//!
//! A procedure is an ordered list of steps. Each step is either manual
//! (instructions for a human) or automated (wraps an [`Automation`]).

use std::fmt;
use std::rc::Rc;

use super::state::Value;

/// The callable behind an automation.
///
/// Receives the values of the automation's input keys, positionally.
pub type Operation = dyn Fn(&[Value]) -> anyhow::Result<Value>;

/// A unit of work attached to an automated step.
#[derive(Clone)]
pub struct Automation {
    /// Operation to invoke
    execute: Rc<Operation>,

    /// State keys passed as inputs, in order
    inputs: Vec<String>,

    /// State key to store the result under (result is discarded if absent)
    output: Option<String>,

    /// Short human-readable description of what runs (e.g. a shell command)
    description: Option<String>,
}

impl Automation {
    /// Create an automation from an operation with no inputs and no output.
    pub fn new<F>(execute: F) -> Self
    where
        F: Fn(&[Value]) -> anyhow::Result<Value> + 'static,
    {
        Self { execute: Rc::new(execute), inputs: Vec::new(), output: None, description: None }
    }

    /// Set the state keys passed to the operation.
    #[must_use]
    pub fn with_inputs<I, S>(mut self, inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.inputs = inputs.into_iter().map(Into::into).collect();
        self
    }

    /// Set the state key the result is stored under.
    #[must_use]
    pub fn with_output(mut self, key: impl Into<String>) -> Self {
        self.output = Some(key.into());
        self
    }

    /// Set a description of what this automation runs.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Invoke the operation with already-gathered input values.
    pub fn invoke(&self, args: &[Value]) -> anyhow::Result<Value> {
        (self.execute)(args)
    }
}

impl fmt::Debug for Automation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Automation")
            .field("inputs", &self.inputs)
            .field("output", &self.output)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// A step in a procedure.
#[derive(Debug, Clone)]
pub struct Step {
    /// Title of the step
    pub title: String,

    /// Instructions for a manual step; may contain `${key}` placeholders
    pub instructions: Option<String>,

    /// Automation for an automated step
    pub automation: Option<Automation>,
}

impl Step {
    /// Create a manual step.
    pub fn manual(title: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self { title: title.into(), instructions: Some(instructions.into()), automation: None }
    }

    /// Create an automated step.
    pub fn automated(title: impl Into<String>, automation: Automation) -> Self {
        Self { title: title.into(), instructions: None, automation: Some(automation) }
    }

    /// Whether this step runs automatically.
    pub fn is_automated(&self) -> bool {
        self.automation.is_some()
    }
}

/// A titled, ordered list of steps.
#[derive(Debug, Clone)]
pub struct Procedure {
    /// Title of the procedure
    pub title: String,

    /// What the procedure accomplishes
    pub description: String,

    /// Steps in execution order
    steps: Vec<Step>,
}

impl Procedure {
    /// Create a procedure with no steps.
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self { title: title.into(), description: description.into(), steps: Vec::new() }
    }

    /// Append a step.
    pub fn add_step(
        mut self,
        title: impl Into<String>,
        instructions: Option<String>,
        automation: Option<Automation>,
    ) -> Self {
        self.steps.push(Step { title: title.into(), instructions, automation });
        self
    }

    /// Append a manual step.
    pub fn add_manual_step(
        self,
        title: impl Into<String>,
        instructions: impl Into<String>,
    ) -> Self {
        self.add_step(title, Some(instructions.into()), None)
    }

    /// Append an automated step.
    pub fn add_automated_step(self, title: impl Into<String>, automation: Automation) -> Self {
        self.add_step(title, None, Some(automation))
    }

    /// Steps in execution order.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Get the number of steps.
    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Get the number of manual steps.
    pub fn manual_step_count(&self) -> usize {
        self.steps.iter().filter(|s| !s.is_automated()).count()
    }
}
