//! Rendering of procedures and steps into human-readable text.
//!
//! The engine only talks to the [`Renderer`] trait. Every operation is a pure
//! function of its arguments; renderers perform no I/O.

mod markdown;

pub use markdown::MarkdownRenderer;

use crate::procedure::{Automation, Procedure, ProcedureResult, State, Step, Value};

/// Text-production capabilities used while executing a procedure.
pub trait Renderer {
    /// Header shown before the procedure begins (title and description).
    fn header(&self, procedure: &Procedure) -> String;

    /// Title of a step.
    fn step_title(&self, state: &State, step: &Step) -> String;

    /// Instructions of a manual step with placeholders substituted from state.
    fn step_instructions_for_execution(&self, state: &State, step: &Step)
        -> ProcedureResult<String>;

    /// Notice that a step is running automatically.
    fn automated_note_for_execution(&self, state: &State, step: &Step) -> String;

    /// The captured result of an automation with an output key.
    fn automated_output(&self, state: &State, automation: &Automation, result: &Value) -> String;

    /// Notice emitted once every step has run.
    fn completion(&self, _procedure: &Procedure) -> String {
        "done!\n".to_string()
    }
}

impl<T: Renderer + ?Sized> Renderer for Box<T> {
    fn header(&self, procedure: &Procedure) -> String {
        (**self).header(procedure)
    }

    fn step_title(&self, state: &State, step: &Step) -> String {
        (**self).step_title(state, step)
    }

    fn step_instructions_for_execution(
        &self,
        state: &State,
        step: &Step,
    ) -> ProcedureResult<String> {
        (**self).step_instructions_for_execution(state, step)
    }

    fn automated_note_for_execution(&self, state: &State, step: &Step) -> String {
        (**self).automated_note_for_execution(state, step)
    }

    fn automated_output(&self, state: &State, automation: &Automation, result: &Value) -> String {
        (**self).automated_output(state, automation, result)
    }

    fn completion(&self, procedure: &Procedure) -> String {
        (**self).completion(procedure)
    }
}
