//! Procedures: ordered runbooks of manual and automated steps.
//!
//! Manual steps show instructions and wait for a human to confirm them.
//! Automated steps run an operation and may store its result in the run's
//! [`State`], where later steps can read it as inputs or `${key}`
//! placeholders.

mod command;
mod error;
mod loader;
mod runner;
mod schema;
mod state;
mod template;

pub use command::ShellCommand;
pub use error::{ProcedureError, ProcedureResult};
pub use loader::{
    discover_procedures, parse_procedure, parse_procedure_str, ProcedureFile, RunFile, StepFile,
};
pub use runner::{execute_step, RunConfig};
pub use schema::{Automation, Operation, Procedure, Step};
pub use state::{State, Value};
pub use template::{placeholders, substitute, InvalidPlaceholder};
