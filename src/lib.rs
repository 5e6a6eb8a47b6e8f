//! # donothing
//!
//! Do-nothing scripting: runbooks that mix manual checklists with automation.
//!
//! A [`Procedure`] is an ordered list of steps. Manual steps print
//! instructions and wait for you to confirm them; automated steps run an
//! operation and capture its result, which later steps can use as inputs or
//! through `${key}` placeholders. Start with every step manual, then automate
//! them one at a time.
//!
//! ## Quick Start
//!
//! ```no_run
//! use donothing::{Automation, Procedure, Value};
//!
//! Procedure::new("Onboard", "Give a new teammate access")
//!     .add_manual_step("Create account", "Create an account in the admin panel.")
//!     .add_automated_step(
//!         "Generate password",
//!         Automation::new(|_| Ok(Value::from("hunter2"))).with_output("password"),
//!     )
//!     .add_manual_step("Share", "Send ${password} over the password manager.")
//!     .execute_default()
//!     .unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::format_push_string)]
#![allow(clippy::cast_possible_truncation)]

pub mod config;
pub mod interaction;
pub mod procedure;
pub mod render;

// Re-export commonly used types
pub use config::Config;
pub use interaction::{ConsoleSink, InteractionSink, RecordingSink, UnattendedSink};
pub use procedure::{
    Automation, Procedure, ProcedureError, ProcedureResult, RunConfig, State, Step, Value,
};
pub use render::{MarkdownRenderer, Renderer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "donothing";
