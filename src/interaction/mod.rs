//! Interaction with the person running a procedure.
//!
//! The engine emits rendered text and waits for acknowledgement only through
//! the [`InteractionSink`] trait. Prompts are synchronization points; nothing
//! the user types flows back into procedure state.

mod console;
mod recording;

pub use console::{ConsoleSink, ReadLine, StdinLines, UnattendedSink};
pub use recording::{RecordingSink, SinkEvent};

use std::io;

/// Output and acknowledgement capabilities used while executing a procedure.
pub trait InteractionSink {
    /// Emit rendered text to the user.
    fn output(&mut self, text: &str) -> io::Result<()>;

    /// Block until the user is ready to begin.
    fn prompt_to_begin(&mut self) -> io::Result<()>;

    /// Block until the user confirms a manual step is done.
    fn prompt_step_completion(&mut self) -> io::Result<()>;
}

impl<T: InteractionSink + ?Sized> InteractionSink for Box<T> {
    fn output(&mut self, text: &str) -> io::Result<()> {
        (**self).output(text)
    }

    fn prompt_to_begin(&mut self) -> io::Result<()> {
        (**self).prompt_to_begin()
    }

    fn prompt_step_completion(&mut self) -> io::Result<()> {
        (**self).prompt_step_completion()
    }
}
