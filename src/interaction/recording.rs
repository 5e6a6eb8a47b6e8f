//! In-memory sink that records every interaction.

use std::io;

use super::InteractionSink;

/// One interaction observed by a [`RecordingSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Output(String),
    BeginPrompt,
    CompletionPrompt,
}

/// Scripted sink for tests and embedding: prompts return immediately and
/// everything is recorded in order.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events in the order they happened.
    pub fn events(&self) -> &[SinkEvent] {
        &self.events
    }

    /// Concatenation of all emitted text.
    pub fn transcript(&self) -> String {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Output(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Number of "begin" prompts seen.
    pub fn begin_prompts(&self) -> usize {
        self.events.iter().filter(|e| **e == SinkEvent::BeginPrompt).count()
    }

    /// Number of "step complete" prompts seen.
    pub fn completion_prompts(&self) -> usize {
        self.events.iter().filter(|e| **e == SinkEvent::CompletionPrompt).count()
    }
}

impl InteractionSink for RecordingSink {
    fn output(&mut self, text: &str) -> io::Result<()> {
        self.events.push(SinkEvent::Output(text.to_string()));
        Ok(())
    }

    fn prompt_to_begin(&mut self) -> io::Result<()> {
        self.events.push(SinkEvent::BeginPrompt);
        Ok(())
    }

    fn prompt_step_completion(&mut self) -> io::Result<()> {
        self.events.push(SinkEvent::CompletionPrompt);
        Ok(())
    }
}
