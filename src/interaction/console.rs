//! Terminal-backed interaction sinks.

use std::io::{self, BufRead, Stdin, Stdout, Write};

use super::InteractionSink;

const BEGIN_PROMPT: &str = "[Enter] to begin";
const CONTINUE_PROMPT: &str = "[Enter] to continue";

/// Source of confirmation lines for a [`ConsoleSink`].
pub trait ReadLine {
    /// Read one line into `buf`, returning the number of bytes read.
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize>;
}

impl<B: BufRead> ReadLine for B {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        BufRead::read_line(self, buf)
    }
}

/// Process stdin, locked only for the duration of each read.
///
/// Automations are free to read stdin themselves between prompts.
#[derive(Debug)]
pub struct StdinLines(Stdin);

impl StdinLines {
    pub fn new() -> Self {
        Self(io::stdin())
    }
}

impl Default for StdinLines {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadLine for StdinLines {
    fn read_line(&mut self, buf: &mut String) -> io::Result<usize> {
        self.0.read_line(buf)
    }
}

/// Writes text verbatim and blocks on a line of input for each prompt.
///
/// Any line, including an empty one, satisfies a prompt. End of input is an
/// error so a closed stdin never silently confirms a step.
#[derive(Debug)]
pub struct ConsoleSink<R, W> {
    reader: R,
    writer: W,
    begin_prompt: String,
    continue_prompt: String,
}

impl ConsoleSink<StdinLines, Stdout> {
    /// Create a sink on the process's stdin and stdout.
    pub fn stdio() -> Self {
        Self::new(StdinLines::new(), io::stdout())
    }
}

impl<R: ReadLine, W: Write> ConsoleSink<R, W> {
    /// Create a sink over arbitrary reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            begin_prompt: BEGIN_PROMPT.to_string(),
            continue_prompt: CONTINUE_PROMPT.to_string(),
        }
    }

    /// Override the prompt texts.
    #[must_use]
    pub fn with_prompts(mut self, begin: impl Into<String>, continue_: impl Into<String>) -> Self {
        self.begin_prompt = begin.into();
        self.continue_prompt = continue_.into();
        self
    }

    /// Consume the sink, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn prompt(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed while waiting for confirmation",
            ));
        }

        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

impl<R: ReadLine, W: Write> InteractionSink for ConsoleSink<R, W> {
    fn output(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }

    fn prompt_to_begin(&mut self) -> io::Result<()> {
        let text = self.begin_prompt.clone();
        self.prompt(&text)
    }

    fn prompt_step_completion(&mut self) -> io::Result<()> {
        let text = self.continue_prompt.clone();
        self.prompt(&text)
    }
}

/// Writes text but never blocks; every prompt is confirmed immediately.
#[derive(Debug)]
pub struct UnattendedSink<W> {
    writer: W,
}

impl UnattendedSink<Stdout> {
    /// Create an unattended sink on stdout.
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> UnattendedSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consume the sink, returning the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<W: Write> InteractionSink for UnattendedSink<W> {
    fn output(&mut self, text: &str) -> io::Result<()> {
        self.writer.write_all(text.as_bytes())?;
        self.writer.flush()
    }

    fn prompt_to_begin(&mut self) -> io::Result<()> {
        tracing::debug!("Auto-confirming start of procedure");
        Ok(())
    }

    fn prompt_step_completion(&mut self) -> io::Result<()> {
        tracing::debug!("Auto-confirming manual step");
        Ok(())
    }
}
