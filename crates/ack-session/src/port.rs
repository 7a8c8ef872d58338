//! Operator I/O

use std::collections::VecDeque;
use std::io;

/// Line-oriented channel to the operator
pub trait LinePort {
    /// Print one line
    fn write_line(&mut self, line: &str) -> io::Result<()>;

    /// Show `prompt` and read one line without its terminator
    ///
    /// `Ok(None)` means the input is closed.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>>;
}

/// Port replaying canned input and capturing output
#[derive(Debug, Default, Clone)]
pub struct ScriptedPort {
    input: VecDeque<String>,
    output: Vec<String>,
    prompts: Vec<String>,
}

impl ScriptedPort {
    pub fn new<I, S>(input: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            input: input.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// Lines written so far
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// Prompts shown so far
    pub fn prompts(&self) -> &[String] {
        &self.prompts
    }

    /// Input lines not consumed yet
    pub fn remaining(&self) -> usize {
        self.input.len()
    }
}

impl LinePort for ScriptedPort {
    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.output.push(line.to_string());
        Ok(())
    }

    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.prompts.push(prompt.to_string());
        Ok(self.input.pop_front())
    }
}
