//! Asking the user whether to accept a changed overlay.

use std::io::{BufRead, Write};

pub trait Prompt {
    /// Ask a yes/no question. Yes is the default answer.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Prompts on the terminal.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompt {
    /// When false the default answer is taken without reading input.
    pub interactive: bool,
}

impl TerminalPrompt {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    fn ask(&self, message: &str, input: &mut impl BufRead, out: &mut impl Write) -> std::io::Result<bool> {
        loop {
            write!(out, "{} ", message)?;
            if !self.interactive {
                writeln!(out, "y")?;
                return Ok(true);
            }
            out.flush()?;

            let mut answer = String::new();
            if input.read_line(&mut answer)? == 0 {
                return Ok(true);
            }
            match answer.trim().to_lowercase().as_str() {
                "" | "y" | "yes" => return Ok(true),
                "n" | "no" => return Ok(false),
                _ => writeln!(out, "unrecognized response")?,
            }
        }
    }
}

impl Prompt for TerminalPrompt {
    fn confirm(&mut self, message: &str) -> bool {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        // A broken terminal falls back to the default answer.
        self.ask(message, &mut stdin.lock(), &mut stdout).unwrap_or(true)
    }
}

/// Always gives the same answer and counts how often it was asked.
#[derive(Debug, Clone, Default)]
pub struct FixedAnswer {
    pub answer: bool,
    pub asked: usize,
}

impl FixedAnswer {
    pub fn new(answer: bool) -> Self {
        Self { answer, asked: 0 }
    }
}

impl Prompt for FixedAnswer {
    fn confirm(&mut self, _message: &str) -> bool {
        self.asked += 1;
        self.answer
    }
}
