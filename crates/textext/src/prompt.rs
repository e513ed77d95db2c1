//! Line-based terminal prompt.

use std::io::{self, BufRead, Write};

use textext_core::{PromptValues, TextPrompt};

/// Smallest and largest scale factor accepted interactively.
const SCALE_RANGE: (f64, f64) = (0.01, 100.0);

/// Line that ends multi-line markup input.
const END_OF_TEXT: &str = ".";

/// Asks for markup, preamble file and scale factor on a terminal.
///
/// End of input at any question cancels.
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stderr> {
    /// Read from stdin, ask on stderr (stdout carries the document).
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stderr())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// One line without its terminator, `None` at end of input.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim_end_matches(['\n', '\r']).len();
        line.truncate(trimmed);
        Ok(Some(line))
    }

    fn ask_text(&mut self, current: &str) -> io::Result<Option<String>> {
        if current.is_empty() {
            writeln!(
                self.output,
                "Enter LaTeX, then a line with a single '{}':",
                END_OF_TEXT
            )?;
        } else {
            writeln!(self.output, "Current LaTeX:\n{}", current)?;
            writeln!(
                self.output,
                "Enter new LaTeX, then a line with a single '{}' (just '{}' keeps it):",
                END_OF_TEXT, END_OF_TEXT
            )?;
        }
        self.output.flush()?;

        let mut lines = Vec::new();
        loop {
            match self.read_line()? {
                None => return Ok(None),
                Some(line) if line == END_OF_TEXT => break,
                Some(line) => lines.push(line),
            }
        }
        Ok(Some(if lines.is_empty() {
            current.to_string()
        } else {
            lines.join("\n")
        }))
    }

    fn ask_preamble(&mut self, current: &str) -> io::Result<Option<String>> {
        write!(self.output, "Preamble file [{}]: ", current)?;
        self.output.flush()?;
        Ok(self.read_line()?.map(|line| {
            let line = line.trim();
            if line.is_empty() {
                current.to_string()
            } else {
                line.to_string()
            }
        }))
    }

    fn ask_scale(&mut self, current: f64) -> io::Result<Option<f64>> {
        loop {
            write!(self.output, "Scale factor [{}]: ", current)?;
            self.output.flush()?;
            let Some(line) = self.read_line()? else {
                return Ok(None);
            };
            let line = line.trim();
            if line.is_empty() {
                return Ok(Some(current));
            }
            match line.parse::<f64>() {
                Ok(value) if value.is_finite() => {
                    return Ok(Some(value.clamp(SCALE_RANGE.0, SCALE_RANGE.1)));
                }
                _ => writeln!(self.output, "Not a number: {}", line)?,
            }
        }
    }

    fn ask_all(&mut self, initial: PromptValues) -> io::Result<Option<PromptValues>> {
        let Some(text) = self.ask_text(&initial.text)? else {
            return Ok(None);
        };
        let Some(preamble_file) = self.ask_preamble(&initial.preamble_file)? else {
            return Ok(None);
        };
        let Some(scale_factor) = self.ask_scale(initial.scale_factor)? else {
            return Ok(None);
        };
        Ok(Some(PromptValues {
            text,
            preamble_file,
            scale_factor,
        }))
    }
}

impl<R: BufRead, W: Write> TextPrompt for TerminalPrompt<R, W> {
    fn ask(&mut self, initial: PromptValues) -> Option<PromptValues> {
        match self.ask_all(initial) {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(error = %e, "Terminal input failed, cancelling");
                None
            }
        }
    }
}
