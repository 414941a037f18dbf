use std::io::{self, BufRead, Write};

use tracing::warn;

/// Operator-facing side of a reconciliation: shows team details and gates
/// mutating steps behind a yes/no answer.
pub trait Confirm {
    fn confirm(&mut self, question: &str) -> bool;

    /// Shows text to the operator.
    fn show(&mut self, text: &str) {
        print!("{text}");
    }
}

/// Answers yes to everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssumeYes;

impl Confirm for AssumeYes {
    fn confirm(&mut self, _question: &str) -> bool {
        true
    }
}

/// Interactive prompt defaulting to "no".
///
/// Accepts `y`, `ye`, `yes`, `n`, `no` in any case. An empty answer or end
/// of input means no; anything else asks again. A terminal that cannot be
/// written or read is logged and answers no.
#[derive(Debug)]
pub struct TerminalPrompt<R, W> {
    input: R,
    output: W,
}

impl TerminalPrompt<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn into_output(self) -> W {
        self.output
    }
}

impl<R: BufRead, W: Write> Confirm for TerminalPrompt<R, W> {
    fn show(&mut self, text: &str) {
        if let Err(err) = write!(self.output, "{text}").and_then(|()| self.output.flush()) {
            warn!(%err, "could not write to the terminal");
        }
    }

    fn confirm(&mut self, question: &str) -> bool {
        loop {
            let asked = write!(self.output, "{question}  [y/N]: ").and_then(|()| self.output.flush());
            if let Err(err) = asked {
                warn!(%err, "could not show the confirmation prompt, answering no");
                return false;
            }

            let mut answer = String::new();
            match self.input.read_line(&mut answer) {
                Ok(0) => return false,
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "could not read the confirmation answer, answering no");
                    return false;
                }
            }
            match answer.trim().to_lowercase().as_str() {
                "" | "n" | "no" => return false,
                "y" | "ye" | "yes" => return true,
                _ => {
                    if let Err(err) = writeln!(self.output, "Please respond with 'yes' or 'no'") {
                        warn!(%err, "could not write to the terminal");
                    }
                }
            }
        }
    }
}
