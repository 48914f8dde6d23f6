//! Interactive marking of catalog entries
//!
//! A marking session walks the catalog one sender at a time and asks the
//! operator for a yes/no decision. The prompt is line-oriented and
//! blocking; an unattended run waits indefinitely. Anything other than an
//! affirmative or negative token is rejected and re-prompted, never
//! silently defaulted.

use std::io::{BufRead, Write};

use tracing::debug;

use crate::catalog::SenderCatalog;
use crate::error::{Result, SweepError};
use crate::identity::SenderIdentity;

/// Capability interface for yes/no decisions, so the session can be driven
/// by a scripted source in tests or batch runs instead of a terminal.
pub trait DecisionSource {
    /// Ask for one binary decision. Implementations must not default:
    /// they return only once the operator has answered yes or no.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Line-oriented stdin/stdout decision source.
///
/// Accepts `y`/`yes`/`n`/`no` (case-insensitive) and re-prompts on any
/// other input.
pub struct StdinDecisions;

impl DecisionSource for StdinDecisions {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();

        loop {
            write!(stdout, "{} [y/n]: ", prompt)?;
            stdout.flush()?;

            let mut line = String::new();
            let read = stdin.lock().read_line(&mut line)?;
            if read == 0 {
                return Err(SweepError::Unknown(
                    "stdin closed while awaiting a decision".to_string(),
                ));
            }

            match parse_decision(&line) {
                Some(answer) => return Ok(answer),
                None => {
                    writeln!(stdout, "Please answer 'y' or 'n'.")?;
                }
            }
        }
    }
}

/// Pre-scripted decision source for batch use and tests
pub struct ScriptedDecisions {
    answers: std::vec::IntoIter<bool>,
}

impl ScriptedDecisions {
    pub fn new(answers: Vec<bool>) -> Self {
        Self {
            answers: answers.into_iter(),
        }
    }
}

impl DecisionSource for ScriptedDecisions {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        self.answers.next().ok_or_else(|| {
            SweepError::Unknown("scripted decisions exhausted before the catalog".to_string())
        })
    }
}

/// Interpret one line of operator input. `None` means re-prompt.
fn parse_decision(line: &str) -> Option<bool> {
    match line.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Walks the catalog and collects the operator's marked subset
pub struct MarkingSession<S: DecisionSource> {
    source: S,
}

impl<S: DecisionSource> MarkingSession<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Visit every catalog entry exactly once, in catalog order, and
    /// return the marked subset in that same order.
    pub fn mark(&mut self, catalog: &SenderCatalog) -> Result<Vec<SenderIdentity>> {
        let mut marked = Vec::new();

        for identity in catalog.iter() {
            let prompt = format!("Mark sender {}?", identity.label());
            if self.source.confirm(&prompt)? {
                debug!("Marked sender: {}", identity.raw);
                marked.push(identity.clone());
            }
        }

        Ok(marked)
    }
}
