//! Completeness analyzer
//!
//! Sweeps every (state, symbol) pair of a machine and reports the pairs the
//! transition function leaves undefined. A machine with no gaps is a
//! fully-specified deterministic finite state machine.

use crate::Result;
use crate::state_machine::{MooreMachine, State, Transition};
use std::convert::Infallible;
use std::fmt;
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Every (state, symbol) pair has a destination
    FullySpecified,

    /// At least one pair is undefined
    PartiallySpecified,
}

impl Verdict {
    pub fn display_name(&self) -> &'static str {
        match self {
            Verdict::FullySpecified => "fully-specified",
            Verdict::PartiallySpecified => "partially-specified",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Analysis report containing the verdict inputs
#[derive(Debug, Clone)]
pub struct AnalysisReport<T> {
    /// Number of pairs checked (states × symbols)
    pub checked: usize,

    /// Undefined pairs, in state-then-symbol order
    pub missing: Vec<Transition<T>>,
}

impl<T> AnalysisReport<T> {
    pub fn verdict(&self) -> Verdict {
        if self.missing.is_empty() {
            Verdict::FullySpecified
        } else {
            Verdict::PartiallySpecified
        }
    }

    pub fn is_complete(&self) -> bool {
        self.verdict() == Verdict::FullySpecified
    }
}

/// Receives analyzer progress and the final report
pub trait ReportSink<T> {
    /// Called once per pair, in sweep order
    fn checked(&mut self, state: &State, symbol: &T, defined: bool) -> Result<()>;

    fn finished(&mut self, report: &AnalysisReport<T>) -> Result<()>;
}

/// Plain text report written to any `io::Write`
pub struct TextReport<W> {
    writer: W,
    progress: bool,
}

impl<W: Write> TextReport<W> {
    /// Report every checked pair and the summary
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            progress: true,
        }
    }

    /// Report only the summary
    pub fn summary_only(writer: W) -> Self {
        Self {
            writer,
            progress: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<T: fmt::Display, W: Write> ReportSink<T> for TextReport<W> {
    fn checked(&mut self, state: &State, symbol: &T, defined: bool) -> Result<()> {
        if self.progress {
            let found = if defined { "Found" } else { "Not found" };
            writeln!(self.writer, "Checking {} with {}... {}", state, symbol, found)?;
        }
        Ok(())
    }

    fn finished(&mut self, report: &AnalysisReport<T>) -> Result<()> {
        if report.is_complete() {
            writeln!(
                self.writer,
                "This Moore-Machine is a {} deterministic finite state machine.",
                report.verdict()
            )?;
            return Ok(());
        }

        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "This Moore-Machine is a {} deterministic finite state machine.",
            report.verdict()
        )?;
        writeln!(self.writer)?;
        writeln!(self.writer, "Following transitions are missing:")?;
        for gap in &report.missing {
            writeln!(self.writer, "{}", gap)?;
        }
        Ok(())
    }
}

impl<T> MooreMachine<T>
where
    T: Clone + PartialEq + fmt::Debug + Send + Sync,
{
    /// Check that the transition function is total over states × alphabet.
    ///
    /// Read-only: the pending input, the pacing and any running loop are
    /// left untouched, and no output action is executed.
    pub fn analyze(&self) -> AnalysisReport<T> {
        let Ok(report) = self.sweep(|_, _, _| Ok::<_, Infallible>(()));
        report
    }

    /// Same as [`analyze`](Self::analyze), streaming progress to `sink`
    pub fn analyze_with(&self, sink: &mut dyn ReportSink<T>) -> Result<AnalysisReport<T>> {
        let report = self.sweep(|state, symbol, defined| sink.checked(state, symbol, defined))?;
        sink.finished(&report)?;
        Ok(report)
    }

    fn sweep<E>(
        &self,
        mut visit: impl FnMut(&State, &T, bool) -> std::result::Result<(), E>,
    ) -> std::result::Result<AnalysisReport<T>, E> {
        let mut checked = 0;
        let mut missing = Vec::new();

        for state in self.states() {
            for symbol in self.alphabet() {
                let defined = self.resolve(state, symbol).is_some();
                checked += 1;
                visit(state, symbol, defined)?;

                if !defined {
                    missing.push(Transition::undefined(state.clone(), symbol.clone()));
                }
            }
        }

        tracing::debug!(checked, missing = missing.len(), "Analyzed transition function");
        Ok(AnalysisReport { checked, missing })
    }
}
