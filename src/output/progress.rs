//! Progress console consumer
//!
//! One character per step result, a summary line when the stream is
//! done. Cares only about results, diagnostics, and the stream
//! lifecycle; structural calls pass it by.

use crate::consumer::Consumer;
use crate::models::{HookPhase, MalformedInput, StepMatch, StepResult, StepStatus};
use crate::sink::{DiagnosticsSink, LifecycleSink, ResultSink, SinkError};
use std::io::{self, Write};

const WRAP_AT: usize = 70;

#[derive(Debug, Default)]
struct StepTally {
    passed: usize,
    failed: usize,
    skipped: usize,
    pending: usize,
    undefined: usize,
}

impl StepTally {
    fn record(&mut self, status: StepStatus) {
        match status {
            StepStatus::Passed => self.passed += 1,
            StepStatus::Failed => self.failed += 1,
            StepStatus::Skipped => self.skipped += 1,
            StepStatus::Pending => self.pending += 1,
            StepStatus::Undefined => self.undefined += 1,
        }
    }

    fn total(&self) -> usize {
        self.passed + self.failed + self.skipped + self.pending + self.undefined
    }

    fn summary(&self) -> String {
        let mut parts = vec![format!("{} passed", self.passed)];
        if self.failed > 0 {
            parts.push(format!("{} failed", self.failed));
        }
        if self.skipped > 0 {
            parts.push(format!("{} skipped", self.skipped));
        }
        if self.pending > 0 {
            parts.push(format!("{} pending", self.pending));
        }
        if self.undefined > 0 {
            parts.push(format!("{} undefined", self.undefined));
        }
        format!("{} step(s): {}", self.total(), parts.join(", "))
    }
}

/// Progress console stream.
pub struct ProgressPrinter {
    out: Box<dyn Write + Send>,
    emitted: usize,
    malformed: usize,
    tally: StepTally,
}

impl ProgressPrinter {
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    pub fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            emitted: 0,
            malformed: 0,
            tally: StepTally::default(),
        }
    }

    fn mark(&mut self, c: char) -> Result<(), SinkError> {
        write!(self.out, "{c}")?;
        self.emitted += 1;
        if self.emitted % WRAP_AT == 0 {
            writeln!(self.out)?;
        }
        // progress is only worth anything when it shows up promptly
        self.out.flush()?;
        Ok(())
    }
}

impl Default for ProgressPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResultSink for ProgressPrinter {
    fn step_matched(&mut self, _matched: &StepMatch) -> Result<(), SinkError> {
        Ok(())
    }

    fn step_result(&mut self, result: &StepResult) -> Result<(), SinkError> {
        self.tally.record(result.status);
        let c = match result.status {
            StepStatus::Passed => '.',
            StepStatus::Failed => 'F',
            StepStatus::Skipped => '-',
            StepStatus::Pending => 'P',
            StepStatus::Undefined => 'U',
        };
        self.mark(c)
    }

    fn hook_result(&mut self, _phase: HookPhase, result: &StepResult) -> Result<(), SinkError> {
        if result.status == StepStatus::Failed {
            self.mark('H')?;
        }
        Ok(())
    }
}

impl DiagnosticsSink for ProgressPrinter {
    fn malformed_input(&mut self, _notice: &MalformedInput) -> Result<(), SinkError> {
        self.malformed += 1;
        self.mark('M')
    }
}

impl LifecycleSink for ProgressPrinter {
    fn stream_done(&mut self) -> Result<(), SinkError> {
        if self.emitted > 0 {
            writeln!(self.out)?;
        }
        writeln!(self.out, "{}", self.tally.summary())?;
        if self.malformed > 0 {
            writeln!(self.out, "{} malformed input notice(s)", self.malformed)?;
        }
        Ok(())
    }

    fn stream_close(&mut self) -> Result<(), SinkError> {
        self.out.flush()?;
        Ok(())
    }
}

impl Consumer for ProgressPrinter {
    fn name(&self) -> &'static str {
        "progress"
    }

    fn results(&mut self) -> Option<&mut dyn ResultSink> {
        Some(self)
    }

    fn diagnostics(&mut self) -> Option<&mut dyn DiagnosticsSink> {
        Some(self)
    }

    fn lifecycle(&mut self) -> Option<&mut dyn LifecycleSink> {
        Some(self)
    }
}
