//! Human-readable console consumer
//!
//! Indented unit/case/step layout with ANSI color, one line per step
//! result. The default console consumer.

use crate::consumer::Consumer;
use crate::models::{
    CaseMeta, HookPhase, MalformedInput, StepMatch, StepMeta, StepResult, StepStatus, UnitMeta,
};
use crate::sink::{DiagnosticsSink, OutputSink, ResultSink, SinkError, StructureSink};
use std::io::{self, Write};

/// Pretty console stream.
pub struct PrettyPrinter {
    out: Box<dyn Write + Send>,
    colorize: bool,
    pending_step: Option<StepMeta>,
}

impl PrettyPrinter {
    pub fn new() -> Self {
        Self::to_writer(Box::new(io::stdout()))
    }

    pub fn to_writer(out: Box<dyn Write + Send>) -> Self {
        Self {
            out,
            colorize: true,
            pending_step: None,
        }
    }

    pub fn no_color(mut self) -> Self {
        self.colorize = false;
        self
    }

    fn status_mark(&self, status: StepStatus) -> String {
        let symbol = status.symbol();
        if !self.colorize {
            return symbol.to_string();
        }
        let color = match status {
            StepStatus::Passed => "\x1b[32m",
            StepStatus::Failed | StepStatus::Undefined => "\x1b[31m",
            StepStatus::Skipped | StepStatus::Pending => "\x1b[33m",
        };
        format!("{color}{symbol}\x1b[0m")
    }

    /// A step whose result never arrived (the tail of a crashed unit's
    /// log) is still printed, without a status mark.
    fn flush_pending(&mut self) -> Result<(), SinkError> {
        if let Some(step) = self.pending_step.take() {
            writeln!(self.out, "      {}", step.text)?;
        }
        Ok(())
    }
}

impl Default for PrettyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl StructureSink for PrettyPrinter {
    fn source(&mut self, uri: &str) -> Result<(), SinkError> {
        self.flush_pending()?;
        if self.colorize {
            writeln!(self.out, "\x1b[2m{uri}\x1b[0m")?;
        } else {
            writeln!(self.out, "{uri}")?;
        }
        Ok(())
    }

    fn unit_started(&mut self, unit: &UnitMeta) -> Result<(), SinkError> {
        if unit.tags.is_empty() {
            writeln!(self.out, "Unit: {}", unit.name)?;
        } else {
            writeln!(self.out, "Unit: {} [{}]", unit.name, unit.tags.join(", "))?;
        }
        if let Some(description) = &unit.description {
            writeln!(self.out, "  {description}")?;
        }
        Ok(())
    }

    fn case_started(&mut self, case: &CaseMeta) -> Result<(), SinkError> {
        self.flush_pending()?;
        writeln!(self.out, "  Case: {}", case.name)?;
        Ok(())
    }

    fn step(&mut self, step: &StepMeta) -> Result<(), SinkError> {
        // printed together with its result
        self.pending_step = Some(step.clone());
        Ok(())
    }

    fn case_finished(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
        self.flush_pending()?;
        writeln!(self.out)?;
        Ok(())
    }

    fn unit_finished(&mut self) -> Result<(), SinkError> {
        self.flush_pending()?;
        self.out.flush()?;
        Ok(())
    }
}

impl ResultSink for PrettyPrinter {
    fn step_matched(&mut self, _matched: &StepMatch) -> Result<(), SinkError> {
        Ok(())
    }

    fn step_result(&mut self, result: &StepResult) -> Result<(), SinkError> {
        let text = self
            .pending_step
            .take()
            .map(|s| s.text)
            .unwrap_or_default();
        match result.duration_ms {
            Some(ms) => writeln!(
                self.out,
                "    {} {} [{}ms]",
                self.status_mark(result.status),
                text,
                ms
            )?,
            None => writeln!(self.out, "    {} {}", self.status_mark(result.status), text)?,
        }
        if let Some(error) = &result.error {
            writeln!(self.out, "        {error}")?;
        }
        Ok(())
    }

    fn hook_result(&mut self, phase: HookPhase, result: &StepResult) -> Result<(), SinkError> {
        // passing hooks stay quiet
        if result.status == StepStatus::Failed {
            writeln!(
                self.out,
                "    {} {} hook failed: {}",
                self.status_mark(result.status),
                phase,
                result.error.as_deref().unwrap_or("no detail")
            )?;
        }
        Ok(())
    }
}

impl OutputSink for PrettyPrinter {
    fn text(&mut self, text: &str) -> Result<(), SinkError> {
        writeln!(self.out, "    {text}")?;
        Ok(())
    }

    fn attachment(&mut self, media_type: &str, bytes: &[u8]) -> Result<(), SinkError> {
        writeln!(
            self.out,
            "    [attachment {media_type}, {} bytes]",
            bytes.len()
        )?;
        Ok(())
    }
}

impl DiagnosticsSink for PrettyPrinter {
    fn malformed_input(&mut self, notice: &MalformedInput) -> Result<(), SinkError> {
        if self.colorize {
            writeln!(self.out, "  \x1b[31m! {notice}\x1b[0m")?;
        } else {
            writeln!(self.out, "  ! {notice}")?;
        }
        Ok(())
    }
}

impl Consumer for PrettyPrinter {
    fn name(&self) -> &'static str {
        "pretty"
    }

    fn structure(&mut self) -> Option<&mut dyn StructureSink> {
        Some(self)
    }

    fn results(&mut self) -> Option<&mut dyn ResultSink> {
        Some(self)
    }

    fn output(&mut self) -> Option<&mut dyn OutputSink> {
        Some(self)
    }

    fn diagnostics(&mut self) -> Option<&mut dyn DiagnosticsSink> {
        Some(self)
    }
}
