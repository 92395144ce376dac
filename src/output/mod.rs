//! Report output
//!
//! The consumers bundled with the binary and the wiring that turns CLI
//! choices into a consumer set.

mod json;
mod pretty;
mod progress;

pub use json::JsonReport;
pub use pretty::PrettyPrinter;
pub use progress::ProgressPrinter;

use crate::consumer::Consumer;
use std::path::Path;

/// Console format options.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConsoleFormat {
    Pretty,
    Progress,
    Quiet,
}

impl ConsoleFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Some(ConsoleFormat::Pretty),
            "progress" => Some(ConsoleFormat::Progress),
            "quiet" | "none" => Some(ConsoleFormat::Quiet),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ConsoleFormat::Pretty => "pretty",
            ConsoleFormat::Progress => "progress",
            ConsoleFormat::Quiet => "quiet",
        }
    }

    pub fn all() -> Vec<ConsoleFormat> {
        vec![
            ConsoleFormat::Pretty,
            ConsoleFormat::Progress,
            ConsoleFormat::Quiet,
        ]
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConsoleFormat::Pretty => "indented units, cases and steps with color",
            ConsoleFormat::Progress => "one character per step result, summary at the end",
            ConsoleFormat::Quiet => "no console stream, outcome summary only",
        }
    }
}

/// Assemble the consumer set for a run.
pub fn build_consumers(
    format: ConsoleFormat,
    color: bool,
    json_path: Option<&Path>,
) -> Vec<Box<dyn Consumer>> {
    let mut consumers: Vec<Box<dyn Consumer>> = Vec::new();
    match format {
        ConsoleFormat::Pretty => {
            let printer = if color {
                PrettyPrinter::new()
            } else {
                PrettyPrinter::new().no_color()
            };
            consumers.push(Box::new(printer));
        }
        ConsoleFormat::Progress => consumers.push(Box::new(ProgressPrinter::new())),
        ConsoleFormat::Quiet => {}
    }
    if let Some(path) = json_path {
        consumers.push(Box::new(JsonReport::to_path(path)));
    }
    consumers
}
