//! Bundled outline engine
//!
//! Runs the plain-text outline document format, so the binary works end
//! to end without an external engine. One directive per line:
//!
//! ```text
//! # comment
//! unit: Checkout
//! case: happy path
//! step: add an item to the cart
//! fail: charge the card
//! skip: send the receipt
//! note: free-form commentary
//! attach: text/plain raw attachment body
//! ```
//!
//! `unit:` may only appear before any other directive; without it the
//! unit is named after its file. The first malformed line raises a
//! malformed-input notice and halts the unit.

use super::{Engine, EngineError, UnitPlan};
use crate::models::{CaseMeta, MalformedInput, StepMatch, StepMeta, StepResult, UnitMeta, UnitStatus};
use crate::sink::ReportSink;
use std::fs;

#[derive(Clone, Copy)]
enum StepKind {
    Run,
    Fail,
    Skip,
}

enum Directive<'a> {
    Unit(&'a str),
    Case(&'a str),
    Step(StepKind, &'a str),
    Note(&'a str),
    Attach { media: &'a str, body: &'a str },
}

fn parse_line(line: &str) -> Result<Directive<'_>, String> {
    let (directive, payload) = line
        .split_once(':')
        .ok_or_else(|| format!("missing directive separator in {line:?}"))?;
    let directive = directive.trim();
    let payload = payload.trim();
    if payload.is_empty() {
        return Err(format!("directive '{directive}' has no payload"));
    }
    match directive {
        "unit" => Ok(Directive::Unit(payload)),
        "case" => Ok(Directive::Case(payload)),
        "step" => Ok(Directive::Step(StepKind::Run, payload)),
        "fail" => Ok(Directive::Step(StepKind::Fail, payload)),
        "skip" => Ok(Directive::Step(StepKind::Skip, payload)),
        "note" => Ok(Directive::Note(payload)),
        "attach" => match payload.split_once(' ') {
            Some((media, body)) if !body.trim().is_empty() => Ok(Directive::Attach {
                media,
                body: body.trim(),
            }),
            _ => Err("attach needs a media type and a body".to_string()),
        },
        other => Err(format!("unrecognized directive '{other}'")),
    }
}

/// Reference engine for outline documents.
#[derive(Clone, Copy, Debug, Default)]
pub struct OutlineEngine;

impl OutlineEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for OutlineEngine {
    fn run(&self, plan: &UnitPlan, sink: &mut dyn ReportSink) -> Result<UnitStatus, EngineError> {
        let unit = plan.unit();
        let uri = unit.uri();
        let content = fs::read_to_string(unit.path())?;

        sink.source(&uri)?;

        let mut verdict = UnitStatus::Passed;
        let mut started = false;
        let mut open_case: Option<CaseMeta> = None;

        for (idx, raw) in content.lines().enumerate() {
            let line_no = idx as u32 + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let parsed = match parse_line(line) {
                Ok(directive) => directive,
                Err(message) => {
                    // the notice belongs inside the unit's envelope even
                    // when the very first line is the broken one
                    if !started {
                        sink.unit_started(&UnitMeta::named(unit.name()))?;
                        started = true;
                    }
                    sink.malformed_input(&MalformedInput::new(&uri, line_no, message))?;
                    verdict = UnitStatus::Failed;
                    break;
                }
            };

            if !started && !matches!(parsed, Directive::Unit(_)) {
                sink.unit_started(&UnitMeta::named(unit.name()))?;
                started = true;
            }

            match parsed {
                Directive::Unit(name) => {
                    if started {
                        sink.malformed_input(&MalformedInput::new(
                            &uri,
                            line_no,
                            "unit declared after content started",
                        ))?;
                        verdict = UnitStatus::Failed;
                        break;
                    }
                    sink.unit_started(&UnitMeta::named(name))?;
                    started = true;
                }
                Directive::Case(name) => {
                    if let Some(case) = open_case.take() {
                        sink.case_finished(&case)?;
                    }
                    let case = CaseMeta::named(name).at_line(line_no);
                    sink.case_started(&case)?;
                    open_case = Some(case);
                }
                Directive::Step(kind, text) => {
                    if open_case.is_none() {
                        sink.malformed_input(&MalformedInput::new(
                            &uri,
                            line_no,
                            "step outside a case",
                        ))?;
                        verdict = UnitStatus::Failed;
                        break;
                    }
                    let keyword = match kind {
                        StepKind::Run => "step",
                        StepKind::Fail => "fail",
                        StepKind::Skip => "skip",
                    };
                    sink.step(&StepMeta::new(keyword, text).at_line(line_no))?;
                    sink.step_matched(&StepMatch::at(format!("{uri}:{line_no}")))?;
                    let result = if plan.is_dry_run() {
                        StepResult::skipped()
                    } else {
                        match kind {
                            StepKind::Run => StepResult::passed(0),
                            StepKind::Fail => {
                                verdict = UnitStatus::Failed;
                                StepResult::failed(0, format!("forced failure: {text}"))
                            }
                            StepKind::Skip => StepResult::skipped(),
                        }
                    };
                    sink.step_result(&result)?;
                }
                Directive::Note(text) => {
                    sink.text(text)?;
                }
                Directive::Attach { media, body } => {
                    sink.attachment(media, body.as_bytes())?;
                }
            }
        }

        if !started {
            sink.unit_started(&UnitMeta::named(unit.name()))?;
        }
        if let Some(case) = open_case.take() {
            sink.case_finished(&case)?;
        }
        sink.unit_finished()?;

        Ok(verdict)
    }
}
