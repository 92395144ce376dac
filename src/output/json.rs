//! JSON report consumer
//!
//! Accumulates the whole replayed stream into a single document and
//! writes it when the stream closes. Because replay hands it one unit
//! at a time, appending to the most recent unit and case is always
//! correct.

use crate::consumer::Consumer;
use crate::models::{
    CaseMeta, HookPhase, MalformedInput, StepDefinition, StepMatch, StepMeta, StepResult, UnitMeta,
};
use crate::sink::{
    DiagnosticsSink, LifecycleSink, OutputSink, ResultSink, SinkError, StepDefinitionSink,
    StructureSink,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::info;

#[derive(Serialize)]
struct ReportDoc {
    tool: String,
    version: String,
    generated_at: Option<DateTime<Utc>>,
    units: Vec<UnitEntry>,
    step_definitions: Vec<DefinitionEntry>,
    diagnostics: Vec<NoticeEntry>,
}

#[derive(Serialize)]
struct UnitEntry {
    uri: Option<String>,
    name: String,
    description: Option<String>,
    tags: Vec<String>,
    cases: Vec<CaseEntry>,
    output: Vec<String>,
    attachments: Vec<AttachmentEntry>,
}

#[derive(Serialize)]
struct CaseEntry {
    name: String,
    line: u32,
    tags: Vec<String>,
    steps: Vec<StepEntry>,
    hooks: Vec<HookEntry>,
    output: Vec<String>,
    attachments: Vec<AttachmentEntry>,
}

#[derive(Serialize)]
struct StepEntry {
    keyword: String,
    text: String,
    line: u32,
    match_location: Option<String>,
    result: Option<StepResult>,
}

#[derive(Serialize)]
struct HookEntry {
    phase: HookPhase,
    result: StepResult,
}

#[derive(Serialize)]
struct AttachmentEntry {
    media_type: String,
    data: String,
}

#[derive(Serialize)]
struct DefinitionEntry {
    pattern: String,
    location: String,
}

#[derive(Serialize)]
struct NoticeEntry {
    uri: String,
    line: Option<u32>,
    message: String,
}

/// Machine-readable report of the full stream, written on close.
pub struct JsonReport {
    path: PathBuf,
    pending_uri: Option<String>,
    doc: ReportDoc,
}

impl JsonReport {
    pub fn to_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            pending_uri: None,
            doc: ReportDoc {
                tool: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                generated_at: None,
                units: Vec::new(),
                step_definitions: Vec::new(),
                diagnostics: Vec::new(),
            },
        }
    }

    fn current_unit(&mut self) -> &mut UnitEntry {
        if self.doc.units.is_empty() {
            // stream opened without unit_started; keep the data anyway
            let uri = self.pending_uri.take();
            self.doc.units.push(UnitEntry {
                uri,
                name: String::new(),
                description: None,
                tags: Vec::new(),
                cases: Vec::new(),
                output: Vec::new(),
                attachments: Vec::new(),
            });
        }
        self.doc.units.last_mut().expect("unit entry")
    }

    fn write_out(&mut self) -> Result<(), SinkError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &self.doc)?;
        // small documents are still entirely in the buffer at this point
        writer.flush()?;
        info!("wrote JSON report to {}", self.path.display());
        Ok(())
    }
}

impl StructureSink for JsonReport {
    fn source(&mut self, uri: &str) -> Result<(), SinkError> {
        self.pending_uri = Some(uri.to_string());
        Ok(())
    }

    fn unit_started(&mut self, unit: &UnitMeta) -> Result<(), SinkError> {
        let uri = self.pending_uri.take();
        self.doc.units.push(UnitEntry {
            uri,
            name: unit.name.clone(),
            description: unit.description.clone(),
            tags: unit.tags.clone(),
            cases: Vec::new(),
            output: Vec::new(),
            attachments: Vec::new(),
        });
        Ok(())
    }

    fn case_started(&mut self, case: &CaseMeta) -> Result<(), SinkError> {
        self.current_unit().cases.push(CaseEntry {
            name: case.name.clone(),
            line: case.line,
            tags: case.tags.clone(),
            steps: Vec::new(),
            hooks: Vec::new(),
            output: Vec::new(),
            attachments: Vec::new(),
        });
        Ok(())
    }

    fn step(&mut self, step: &StepMeta) -> Result<(), SinkError> {
        if let Some(case) = self.current_unit().cases.last_mut() {
            case.steps.push(StepEntry {
                keyword: step.keyword.clone(),
                text: step.text.clone(),
                line: step.line,
                match_location: None,
                result: None,
            });
        }
        Ok(())
    }

    fn case_finished(&mut self, _case: &CaseMeta) -> Result<(), SinkError> {
        Ok(())
    }

    fn unit_finished(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

impl ResultSink for JsonReport {
    fn step_matched(&mut self, matched: &StepMatch) -> Result<(), SinkError> {
        if let Some(step) = self
            .current_unit()
            .cases
            .last_mut()
            .and_then(|c| c.steps.last_mut())
        {
            step.match_location = matched.location.clone();
        }
        Ok(())
    }

    fn step_result(&mut self, result: &StepResult) -> Result<(), SinkError> {
        if let Some(step) = self
            .current_unit()
            .cases
            .last_mut()
            .and_then(|c| c.steps.iter_mut().rev().find(|s| s.result.is_none()))
        {
            step.result = Some(result.clone());
        }
        Ok(())
    }

    fn hook_result(&mut self, phase: HookPhase, result: &StepResult) -> Result<(), SinkError> {
        if let Some(case) = self.current_unit().cases.last_mut() {
            case.hooks.push(HookEntry {
                phase,
                result: result.clone(),
            });
        }
        Ok(())
    }
}

impl OutputSink for JsonReport {
    fn text(&mut self, text: &str) -> Result<(), SinkError> {
        let unit = self.current_unit();
        match unit.cases.last_mut() {
            Some(case) => case.output.push(text.to_string()),
            None => unit.output.push(text.to_string()),
        }
        Ok(())
    }

    fn attachment(&mut self, media_type: &str, bytes: &[u8]) -> Result<(), SinkError> {
        let entry = AttachmentEntry {
            media_type: media_type.to_string(),
            data: BASE64.encode(bytes),
        };
        let unit = self.current_unit();
        match unit.cases.last_mut() {
            Some(case) => case.attachments.push(entry),
            None => unit.attachments.push(entry),
        }
        Ok(())
    }
}

impl StepDefinitionSink for JsonReport {
    fn step_definition(&mut self, definition: &StepDefinition) -> Result<(), SinkError> {
        self.doc.step_definitions.push(DefinitionEntry {
            pattern: definition.pattern.clone(),
            location: definition.location.clone(),
        });
        Ok(())
    }
}

impl DiagnosticsSink for JsonReport {
    fn malformed_input(&mut self, notice: &MalformedInput) -> Result<(), SinkError> {
        self.doc.diagnostics.push(NoticeEntry {
            uri: notice.uri.clone(),
            line: notice.line,
            message: notice.message.clone(),
        });
        Ok(())
    }
}

impl LifecycleSink for JsonReport {
    fn stream_done(&mut self) -> Result<(), SinkError> {
        self.doc.generated_at = Some(Utc::now());
        Ok(())
    }

    fn stream_close(&mut self) -> Result<(), SinkError> {
        self.write_out()
    }
}

impl Consumer for JsonReport {
    fn name(&self) -> &'static str {
        "json"
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

    fn step_definitions(&mut self) -> Option<&mut dyn StepDefinitionSink> {
        Some(self)
    }

    fn diagnostics(&mut self) -> Option<&mut dyn DiagnosticsSink> {
        Some(self)
    }

    fn lifecycle(&mut self) -> Option<&mut dyn LifecycleSink> {
        Some(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use tempfile::TempDir;

    fn drive_one_unit(report: &mut JsonReport) {
        report.source("features/checkout.outline").unwrap();
        report
            .unit_started(&UnitMeta::named("Checkout").with_tag("smoke"))
            .unwrap();
        report
            .case_started(&CaseMeta::named("happy path").at_line(2))
            .unwrap();
        report
            .step(&StepMeta::new("step", "add an item").at_line(3))
            .unwrap();
        report
            .step_matched(&StepMatch::at("features/checkout.outline:3"))
            .unwrap();
        report.step_result(&StepResult::passed(5)).unwrap();
        report
            .hook_result(HookPhase::After, &StepResult::passed(1))
            .unwrap();
        report.text("a case note").unwrap();
        report.attachment("text/plain", b"hello").unwrap();
        report
            .case_finished(&CaseMeta::named("happy path").at_line(2))
            .unwrap();
        report.unit_finished().unwrap();
    }

    fn read_doc(path: &std::path::Path) -> Value {
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
    }

    #[test]
    fn test_document_written_on_close() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = JsonReport::to_path(&path);

        drive_one_unit(&mut report);
        report
            .step_definition(&StepDefinition::new("^add an item$", "steps.rs:4"))
            .unwrap();
        report.stream_done().unwrap();
        assert!(!path.exists(), "nothing may be written before close");
        report.stream_close().unwrap();

        let doc = read_doc(&path);
        assert_eq!(doc["tool"], "featrun");
        assert!(doc["generated_at"].is_string());

        let unit = &doc["units"][0];
        assert_eq!(unit["uri"], "features/checkout.outline");
        assert_eq!(unit["name"], "Checkout");
        assert_eq!(unit["tags"][0], "smoke");

        let case = &unit["cases"][0];
        assert_eq!(case["name"], "happy path");
        assert_eq!(case["line"], 2);
        assert_eq!(case["output"][0], "a case note");

        let step = &case["steps"][0];
        assert_eq!(step["text"], "add an item");
        assert_eq!(step["match_location"], "features/checkout.outline:3");
        assert_eq!(step["result"]["status"], "passed");
        assert_eq!(step["result"]["duration_ms"], 5);

        assert_eq!(case["hooks"][0]["phase"], "after");
        assert_eq!(doc["step_definitions"][0]["pattern"], "^add an item$");
    }

    #[test]
    fn test_attachment_is_base64() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = JsonReport::to_path(&path);
        drive_one_unit(&mut report);
        report.stream_close().unwrap();

        let doc = read_doc(&path);
        let attachment = &doc["units"][0]["cases"][0]["attachments"][0];
        assert_eq!(attachment["media_type"], "text/plain");
        assert_eq!(
            BASE64.decode(attachment["data"].as_str().unwrap()).unwrap(),
            b"hello"
        );
    }

    #[test]
    fn test_attachment_before_any_case_lands_on_the_unit() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = JsonReport::to_path(&path);

        report.source("features/loose.outline").unwrap();
        report.unit_started(&UnitMeta::named("Loose")).unwrap();
        report.attachment("text/plain", b"early").unwrap();
        report.unit_finished().unwrap();
        report.stream_close().unwrap();

        let doc = read_doc(&path);
        let attachment = &doc["units"][0]["attachments"][0];
        assert_eq!(attachment["media_type"], "text/plain");
        assert_eq!(
            BASE64.decode(attachment["data"].as_str().unwrap()).unwrap(),
            b"early"
        );
    }

    #[test]
    fn test_two_units_form_two_entries() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = JsonReport::to_path(&path);

        drive_one_unit(&mut report);
        report.source("features/refunds.outline").unwrap();
        report.unit_started(&UnitMeta::named("Refunds")).unwrap();
        report.unit_finished().unwrap();
        report.stream_close().unwrap();

        let doc = read_doc(&path);
        assert_eq!(doc["units"].as_array().unwrap().len(), 2);
        assert_eq!(doc["units"][1]["uri"], "features/refunds.outline");
        assert_eq!(doc["units"][1]["name"], "Refunds");
    }

    #[test]
    fn test_diagnostics_are_collected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("report.json");
        let mut report = JsonReport::to_path(&path);
        report
            .malformed_input(&MalformedInput::new("x.outline", 7, "bad directive"))
            .unwrap();
        report.stream_close().unwrap();

        let doc = read_doc(&path);
        assert_eq!(doc["diagnostics"][0]["uri"], "x.outline");
        assert_eq!(doc["diagnostics"][0]["line"], 7);
    }

    #[test]
    fn test_unwritable_path_surfaces_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"i am a file").unwrap();

        let mut report = JsonReport::to_path(blocker.join("report.json"));
        let err = report.stream_close().unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }

    // creating /dev/full succeeds; the failure only shows up when the
    // buffered document is flushed to the device
    #[cfg(target_os = "linux")]
    #[test]
    fn test_write_failure_surfaces_on_close() {
        let mut report = JsonReport::to_path("/dev/full");
        drive_one_unit(&mut report);
        let err = report.stream_close().unwrap_err();
        assert!(matches!(err, SinkError::Io(_)));
    }
}
