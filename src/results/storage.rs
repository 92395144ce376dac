//! Run record storage
//!
//! Persists one JSON summary per run and retrieves them for the
//! `results` subcommand. Only outcomes are stored; recorded command
//! logs never leave memory.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::RunOutcome;

/// Stored summary of one run.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunRecord {
    /// Unique run ID
    pub id: String,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished
    pub finished_at: DateTime<Utc>,

    /// Worker pool size used
    pub workers: usize,

    /// Global deadline in seconds
    pub deadline_secs: u64,

    /// Whether steps were skipped instead of executed
    pub dry_run: bool,

    /// Environment info
    pub environment: EnvironmentInfo,

    /// The aggregated outcome
    pub outcome: RunOutcome,
}

/// Environment information captured with each record.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub os: String,
    pub arch: String,
    pub tool_version: String,
}

impl Default for EnvironmentInfo {
    fn default() -> Self {
        Self {
            os: std::env::consts::OS.to_string(),
            arch: std::env::consts::ARCH.to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

impl RunRecord {
    pub fn new(started_at: DateTime<Utc>, outcome: RunOutcome) -> Self {
        Self {
            id: generate_run_id(),
            started_at,
            finished_at: Utc::now(),
            workers: 0,
            deadline_secs: 0,
            dry_run: false,
            environment: EnvironmentInfo::default(),
            outcome,
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_deadline_secs(mut self, deadline_secs: u64) -> Self {
        self.deadline_secs = deadline_secs;
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// One-line listing entry.
    pub fn brief(&self) -> String {
        format!(
            "{}  {}  {}/{} passed{}",
            self.id,
            self.started_at.format("%Y-%m-%d %H:%M:%S"),
            self.outcome.passed(),
            self.outcome.total(),
            if self.outcome.success() { "" } else { "  FAILED" }
        )
    }
}

/// Generate unique run ID
fn generate_run_id() -> String {
    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let random: u32 = rand::random::<u32>() % 10000;
    format!("{timestamp}_{random:04}")
}

/// Run record storage manager.
pub struct RunStore {
    base_dir: PathBuf,
}

impl RunStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Store under the platform data directory.
    pub fn default_dir() -> Self {
        let base_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("featrun")
            .join("runs");
        Self::new(base_dir)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn run_path(&self, run_id: &str) -> PathBuf {
        self.base_dir.join(format!("{run_id}.json"))
    }

    /// Save a run record, creating the store directory if needed.
    pub fn save(&self, record: &RunRecord) -> Result<PathBuf> {
        fs::create_dir_all(&self.base_dir).context("Failed to create results directory")?;

        let path = self.run_path(&record.id);
        let file = File::create(&path).context("Failed to create results file")?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, record).context("Failed to write results")?;
        writer.flush().context("Failed to flush results")?;

        info!("Saved run record to {}", path.display());
        Ok(path)
    }

    /// Load one record by ID.
    pub fn load(&self, run_id: &str) -> Result<RunRecord> {
        self.load_from_path(&self.run_path(run_id))
    }

    fn load_from_path(&self, path: &Path) -> Result<RunRecord> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open results file {}", path.display()))?;
        let record: RunRecord =
            serde_json::from_reader(BufReader::new(file)).context("Failed to parse results")?;
        debug!("Loaded run record from {}", path.display());
        Ok(record)
    }

    /// All stored records, newest first.
    pub fn list(&self) -> Result<Vec<RunRecord>> {
        if !self.base_dir.exists() {
            return Ok(Vec::new());
        }

        let mut records = Vec::new();
        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                match self.load_from_path(&path) {
                    Ok(record) => records.push(record),
                    Err(e) => {
                        debug!("Skipping {}: {}", path.display(), e);
                    }
                }
            }
        }

        records.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        Ok(records)
    }

    /// Most recent record, if any.
    pub fn latest(&self) -> Result<Option<RunRecord>> {
        Ok(self.list()?.into_iter().next())
    }

    /// Delete one record by ID.
    pub fn delete(&self, run_id: &str) -> Result<()> {
        let path = self.run_path(run_id);
        if path.exists() {
            fs::remove_file(&path)?;
            info!("Deleted run record {}", run_id);
        }
        Ok(())
    }

    /// Export a record to CSV, one row per unit.
    pub fn export_csv(&self, record: &RunRecord, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record(["run_id", "unit", "status", "duration_ms"])?;
        for unit in &record.outcome.units {
            writer.write_record([
                record.id.clone(),
                unit.unit.clone(),
                unit.status.to_string(),
                unit.duration_ms.to_string(),
            ])?;
        }
        writer.flush()?;

        info!("Exported run record to {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{UnitOutcome, UnitStatus};
    use tempfile::TempDir;

    fn sample_record() -> RunRecord {
        let mut outcome = RunOutcome::new();
        outcome
            .units
            .push(UnitOutcome::new("a.outline", UnitStatus::Passed, 12));
        outcome
            .units
            .push(UnitOutcome::new("b.outline", UnitStatus::Failed, 30));
        RunRecord::new(Utc::now(), outcome)
            .with_workers(2)
            .with_deadline_secs(900)
    }

    #[test]
    fn test_generate_run_id() {
        let id1 = generate_run_id();
        let id2 = generate_run_id();
        assert!(!id1.is_empty());
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let record = sample_record();

        let path = store.save(&record).unwrap();
        assert!(path.exists());

        let loaded = store.load(&record.id).unwrap();
        assert_eq!(loaded.id, record.id);
        assert_eq!(loaded.workers, 2);
        assert_eq!(loaded.deadline_secs, 900);
        assert_eq!(loaded.outcome.total(), 2);
        assert_eq!(loaded.outcome.failed(), 1);
    }

    #[test]
    fn test_list_is_newest_first() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());

        let mut old = sample_record();
        old.id = "older".to_string();
        old.started_at = Utc::now() - chrono::Duration::hours(1);
        let mut new = sample_record();
        new.id = "newer".to_string();

        store.save(&old).unwrap();
        store.save(&new).unwrap();

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, "newer");
        assert_eq!(listed[1].id, "older");

        let latest = store.latest().unwrap().unwrap();
        assert_eq!(latest.id, "newer");
    }

    #[test]
    fn test_empty_store_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path().join("missing"));
        assert!(store.list().unwrap().is_empty());
        assert!(store.latest().unwrap().is_none());
    }

    #[test]
    fn test_delete() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let record = sample_record();
        store.save(&record).unwrap();

        store.delete(&record.id).unwrap();
        assert!(store.list().unwrap().is_empty());
    }

    #[test]
    fn test_csv_export() {
        let dir = TempDir::new().unwrap();
        let store = RunStore::new(dir.path());
        let record = sample_record();

        let csv_path = dir.path().join("export.csv");
        store.export_csv(&record, &csv_path).unwrap();

        let content = std::fs::read_to_string(&csv_path).unwrap();
        let mut lines = content.lines();
        assert_eq!(lines.next().unwrap(), "run_id,unit,status,duration_ms");
        assert!(content.contains("a.outline,passed,12"));
        assert!(content.contains("b.outline,failed,30"));
    }

    #[test]
    fn test_brief_flags_failures() {
        let record = sample_record();
        let brief = record.brief();
        assert!(brief.contains("1/2 passed"));
        assert!(brief.contains("FAILED"));
    }
}
