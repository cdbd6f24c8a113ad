//! Append-only session audit trail. One directory per run holding
//! `session.json` plus screenshot blobs; the record is rewritten after every
//! append so an abrupt termination still leaves a valid partial session on
//! disk. Old sessions are pruned to a fixed count as a disk-space bound.

use chrono::{DateTime, Utc};
use formic_common::protocol::JobTarget;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::resolve::{ResolvedValue, RiskLevel, SourceTier};

pub const DEFAULT_RETENTION: usize = 10;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("audit serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    InProgress,
    Success,
    Skipped,
    Failed,
    Aborted,
}

impl AttemptStatus {
    fn key(self) -> &'static str {
        match self {
            AttemptStatus::InProgress => "in_progress",
            AttemptStatus::Success => "success",
            AttemptStatus::Skipped => "skipped",
            AttemptStatus::Failed => "failed",
            AttemptStatus::Aborted => "aborted",
        }
    }
}

/// Compact view of a resolution for event snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedSummary {
    pub label: String,
    pub value: Option<String>,
    pub source_tier: SourceTier,
    pub risk_level: RiskLevel,
}

impl From<&ResolvedValue> for ResolvedSummary {
    fn from(r: &ResolvedValue) -> Self {
        Self {
            label: r.field.label_text.clone(),
            value: r.value.clone(),
            source_tier: r.source_tier,
            risk_level: r.risk_level,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEvent {
    pub state: String,
    pub timestamp: DateTime<Utc>,
    pub resolved: Vec<ResolvedSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub screenshot: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotRef {
    pub name: String,
    pub path: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobAttempt {
    pub job: JobTarget,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub status: AttemptStatus,
    pub resolved_values: Vec<ResolvedValue>,
    pub screenshots: Vec<ScreenshotRef>,
    pub events: Vec<AuditEvent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    pub attempts: Vec<JobAttempt>,
    pub summary: BTreeMap<String, usize>,
}

pub struct SessionAuditor {
    session_dir: PathBuf,
    record: SessionRecord,
}

impl SessionAuditor {
    /// Prune old sessions, create this run's directory and write the empty
    /// record. Pruning failure is logged and ignored; the session itself
    /// must be writable.
    pub fn new(logs_dir: &Path, retention: usize) -> Result<Self, AuditError> {
        std::fs::create_dir_all(logs_dir)?;
        prune_old_sessions(logs_dir, retention);

        let started_at = Utc::now();
        let base_id = started_at.format("%Y%m%d_%H%M%S").to_string();
        let (session_id, session_dir) = unique_session_dir(logs_dir, &base_id);
        std::fs::create_dir_all(&session_dir)?;

        let mut auditor = Self {
            session_dir,
            record: SessionRecord {
                session_id,
                started_at,
                ended_at: None,
                attempts: Vec::new(),
                summary: BTreeMap::new(),
            },
        };
        auditor.flush()?;
        Ok(auditor)
    }

    pub fn session_dir(&self) -> &Path {
        &self.session_dir
    }

    pub fn begin_attempt(&mut self, job: &JobTarget) {
        self.record.attempts.push(JobAttempt {
            job: job.clone(),
            started_at: Utc::now(),
            ended_at: None,
            status: AttemptStatus::InProgress,
            resolved_values: Vec::new(),
            screenshots: Vec::new(),
            events: Vec::new(),
            error: None,
        });
    }

    /// Record a state transition for the current attempt and flush.
    pub fn record_transition(
        &mut self,
        state: &str,
        resolved: &[ResolvedValue],
        screenshot: Option<String>,
        note: Option<String>,
    ) {
        if let Some(attempt) = self.record.attempts.last_mut() {
            attempt.events.push(AuditEvent {
                state: state.to_string(),
                timestamp: Utc::now(),
                resolved: resolved.iter().map(ResolvedSummary::from).collect(),
                screenshot,
                note,
            });
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "could not flush session record");
        }
    }

    /// Keep the full resolution snapshot on the attempt itself.
    pub fn set_resolved(&mut self, resolved: &[ResolvedValue]) {
        if let Some(attempt) = self.record.attempts.last_mut() {
            attempt.resolved_values = resolved.to_vec();
        }
    }

    /// Write screenshot bytes next to the record, returning the reference
    /// path. Failures are logged, never fatal.
    pub fn save_screenshot(&mut self, name: &str, bytes: &[u8]) -> Option<String> {
        let timestamp = Utc::now();
        let filename = format!("{}_{}.png", timestamp.format("%H%M%S"), name);
        let path = self.session_dir.join(&filename);
        if let Err(e) = std::fs::write(&path, bytes) {
            warn!(path = %path.display(), error = %e, "could not write screenshot");
            return None;
        }
        let path_str = path.display().to_string();
        if let Some(attempt) = self.record.attempts.last_mut() {
            attempt.screenshots.push(ScreenshotRef {
                name: name.to_string(),
                path: path_str.clone(),
                timestamp,
            });
        }
        Some(path_str)
    }

    pub fn finish_attempt(&mut self, status: AttemptStatus, error: Option<String>) {
        if let Some(attempt) = self.record.attempts.last_mut() {
            attempt.status = status;
            attempt.ended_at = Some(Utc::now());
            attempt.error = error;
        }
        if let Err(e) = self.flush() {
            warn!(error = %e, "could not flush session record");
        }
    }

    pub fn finalize(&mut self) -> Result<(), AuditError> {
        self.record.ended_at = Some(Utc::now());
        self.flush()
    }

    fn flush(&mut self) -> Result<(), AuditError> {
        self.record.summary = summarize(&self.record.attempts);
        let json = serde_json::to_string_pretty(&self.record)?;
        std::fs::write(self.session_dir.join("session.json"), json)?;
        Ok(())
    }

    /// Human-readable end-of-run report.
    pub fn report(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "\n=== Session {} ===\nLog directory: {}\n\n",
            self.record.session_id,
            self.session_dir.display()
        ));
        for (status, count) in &self.record.summary {
            out.push_str(&format!("  {status}: {count}\n"));
        }
        out.push('\n');
        for attempt in &self.record.attempts {
            let marker = match attempt.status {
                AttemptStatus::Success => "ok",
                AttemptStatus::Skipped => "skipped",
                AttemptStatus::Failed => "failed",
                AttemptStatus::Aborted => "aborted",
                AttemptStatus::InProgress => "incomplete",
            };
            out.push_str(&format!(
                "  [{marker}] {} - {} ({})\n",
                attempt.job.company, attempt.job.title, attempt.job.url
            ));
            if let Some(error) = &attempt.error {
                out.push_str(&format!("      error: {error}\n"));
            }
        }
        out
    }
}

fn summarize(attempts: &[JobAttempt]) -> BTreeMap<String, usize> {
    let mut summary = BTreeMap::new();
    for attempt in attempts {
        *summary.entry(attempt.status.key().to_string()).or_insert(0) += 1;
    }
    summary
}

/// Session directory names encode creation time; a zero-padded suffix keeps
/// runs within the same second distinct without breaking the name ordering
/// pruning relies on.
fn unique_session_dir(logs_dir: &Path, base_id: &str) -> (String, PathBuf) {
    let mut id = base_id.to_string();
    let mut counter = 1;
    loop {
        let dir = logs_dir.join(&id);
        if !dir.exists() {
            return (id, dir);
        }
        id = format!("{base_id}_{counter:02}");
        counter += 1;
    }
}

/// Delete oldest session directories until fewer than `retention` remain,
/// so the new session brings the total back to the cap.
fn prune_old_sessions(logs_dir: &Path, retention: usize) {
    let Ok(entries) = std::fs::read_dir(logs_dir) else {
        return;
    };
    let mut sessions: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_dir()
                && p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(|c: char| c.is_ascii_digit()))
        })
        .collect();
    sessions.sort();

    let keep = retention.saturating_sub(1);
    while sessions.len() > keep {
        let oldest = sessions.remove(0);
        if let Err(e) = std::fs::remove_dir_all(&oldest) {
            warn!(path = %oldest.display(), error = %e, "could not prune old session");
        }
    }
}
