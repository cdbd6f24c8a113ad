//! Per-job workflow: navigate → detect → extract → resolve → fill → rescan
//! → confirm → submit, as a closed state machine with an explicit transition
//! table. One instance per job target; the instance owns the shared browser
//! session until it reaches a terminal state, and every transition lands in
//! the audit trail.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use formic_common::protocol::{FormSnapshot, JobTarget};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ats::{self, Detection};
use crate::audit::{AttemptStatus, SessionAuditor};
use crate::backend::Backend;
use crate::confirm::{ConfirmationChannel, ConfirmationSummary, Decision};
use crate::extract::{self, FieldCandidate};
use crate::resolve::{FieldResolver, ResolvedValue, RiskLevel};
use crate::store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Navigating,
    Detecting,
    Extracting,
    Resolving,
    Filling,
    Rescanning,
    AwaitingConfirmation,
    Submitting,
    Succeeded,
    Skipped,
    Failed,
    Aborted,
}

impl JobState {
    pub fn as_str(self) -> &'static str {
        match self {
            JobState::Navigating => "navigating",
            JobState::Detecting => "detecting",
            JobState::Extracting => "extracting",
            JobState::Resolving => "resolving",
            JobState::Filling => "filling",
            JobState::Rescanning => "rescanning",
            JobState::AwaitingConfirmation => "awaiting_confirmation",
            JobState::Submitting => "submitting",
            JobState::Succeeded => "succeeded",
            JobState::Skipped => "skipped",
            JobState::Failed => "failed",
            JobState::Aborted => "aborted",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Skipped | JobState::Failed | JobState::Aborted
        )
    }

    /// The allowed-transition table. Terminal states accept nothing; an
    /// operator abort is legal from any live state.
    pub fn can_transition(self, next: JobState) -> bool {
        if self.is_terminal() {
            return false;
        }
        if next == JobState::Aborted {
            return true;
        }
        matches!(
            (self, next),
            (JobState::Navigating, JobState::Detecting)
                | (JobState::Navigating, JobState::Failed)
                | (JobState::Detecting, JobState::Extracting)
                | (JobState::Detecting, JobState::Failed)
                | (JobState::Extracting, JobState::Resolving)
                | (JobState::Extracting, JobState::Failed)
                | (JobState::Resolving, JobState::Filling)
                | (JobState::Filling, JobState::Rescanning)
                | (JobState::Filling, JobState::Failed)
                | (JobState::Rescanning, JobState::AwaitingConfirmation)
                | (JobState::Rescanning, JobState::Failed)
                | (JobState::AwaitingConfirmation, JobState::Submitting)
                | (JobState::AwaitingConfirmation, JobState::Skipped)
                | (JobState::AwaitingConfirmation, JobState::Failed)
                | (JobState::Submitting, JobState::Succeeded)
                | (JobState::Submitting, JobState::Failed)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    Timeout,
    UnreviewedHighRisk,
    NoPostSubmitTransition,
    SubmitControlNotFound,
    Backend(String),
}

impl FailureReason {
    fn describe(&self) -> String {
        match self {
            FailureReason::Timeout => "timeout".to_string(),
            FailureReason::UnreviewedHighRisk => "unreviewed_high_risk".to_string(),
            FailureReason::NoPostSubmitTransition => "no_post_submit_transition".to_string(),
            FailureReason::SubmitControlNotFound => "submit_control_not_found".to_string(),
            FailureReason::Backend(msg) => format!("backend: {msg}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbortReason {
    /// Unrecoverable layout: nothing extractable after both passes.
    Structural(String),
    /// Verification puzzle or equivalent; no further automated interaction.
    BlockingChallenge,
    /// Operator-issued abort signal.
    Operator,
}

impl AbortReason {
    fn describe(&self) -> String {
        match self {
            AbortReason::Structural(msg) => format!("structural: {msg}"),
            AbortReason::BlockingChallenge => "blocking_challenge".to_string(),
            AbortReason::Operator => "operator_abort".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Succeeded,
    Skipped(String),
    Failed(FailureReason),
    Aborted(AbortReason),
}

impl JobOutcome {
    pub fn status(&self) -> AttemptStatus {
        match self {
            JobOutcome::Succeeded => AttemptStatus::Success,
            JobOutcome::Skipped(_) => AttemptStatus::Skipped,
            JobOutcome::Failed(_) => AttemptStatus::Failed,
            JobOutcome::Aborted(_) => AttemptStatus::Aborted,
        }
    }

    fn terminal_state(&self) -> JobState {
        match self {
            JobOutcome::Succeeded => JobState::Succeeded,
            JobOutcome::Skipped(_) => JobState::Skipped,
            JobOutcome::Failed(_) => JobState::Failed,
            JobOutcome::Aborted(_) => JobState::Aborted,
        }
    }

    pub fn describe(&self) -> Option<String> {
        match self {
            JobOutcome::Succeeded => None,
            JobOutcome::Skipped(reason) => Some(reason.clone()),
            JobOutcome::Failed(reason) => Some(reason.describe()),
            JobOutcome::Aborted(reason) => Some(reason.describe()),
        }
    }

    /// A blocking challenge poisons the page; the run should notify and
    /// move on without touching it again.
    pub fn is_blocking_challenge(&self) -> bool {
        matches!(self, JobOutcome::Aborted(AbortReason::BlockingChallenge))
    }

    pub fn is_operator_abort(&self) -> bool {
        matches!(self, JobOutcome::Aborted(AbortReason::Operator))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmMode {
    /// Block on the confirmation channel for an explicit decision.
    Prompt,
    /// Hand over to the operator's browser; a page transition they initiate
    /// counts as confirmation and submission in one.
    WatchBrowser,
    /// No human in the loop; the high-risk guard decides deterministically.
    AutoProceed,
}

#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    pub confirm_mode: ConfirmMode,
    /// Prompt mode: how long to wait for a decision. `None` blocks forever.
    pub confirm_timeout: Option<Duration>,
    /// Watch mode: how long to watch for the operator's submission.
    pub watch_timeout: Duration,
    /// Settle time after navigation and after apply-button clicks.
    pub settle_delay: Duration,
    /// Pause before the rescan pass so revealed controls can render.
    pub rescan_delay: Duration,
    /// How long to poll for a page change after dispatching submit.
    pub submit_wait: Duration,
    /// Below this many candidates the page is assumed to still be a posting
    /// page and an apply control is searched for.
    pub min_fields: usize,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            confirm_mode: ConfirmMode::Prompt,
            confirm_timeout: None,
            watch_timeout: Duration::from_secs(300),
            settle_delay: Duration::from_secs(2),
            rescan_delay: Duration::from_secs(1),
            submit_wait: Duration::from_secs(20),
            min_fields: 3,
        }
    }
}

// Apply/submit discovery lists, selector-first then visible-text scan.
const APPLY_SELECTORS: &[&str] = &[
    "#grnhse_app a",
    "a[href*='boards.greenhouse.io']",
    "a[href*='grnh.se']",
    ".postings-btn",
    "a[data-job-id]",
    ".job-application-button",
    ".application-button",
    "button[data-qa='apply-button']",
    "a[data-qa='apply-button']",
    "[data-testid='apply-button']",
    ".apply-button",
    "#apply-button",
    "#apply",
];

const APPLY_TEXTS: &[&str] = &[
    "apply now",
    "apply for this job",
    "apply for this position",
    "start application",
    "apply",
];

const SUBMIT_SELECTORS: &[&str] = &[
    "#submit_app",
    "#submit-app",
    "button[type='submit']",
    "input[type='submit']",
    ".submit-button",
    "[data-qa='submit-button']",
    "[data-testid='submit-button']",
];

const SUBMIT_TEXTS: &[&str] = &[
    "submit application",
    "send application",
    "complete application",
    "submit",
];

const URL_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Which slice of the resolved values a fill pass writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FillSet {
    All,
    NormalOnly,
    HighRiskOnly,
}

pub struct JobWorkflow<'a> {
    backend: &'a mut dyn Backend,
    store: &'a mut ProfileStore,
    resolver: &'a FieldResolver,
    auditor: &'a mut SessionAuditor,
    confirm_channel: Option<&'a mut dyn ConfirmationChannel>,
    config: &'a WorkflowConfig,
    abort: Arc<AtomicBool>,
    state: JobState,
    resolved: Vec<ResolvedValue>,
    detection: Detection,
}

impl<'a> JobWorkflow<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        backend: &'a mut dyn Backend,
        store: &'a mut ProfileStore,
        resolver: &'a FieldResolver,
        auditor: &'a mut SessionAuditor,
        confirm_channel: Option<&'a mut dyn ConfirmationChannel>,
        config: &'a WorkflowConfig,
        abort: Arc<AtomicBool>,
    ) -> Self {
        Self {
            backend,
            store,
            resolver,
            auditor,
            confirm_channel,
            config,
            abort,
            state: JobState::Navigating,
            resolved: Vec::new(),
            detection: Detection::generic(),
        }
    }

    /// Drive one job to a terminal state. Never panics on backend trouble;
    /// every path ends in exactly one terminal state, audited.
    pub async fn run(&mut self, job: &JobTarget) -> JobOutcome {
        self.auditor.begin_attempt(job);
        self.auditor
            .record_transition(self.state.as_str(), &[], None, Some(job.url.clone()));

        let outcome = self.drive(job).await;

        let terminal = outcome.terminal_state();
        // The table guarantees this is legal from any live state.
        if !self.state.is_terminal() {
            self.state = terminal;
        }
        self.auditor.set_resolved(&self.resolved);
        self.auditor.record_transition(
            terminal.as_str(),
            &self.resolved,
            None,
            outcome.describe(),
        );
        self.auditor
            .finish_attempt(outcome.status(), outcome.describe());
        outcome
    }

    async fn drive(&mut self, job: &JobTarget) -> JobOutcome {
        // ---- Navigating ----
        if let Err(outcome) = self.navigate_with_retry(&job.url).await {
            return outcome;
        }
        tokio::time::sleep(self.config.settle_delay).await;

        // ---- Detecting ----
        if let Err(o) = self.transition(JobState::Detecting, None) {
            return o;
        }
        let snapshot = match self.backend.snapshot().await {
            Ok(s) => s,
            Err(e) => return JobOutcome::Failed(FailureReason::Backend(e.to_string())),
        };
        if snapshot.markers.challenge {
            return JobOutcome::Aborted(AbortReason::BlockingChallenge);
        }
        self.detection = ats::detect(&snapshot.page.url, &snapshot.markers, job.source.as_deref());
        info!(
            platform = ?self.detection.platform,
            confidence = self.detection.confidence,
            "platform detected"
        );

        // ---- Extracting ----
        if let Err(o) = self.transition(
            JobState::Extracting,
            Some(format!("platform: {:?}", self.detection.platform)),
        ) {
            return o;
        }
        let candidates = match self.extract_with_apply_fallback(snapshot).await {
            Ok(c) => c,
            Err(outcome) => return outcome,
        };
        if candidates.is_empty() {
            return JobOutcome::Aborted(AbortReason::Structural(
                "zero fields extracted after both passes".into(),
            ));
        }

        // ---- Resolving ----
        if let Err(o) = self.transition(
            JobState::Resolving,
            Some(format!("{} candidates", candidates.len())),
        ) {
            return o;
        }
        self.resolved = self
            .resolver
            .resolve_all(&candidates, self.store, job)
            .await;

        // ---- Filling ----
        if let Err(o) = self.transition(JobState::Filling, None) {
            return o;
        }
        let fill_set = if self.config.confirm_mode == ConfirmMode::AutoProceed {
            FillSet::All
        } else {
            FillSet::NormalOnly
        };
        let filled = self.apply_values(0, fill_set).await;
        let fill_shot = self.capture("after_fill").await;
        self.auditor.record_transition(
            self.state.as_str(),
            &self.resolved,
            fill_shot,
            Some(format!("{filled} values applied")),
        );

        // ---- Rescanning ----
        if let Err(o) = self.transition(JobState::Rescanning, None) {
            return o;
        }
        tokio::time::sleep(self.config.rescan_delay).await;
        let before_rescan = self.resolved.len();
        if let Err(outcome) = self.rescan(job, &candidates, fill_set).await {
            return outcome;
        }
        let revealed = self.resolved.len() - before_rescan;
        if revealed > 0 {
            info!(revealed, "rescan revealed additional fields");
        }

        // ---- AwaitingConfirmation ----
        if let Err(o) = self.transition(JobState::AwaitingConfirmation, None) {
            return o;
        }
        let summary = ConfirmationSummary::build(job, &self.resolved);
        let pre_submit_shot = self.capture("pre_submit").await;
        self.auditor.record_transition(
            self.state.as_str(),
            &self.resolved,
            pre_submit_shot,
            None,
        );

        match self.config.confirm_mode {
            ConfirmMode::AutoProceed => {
                // Auto-proceed never bypasses this guard.
                let unreviewed = self
                    .resolved
                    .iter()
                    .any(|r| r.risk_level == RiskLevel::High && !r.is_resolved());
                if unreviewed {
                    return JobOutcome::Failed(FailureReason::UnreviewedHighRisk);
                }
            }
            ConfirmMode::Prompt => {
                match self.prompt_decision(&summary).await {
                    Ok(Decision::Proceed) => {}
                    Ok(Decision::Decline) => {
                        return JobOutcome::Skipped("operator declined".into());
                    }
                    Err(outcome) => return outcome,
                }
                // Apply the values withheld for review.
                self.apply_values(0, FillSet::HighRiskOnly).await;
            }
            ConfirmMode::WatchBrowser => {
                // The operator reviews and submits in the browser; their
                // page transition is the confirmation signal.
                self.apply_values(0, FillSet::HighRiskOnly).await;
                return self.watch_for_operator_submit(job).await;
            }
        }

        // ---- Submitting ----
        if let Err(o) = self.transition(JobState::Submitting, None) {
            return o;
        }
        self.submit().await
    }

    fn transition(&mut self, next: JobState, note: Option<String>) -> Result<(), JobOutcome> {
        if self.abort.load(Ordering::SeqCst) {
            return Err(JobOutcome::Aborted(AbortReason::Operator));
        }
        debug_assert!(self.state.can_transition(next), "illegal transition");
        self.state = next;
        self.auditor
            .record_transition(next.as_str(), &self.resolved, None, note);
        Ok(())
    }

    async fn navigate_with_retry(&mut self, url: &str) -> Result<(), JobOutcome> {
        match self.backend.navigate(url).await {
            Ok(_) => Ok(()),
            Err(e) if e.is_transient() => {
                warn!(error = %e, "navigation failed, retrying once");
                tokio::time::sleep(self.config.settle_delay).await;
                match self.backend.navigate(url).await {
                    Ok(_) => Ok(()),
                    Err(_) => Err(JobOutcome::Failed(FailureReason::Timeout)),
                }
            }
            Err(e) => Err(JobOutcome::Failed(FailureReason::Backend(e.to_string()))),
        }
    }

    /// Initial extraction pass; when the page looks like a posting rather
    /// than a form, click through an apply control and re-snapshot. The
    /// second pass is also the structural-abort boundary.
    async fn extract_with_apply_fallback(
        &mut self,
        snapshot: FormSnapshot,
    ) -> Result<Vec<FieldCandidate>, JobOutcome> {
        let candidates = extract::extract(&snapshot, &self.detection);
        if candidates.len() >= self.config.min_fields {
            return Ok(candidates);
        }

        match self.backend.click_match(APPLY_SELECTORS, APPLY_TEXTS).await {
            Ok(true) => info!("clicked apply control"),
            Ok(false) => info!("no apply control found, re-scanning as-is"),
            Err(e) => warn!(error = %e, "apply-control search failed"),
        }
        tokio::time::sleep(self.config.settle_delay).await;

        let second = match self.backend.snapshot().await {
            Ok(s) => s,
            Err(e) => return Err(JobOutcome::Failed(FailureReason::Backend(e.to_string()))),
        };
        if second.markers.challenge {
            return Err(JobOutcome::Aborted(AbortReason::BlockingChallenge));
        }
        // Platform may differ after navigating into the hosted form.
        self.detection = ats::detect(&second.page.url, &second.markers, None);
        Ok(extract::extract(&second, &self.detection))
    }

    /// Apply resolved values to the live form, starting at `from` within
    /// the resolved list. High-risk values are withheld until after
    /// confirmation unless the workflow runs in its auto-proceed
    /// configuration.
    async fn apply_values(&mut self, from: usize, set: FillSet) -> usize {
        let mut applied = 0;
        let values: Vec<(String, String, String)> = self.resolved[from..]
            .iter()
            .filter(|r| match set {
                FillSet::All => true,
                FillSet::NormalOnly => r.risk_level == RiskLevel::Normal,
                FillSet::HighRiskOnly => r.risk_level == RiskLevel::High,
            })
            .filter_map(|r| {
                r.value
                    .as_ref()
                    .map(|v| (r.field.frame.clone(), r.field.selector.clone(), v.clone()))
            })
            .collect();
        for (frame, selector, value) in values {
            match self.backend.set_value(&frame, &selector, &value).await {
                Ok(()) => applied += 1,
                Err(e) => {
                    warn!(selector = %selector, error = %e, "could not set value");
                }
            }
        }
        applied
    }

    /// Rescan pass: forms commonly reveal follow-up controls once earlier
    /// answers land. Newly revealed fields are resolved and filled; fields
    /// from the first pass are never re-resolved.
    async fn rescan(
        &mut self,
        job: &JobTarget,
        initial: &[FieldCandidate],
        fill_set: FillSet,
    ) -> Result<(), JobOutcome> {
        let snapshot = match self.backend.snapshot().await {
            Ok(s) => s,
            Err(e) => return Err(JobOutcome::Failed(FailureReason::Backend(e.to_string()))),
        };
        if snapshot.markers.challenge {
            return Err(JobOutcome::Aborted(AbortReason::BlockingChallenge));
        }
        let rescan = extract::extract(&snapshot, &self.detection);
        let fresh = extract::newly_revealed(initial, rescan);
        if fresh.is_empty() {
            return Ok(());
        }

        let newly_resolved = self.resolver.resolve_all(&fresh, self.store, job).await;
        let from = self.resolved.len();
        self.resolved.extend(newly_resolved);
        self.apply_values(from, fill_set).await;
        Ok(())
    }

    async fn prompt_decision(
        &mut self,
        summary: &ConfirmationSummary,
    ) -> Result<Decision, JobOutcome> {
        let Some(channel) = self.confirm_channel.as_deref_mut() else {
            return Err(JobOutcome::Skipped(
                "no confirmation channel available".into(),
            ));
        };
        let decision = match self.config.confirm_timeout {
            Some(limit) => match tokio::time::timeout(limit, channel.confirm(summary)).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(JobOutcome::Skipped("confirmation window elapsed".into()));
                }
            },
            None => channel.confirm(summary).await,
        };
        decision.map_err(|e| JobOutcome::Failed(FailureReason::Backend(e.to_string())))
    }

    /// Watch-browser confirmation: poll the URL until the operator's own
    /// submission navigates away. No automated click ever happens here.
    async fn watch_for_operator_submit(&mut self, _job: &JobTarget) -> JobOutcome {
        let initial = match self.backend.current_url().await {
            Ok(u) => u,
            Err(e) => return JobOutcome::Failed(FailureReason::Backend(e.to_string())),
        };
        info!("waiting for operator to submit in the browser");
        let mut waited = Duration::ZERO;
        while waited < self.config.watch_timeout {
            if self.abort.load(Ordering::SeqCst) {
                return JobOutcome::Aborted(AbortReason::Operator);
            }
            tokio::time::sleep(URL_POLL_INTERVAL).await;
            waited += URL_POLL_INTERVAL;
            match self.backend.current_url().await {
                Ok(url) if url != initial => {
                    if self.transition(JobState::Submitting, Some("operator submitted".into()))
                        .is_err()
                    {
                        return JobOutcome::Aborted(AbortReason::Operator);
                    }
                    let shot = self.capture("after_submit").await;
                    self.auditor.record_transition(
                        self.state.as_str(),
                        &self.resolved,
                        shot,
                        Some("post-submit page change detected".into()),
                    );
                    return JobOutcome::Succeeded;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "url poll failed");
                }
            }
        }
        JobOutcome::Skipped("confirmation window elapsed".into())
    }

    async fn submit(&mut self) -> JobOutcome {
        let initial = match self.backend.current_url().await {
            Ok(u) => u,
            Err(e) => return JobOutcome::Failed(FailureReason::Backend(e.to_string())),
        };

        match self.backend.click_match(SUBMIT_SELECTORS, SUBMIT_TEXTS).await {
            Ok(true) => {}
            Ok(false) => return JobOutcome::Failed(FailureReason::SubmitControlNotFound),
            Err(e) => return JobOutcome::Failed(FailureReason::Backend(e.to_string())),
        }

        // Submission is only confirmed by an observed page change.
        let mut waited = Duration::ZERO;
        while waited < self.config.submit_wait {
            tokio::time::sleep(URL_POLL_INTERVAL).await;
            waited += URL_POLL_INTERVAL;
            match self.backend.current_url().await {
                Ok(url) if url != initial => {
                    let shot = self.capture("after_submit").await;
                    self.auditor.record_transition(
                        self.state.as_str(),
                        &self.resolved,
                        shot,
                        Some("post-submit page change detected".into()),
                    );
                    return JobOutcome::Succeeded;
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, "url poll failed");
                }
            }
        }
        JobOutcome::Failed(FailureReason::NoPostSubmitTransition)
    }

    async fn capture(&mut self, name: &str) -> Option<String> {
        match self.backend.screenshot().await {
            Ok(bytes) => self.auditor.save_screenshot(name, &bytes),
            Err(e) => {
                warn!(error = %e, "screenshot failed");
                None
            }
        }
    }

    pub fn resolved_values(&self) -> &[ResolvedValue] {
        &self.resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_accept_nothing() {
        for terminal in [
            JobState::Succeeded,
            JobState::Skipped,
            JobState::Failed,
            JobState::Aborted,
        ] {
            for next in [
                JobState::Navigating,
                JobState::Submitting,
                JobState::Aborted,
                JobState::Failed,
            ] {
                assert!(!terminal.can_transition(next));
            }
        }
    }

    #[test]
    fn happy_path_is_legal() {
        let path = [
            JobState::Navigating,
            JobState::Detecting,
            JobState::Extracting,
            JobState::Resolving,
            JobState::Filling,
            JobState::Rescanning,
            JobState::AwaitingConfirmation,
            JobState::Submitting,
            JobState::Succeeded,
        ];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition(pair[1]), "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn illegal_shortcuts_are_rejected() {
        assert!(!JobState::Filling.can_transition(JobState::Submitting));
        assert!(!JobState::Navigating.can_transition(JobState::Succeeded));
        assert!(!JobState::AwaitingConfirmation.can_transition(JobState::Succeeded));
        assert!(!JobState::Resolving.can_transition(JobState::Failed));
    }

    #[test]
    fn abort_is_legal_from_any_live_state() {
        for state in [
            JobState::Navigating,
            JobState::Detecting,
            JobState::Extracting,
            JobState::Resolving,
            JobState::Filling,
            JobState::Rescanning,
            JobState::AwaitingConfirmation,
            JobState::Submitting,
        ] {
            assert!(state.can_transition(JobState::Aborted));
        }
    }

    #[test]
    fn skip_only_from_confirmation() {
        assert!(JobState::AwaitingConfirmation.can_transition(JobState::Skipped));
        assert!(!JobState::Filling.can_transition(JobState::Skipped));
        assert!(!JobState::Submitting.can_transition(JobState::Skipped));
    }
}
