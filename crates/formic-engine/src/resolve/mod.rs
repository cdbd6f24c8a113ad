//! Tiered value resolution: profile → learned custom answers → inference →
//! safe decline → unresolved. Each tier is an independent unit behind
//! `ResolverTier`; the chain evaluates them strictly in order and stops at
//! the first hit, so a field resolvable at tier 1 never costs an inference
//! call.

mod custom_tier;
mod decline_tier;
mod llm_tier;
mod options;
mod profile_tier;

pub use custom_tier::CustomAnswerTier;
pub use decline_tier::DeclineTier;
pub use llm_tier::LlmTier;
pub use options::{MatchQuality, best_option};
pub use profile_tier::ProfileTier;

use async_trait::async_trait;
use formic_common::profile::Profile;
use formic_common::protocol::{ControlKind, JobTarget};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::extract::FieldCandidate;
use crate::inference::InferenceClient;
use crate::store::ProfileStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    Profile,
    CustomAnswer,
    Llm,
    Decline,
    Unresolved,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Normal,
    High,
}

/// The outcome of resolving one candidate. `value = None` means the field
/// is left untouched on the live form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedValue {
    pub field: FieldCandidate,
    pub value: Option<String>,
    pub source_tier: SourceTier,
    pub risk_level: RiskLevel,
    pub confidence: f32,
}

impl ResolvedValue {
    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    pub fn is_high_risk(&self) -> bool {
        self.risk_level == RiskLevel::High
    }

    fn unresolved(field: &FieldCandidate) -> Self {
        Self {
            field: field.clone(),
            value: None,
            source_tier: SourceTier::Unresolved,
            risk_level: risk_of(field),
            confidence: 0.0,
        }
    }
}

fn risk_of(field: &FieldCandidate) -> RiskLevel {
    if field.is_high_risk() {
        RiskLevel::High
    } else {
        RiskLevel::Normal
    }
}

/// A successful tier lookup.
#[derive(Debug, Clone)]
pub struct TierHit {
    pub value: String,
    pub confidence: f32,
    /// Custom tier only: the stored question whose answer was reused, so the
    /// store can refresh its recency between jobs.
    pub matched_question: Option<String>,
}

#[derive(Debug, Clone)]
pub enum TierOutcome {
    Hit(TierHit),
    Miss,
    /// Terminal: stop the chain and surface the field as unresolved.
    /// Used when policy forbids the remaining tiers from answering.
    Unresolved,
}

/// Shared read-only context for one resolution pass. The profile is never
/// mutated while a resolve is in flight; learned-store writes are queued and
/// flushed between job attempts.
pub struct ResolveContext<'a> {
    pub profile: &'a Profile,
    pub job: &'a JobTarget,
    /// Resolved on-disk resume path, when one exists.
    pub resume_path: Option<String>,
    pub cover_letter_path: Option<String>,
}

impl<'a> ResolveContext<'a> {
    pub fn new(profile: &'a Profile, job: &'a JobTarget) -> Self {
        Self {
            profile,
            job,
            resume_path: None,
            cover_letter_path: None,
        }
    }
}

#[async_trait]
pub trait ResolverTier: Send + Sync {
    fn tier(&self) -> SourceTier;
    async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> TierOutcome;
}

/// The ordered chain.
pub struct FieldResolver {
    tiers: Vec<Box<dyn ResolverTier>>,
}

impl FieldResolver {
    pub fn new(inference: Option<InferenceClient>) -> Self {
        let mut tiers: Vec<Box<dyn ResolverTier>> = vec![
            Box::new(ProfileTier),
            Box::new(CustomAnswerTier),
        ];
        if let Some(client) = inference {
            tiers.push(Box::new(LlmTier::new(client)));
        }
        tiers.push(Box::new(DeclineTier));
        Self { tiers }
    }

    /// Chain with an explicit tier list, for tests.
    pub fn with_tiers(tiers: Vec<Box<dyn ResolverTier>>) -> Self {
        Self { tiers }
    }

    pub async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> ResolvedValue {
        self.resolve_inner(field, ctx).await.0
    }

    async fn resolve_inner(
        &self,
        field: &FieldCandidate,
        ctx: &ResolveContext<'_>,
    ) -> (ResolvedValue, Option<String>) {
        for tier in &self.tiers {
            match tier.resolve(field, ctx).await {
                TierOutcome::Hit(hit) => {
                    debug!(
                        label = %field.label_text,
                        tier = ?tier.tier(),
                        "field resolved"
                    );
                    let resolved = ResolvedValue {
                        field: field.clone(),
                        value: Some(hit.value),
                        source_tier: tier.tier(),
                        risk_level: risk_of(field),
                        confidence: hit.confidence,
                    };
                    return (resolved, hit.matched_question);
                }
                TierOutcome::Miss => continue,
                TierOutcome::Unresolved => break,
            }
        }
        (ResolvedValue::unresolved(field), None)
    }

    /// Resolve a batch of candidates, queueing learned-store side effects
    /// (answer recency, pending questions). The queued writes hit disk only
    /// between job attempts.
    pub async fn resolve_all(
        &self,
        fields: &[FieldCandidate],
        store: &mut ProfileStore,
        job: &JobTarget,
    ) -> Vec<ResolvedValue> {
        let resume_path = store
            .profile()
            .resume
            .resolve(store.profile_dir())
            .map(|p| p.display().to_string());
        let cover_letter_path = store
            .profile()
            .resume
            .resolve_cover_letter(store.profile_dir())
            .map(|p| p.display().to_string());

        let mut out = Vec::with_capacity(fields.len());
        for field in fields {
            let (resolved, matched_question) = {
                let ctx = ResolveContext {
                    profile: store.profile(),
                    job,
                    resume_path: resume_path.clone(),
                    cover_letter_path: cover_letter_path.clone(),
                };
                self.resolve_inner(field, &ctx).await
            };

            if let Some(question) = matched_question {
                // Recency feeds the tie-break between equally specific
                // answers on later lookups.
                store.touch_answer(&question);
            }
            // Unanswered questions go to the operator's pending list.
            // High-risk fields are surfaced at confirmation instead, and a
            // bare file input is a profile configuration gap, not a
            // question.
            if resolved.source_tier == SourceTier::Unresolved
                && resolved.risk_level == RiskLevel::Normal
                && field.control != ControlKind::File
            {
                store.queue_pending(field, job);
            }
            out.push(resolved);
        }
        out
    }
}
