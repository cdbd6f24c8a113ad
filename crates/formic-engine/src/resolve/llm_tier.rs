//! Tier 3: inference-backed answers. Only constructed when a backend is
//! configured; transport failures degrade to the next tier, never fail the
//! job. A low-confidence answer on a high-risk field stops the chain — the
//! field surfaces as unresolved for the operator instead of being declined
//! or guessed.

use async_trait::async_trait;
use formic_common::semantic::SemanticType;
use tracing::warn;

use super::{ResolveContext, ResolverTier, SourceTier, TierHit, TierOutcome};
use crate::extract::FieldCandidate;
use crate::inference::{Confidence, InferenceClient, InferenceRequest};

/// Types whose absence means missing profile data, not an open question.
/// Asking a model for the operator's phone number is never right.
const SKIP_TYPES: &[SemanticType] = &[
    SemanticType::FirstName,
    SemanticType::LastName,
    SemanticType::FullName,
    SemanticType::Email,
    SemanticType::Phone,
    SemanticType::Address,
    SemanticType::ZipCode,
    SemanticType::Linkedin,
    SemanticType::Github,
    SemanticType::Portfolio,
    SemanticType::ResumeUpload,
    SemanticType::CoverLetterUpload,
];

pub struct LlmTier {
    client: InferenceClient,
}

impl LlmTier {
    pub fn new(client: InferenceClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResolverTier for LlmTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Llm
    }

    async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> TierOutcome {
        if SKIP_TYPES.contains(&field.semantic_type) {
            return TierOutcome::Miss;
        }

        let request = InferenceRequest {
            label: field.label_text.clone(),
            question_text: field.label_text.clone(),
            options: field.options.clone(),
        };

        let reply = match self
            .client
            .answer(&request, ctx.profile, ctx.job)
            .await
        {
            Ok(Some(reply)) => reply,
            Ok(None) => return TierOutcome::Miss,
            Err(e) => {
                warn!(label = %field.label_text, error = %e, "inference tier failed, skipping");
                return TierOutcome::Miss;
            }
        };

        if reply.confidence == Confidence::Low && field.is_high_risk() {
            return TierOutcome::Unresolved;
        }

        TierOutcome::Hit(TierHit {
            value: reply.value,
            confidence: reply.confidence.score(),
            matched_question: None,
        })
    }
}
