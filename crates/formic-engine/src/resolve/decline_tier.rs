//! Tier 4: voluntary non-disclosure for EEOC-class questions. Eligibility
//! is the semantic type alone — work authorization, sponsorship and salary
//! never reach this tier, no matter how the earlier tiers went.

use async_trait::async_trait;
use formic_common::normalize::normalize_label;
use formic_common::semantic::DECLINE_PHRASES;

use super::{ResolveContext, ResolverTier, SourceTier, TierHit, TierOutcome};
use crate::extract::FieldCandidate;

const DECLINE_CONFIDENCE: f32 = 0.9;

pub struct DeclineTier;

#[async_trait]
impl ResolverTier for DeclineTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Decline
    }

    async fn resolve(&self, field: &FieldCandidate, _ctx: &ResolveContext<'_>) -> TierOutcome {
        if !field.semantic_type.is_eeoc() || field.options.is_empty() {
            return TierOutcome::Miss;
        }

        match pick_decline_option(&field.options) {
            Some(option) => TierOutcome::Hit(TierHit {
                value: option,
                confidence: DECLINE_CONFIDENCE,
                matched_question: None,
            }),
            None => TierOutcome::Miss,
        }
    }
}

/// First phrase in priority order that appears among the offered options.
pub fn pick_decline_option(options: &[String]) -> Option<String> {
    for phrase in DECLINE_PHRASES {
        for option in options {
            if normalize_label(option).contains(&normalize_label(phrase)) {
                return Some(option.clone());
            }
        }
    }
    None
}
