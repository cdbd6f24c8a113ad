//! Tier 1: direct semantic-type → profile attribute lookup, with the sanity
//! guards that keep profile data from leaking into the wrong field class
//! (a visa status is never an answer to a disability question, a salary
//! figure never fills a free-text question).

use async_trait::async_trait;
use formic_common::normalize::normalize_label;
use formic_common::semantic::{self, SemanticType};

use super::{MatchQuality, ResolveContext, ResolverTier, SourceTier, TierHit, TierOutcome, best_option};
use crate::extract::FieldCandidate;

const PROFILE_CONFIDENCE: f32 = 0.95;

const VISA_VALUES: &[&str] = &[
    "h1b", "h 1b", "opt", "f1", "f 1", "green card", "l1", "l 1", "tn", "o1", "o 1",
];

const VISA_LABELS: &[&str] = &[
    "visa",
    "immigration",
    "sponsorship",
    "authorization",
    "authorized",
    "work status",
];

pub struct ProfileTier;

#[async_trait]
impl ResolverTier for ProfileTier {
    fn tier(&self) -> SourceTier {
        SourceTier::Profile
    }

    async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> TierOutcome {
        // Upload fields resolve to file paths, not profile attributes.
        match field.semantic_type {
            SemanticType::ResumeUpload => {
                return match &ctx.resume_path {
                    Some(path) => TierOutcome::Hit(TierHit {
                        value: path.clone(),
                        confidence: PROFILE_CONFIDENCE,
                        matched_question: None,
                    }),
                    None => TierOutcome::Miss,
                };
            }
            SemanticType::CoverLetterUpload => {
                return match &ctx.cover_letter_path {
                    Some(path) => TierOutcome::Hit(TierHit {
                        value: path.clone(),
                        confidence: PROFILE_CONFIDENCE,
                        matched_question: None,
                    }),
                    None => TierOutcome::Miss,
                };
            }
            _ => {}
        }

        let Some(value) = ctx.profile.value_for(field.semantic_type) else {
            return TierOutcome::Miss;
        };
        if value.trim().is_empty() {
            return TierOutcome::Miss;
        }
        if !value_fits_field(&value, field) {
            return TierOutcome::Miss;
        }

        // Bounded-choice fields must land on an offered option, verbatim.
        if !field.options.is_empty() {
            return match best_option(&value, &field.options) {
                Some((option, quality)) => TierOutcome::Hit(TierHit {
                    value: option,
                    confidence: quality_confidence(quality),
                    matched_question: None,
                }),
                None => TierOutcome::Miss,
            };
        }

        TierOutcome::Hit(TierHit {
            value,
            confidence: PROFILE_CONFIDENCE,
            matched_question: None,
        })
    }
}

fn quality_confidence(quality: MatchQuality) -> f32 {
    match quality {
        MatchQuality::Exact => PROFILE_CONFIDENCE,
        MatchQuality::Prefix | MatchQuality::Contains => 0.85,
        MatchQuality::Fuzzy => 0.7,
    }
}

/// Cross-contamination guards recovered from operating the original system:
/// typed profile values only flow into fields whose class can legitimately
/// hold them.
fn value_fits_field(value: &str, field: &FieldCandidate) -> bool {
    let value_norm = normalize_label(value);
    let label_norm = normalize_label(&field.label_text);

    let is_visa_value = VISA_VALUES
        .iter()
        .any(|v| value_norm == *v || value_norm.contains(&format!(" {v} ")) || value_norm.starts_with(&format!("{v} ")) || value_norm.ends_with(&format!(" {v}")));
    if is_visa_value {
        let visa_typed = matches!(
            field.semantic_type,
            SemanticType::VisaStatus
                | SemanticType::AuthorizedInUs
                | SemanticType::RequireSponsorship
        );
        let visa_labeled = VISA_LABELS.iter().any(|k| label_norm.contains(k));
        if semantic::looks_eeoc(&field.label_text) {
            return false;
        }
        if !visa_typed && !visa_labeled {
            return false;
        }
    }

    if looks_like_salary(&value_norm) && field.semantic_type != SemanticType::SalaryExpectation {
        let salary_labeled = ["salary", "compensation", "pay", "wage"]
            .iter()
            .any(|k| label_norm.contains(k));
        if !salary_labeled {
            return false;
        }
    }

    true
}

fn looks_like_salary(value_norm: &str) -> bool {
    let digits: String = value_norm.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.len() < 5 {
        return false;
    }
    digits.parse::<u64>().map(|n| n > 10_000).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{FieldCandidate, LabelSource};
    use formic_common::profile::Profile;
    use formic_common::protocol::{ControlKind, JobTarget};

    fn job() -> JobTarget {
        JobTarget {
            url: "https://jobs.example.com/1".into(),
            company: "Acme".into(),
            title: "Engineer".into(),
            source: None,
        }
    }

    fn candidate(label: &str, semantic: SemanticType, options: &[&str]) -> FieldCandidate {
        FieldCandidate {
            selector: "#f".into(),
            frame: "main".into(),
            label_text: label.into(),
            label_source: LabelSource::Explicit,
            semantic_type: semantic,
            confidence: 0.95,
            options: options.iter().map(|s| s.to_string()).collect(),
            control: if options.is_empty() {
                ControlKind::Text
            } else {
                ControlKind::Select
            },
            required: false,
        }
    }

    fn profile() -> Profile {
        let mut p = Profile::default();
        p.personal.email = "ada@example.com".into();
        p.work_authorization.authorized_in_us = true;
        p.work_authorization.visa_status = "H1B".into();
        p.salary.expected_salary = "180,000".into();
        p
    }

    #[tokio::test]
    async fn authorized_yes_maps_onto_option_list() {
        let p = profile();
        let j = job();
        let ctx = ResolveContext::new(&p, &j);
        let field = candidate(
            "Are you legally authorized to work in the US?",
            SemanticType::AuthorizedInUs,
            &["Yes", "No"],
        );
        match ProfileTier.resolve(&field, &ctx).await {
            TierOutcome::Hit(hit) => assert_eq!(hit.value, "Yes"),
            other => panic!("expected hit, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_attribute_misses() {
        let p = profile();
        let j = job();
        let ctx = ResolveContext::new(&p, &j);
        let field = candidate("Phone", SemanticType::Phone, &[]);
        assert!(matches!(
            ProfileTier.resolve(&field, &ctx).await,
            TierOutcome::Miss
        ));
    }

    #[tokio::test]
    async fn visa_value_never_fills_eeoc_labeled_field() {
        let mut p = profile();
        // Force the contaminated state: a visa string stored under ethnicity.
        p.diversity.ethnicity = "H1B".into();
        let j = job();
        let ctx = ResolveContext::new(&p, &j);
        let field = candidate("Ethnicity", SemanticType::EeocEthnicity, &[]);
        assert!(matches!(
            ProfileTier.resolve(&field, &ctx).await,
            TierOutcome::Miss
        ));
    }

    #[tokio::test]
    async fn salary_value_never_fills_unrelated_field() {
        let mut p = profile();
        p.experience.current_company = "180,000".into();
        let j = job();
        let ctx = ResolveContext::new(&p, &j);
        let field = candidate("Current company", SemanticType::CurrentCompany, &[]);
        assert!(matches!(
            ProfileTier.resolve(&field, &ctx).await,
            TierOutcome::Miss
        ));
    }

    #[tokio::test]
    async fn choice_field_with_unmatchable_profile_value_misses() {
        let p = profile();
        let j = job();
        let ctx = ResolveContext::new(&p, &j);
        let field = candidate(
            "Visa status",
            SemanticType::VisaStatus,
            &["Citizen", "Permanent resident"],
        );
        assert!(matches!(
            ProfileTier.resolve(&field, &ctx).await,
            TierOutcome::Miss
        ));
    }
}
