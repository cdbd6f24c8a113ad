//! Tier 2: learned question → answer lookup. Matching is keyword-subset
//! containment over normalized text; the most specific match (largest
//! keyword overlap) wins, and equal specificity resolves to the answer used
//! most recently.

use async_trait::async_trait;
use formic_common::normalize::{extract_keywords, normalize_label};
use formic_common::profile::CustomAnswer;

use super::{ResolveContext, ResolverTier, SourceTier, TierHit, TierOutcome, best_option};
use crate::extract::FieldCandidate;

const CUSTOM_CONFIDENCE: f32 = 0.85;

/// Minimum score before an answer is trusted. Keeps a single shared keyword
/// from pulling in an unrelated answer.
const SCORE_THRESHOLD: i32 = 30;

pub struct CustomAnswerTier;

#[async_trait]
impl ResolverTier for CustomAnswerTier {
    fn tier(&self) -> SourceTier {
        SourceTier::CustomAnswer
    }

    async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> TierOutcome {
        let answered = &ctx.profile.custom_answers.answered;
        if answered.is_empty() {
            return TierOutcome::Miss;
        }

        let Some(matched) = find_answer(&field.label_text, &field.options, answered) else {
            return TierOutcome::Miss;
        };

        // Choice fields still have to land on an offered option.
        let value = if field.options.is_empty() {
            matched.answer.clone()
        } else {
            match best_option(&matched.answer, &field.options) {
                Some((option, _)) => option,
                None => return TierOutcome::Miss,
            }
        };

        TierOutcome::Hit(TierHit {
            value,
            confidence: CUSTOM_CONFIDENCE,
            matched_question: Some(matched.question.clone()),
        })
    }
}

fn score_answer(
    question_norm: &str,
    question_keywords: &[String],
    options: &[String],
    answer: &CustomAnswer,
) -> i32 {
    let stored_norm = normalize_label(&answer.question);
    if stored_norm == *question_norm {
        // Exact question: beyond any keyword score.
        return i32::MAX;
    }

    let mut score = 0;
    if stored_norm.contains(question_norm) || question_norm.contains(&stored_norm) {
        score += 50;
    }

    let stored_keywords = if answer.keywords.is_empty() {
        extract_keywords(&answer.question)
    } else {
        answer.keywords.clone()
    };
    let overlap = question_keywords
        .iter()
        .filter(|k| stored_keywords.contains(k))
        .count();
    // Keyword-subset containment: every keyword of the stored question
    // appears in the live one. The flat bonus lets a single-keyword subset
    // clear the threshold; overlap size keeps "longest match wins".
    let is_subset = !stored_keywords.is_empty() && overlap == stored_keywords.len();
    if is_subset {
        score += 30;
    }
    score += (overlap as i32) * 20;

    if !options.is_empty() && !answer.answer.is_empty() {
        if best_option(&answer.answer, options).is_some() {
            score += 10;
        } else {
            score -= 20;
        }
    }

    score
}

/// Best stored answer for a question, or `None` below the trust threshold.
/// Ties on score go to the most recently used answer.
pub fn find_answer<'a>(
    question: &str,
    options: &[String],
    answered: &'a [CustomAnswer],
) -> Option<&'a CustomAnswer> {
    let question_norm = normalize_label(question);
    let question_keywords = extract_keywords(question);

    let mut best: Option<(&CustomAnswer, i32)> = None;
    for answer in answered {
        let score = score_answer(&question_norm, &question_keywords, options, answer);
        let better = match best {
            None => true,
            Some((current, current_score)) => {
                score > current_score
                    || (score == current_score && answer.last_used > current.last_used)
            }
        };
        if better {
            best = Some((answer, score));
        }
    }

    best.filter(|(_, score)| *score >= SCORE_THRESHOLD)
        .map(|(answer, _)| answer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn answer(question: &str, value: &str) -> CustomAnswer {
        CustomAnswer {
            question: question.into(),
            answer: value.into(),
            options: Vec::new(),
            keywords: Vec::new(),
            last_used: None,
        }
    }

    #[test]
    fn exact_normalized_question_wins() {
        let answered = vec![
            answer("Do you require sponsorship?", "No"),
            answer("Have you worked for Acme before?", "No"),
        ];
        let found = find_answer("Do you require sponsorship", &[], &answered).unwrap();
        assert_eq!(found.question, "Do you require sponsorship?");
    }

    #[test]
    fn keyword_overlap_matches_rephrased_question() {
        let answered = vec![answer(
            "Are you subject to a non-compete agreement?",
            "No",
        )];
        let found = find_answer(
            "Does a non-compete restrict your ability to join us?",
            &[],
            &answered,
        );
        assert!(found.is_some());
    }

    #[test]
    fn unrelated_question_stays_unanswered() {
        let answered = vec![answer("Do you require sponsorship?", "No")];
        assert!(find_answer("What's your favorite team ritual?", &[], &answered).is_none());
    }

    #[test]
    fn equal_specificity_resolves_by_recency() {
        let older = CustomAnswer {
            last_used: Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()),
            ..answer("Do you need visa sponsorship now?", "Yes")
        };
        let newer = CustomAnswer {
            last_used: Some(Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()),
            ..answer("Would you require sponsorship or a visa later?", "No")
        };
        // Both match the query with the same {sponsorship, visa} keyword
        // subset, so recency decides.
        let answered = vec![older, newer];
        let found = find_answer(
            "Will you require sponsorship for a visa?",
            &[],
            &answered,
        )
        .unwrap();
        assert_eq!(found.answer, "No");
    }

    #[tokio::test]
    async fn answer_unmappable_to_options_makes_tier_miss() {
        use crate::extract::{FieldCandidate, LabelSource};
        use formic_common::profile::Profile;
        use formic_common::protocol::{ControlKind, JobTarget};
        use formic_common::semantic::SemanticType;

        let mut profile = Profile::default();
        profile.custom_answers.answered =
            vec![answer("How did you hear about the role?", "A friend told me")];
        let job = JobTarget {
            url: "https://jobs.example.com/1".into(),
            company: "Acme".into(),
            title: "Engineer".into(),
            source: None,
        };
        let ctx = ResolveContext::new(&profile, &job);
        let field = FieldCandidate {
            selector: "#src".into(),
            frame: "main".into(),
            label_text: "How did you hear about the role?".into(),
            label_source: LabelSource::Explicit,
            semantic_type: SemanticType::CustomChoice,
            confidence: 0.95,
            options: vec!["LinkedIn".into(), "Job board".into()],
            control: ControlKind::Select,
            required: false,
        };
        assert!(matches!(
            CustomAnswerTier.resolve(&field, &ctx).await,
            TierOutcome::Miss
        ));
    }
}
