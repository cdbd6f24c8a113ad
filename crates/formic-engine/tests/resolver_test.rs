use async_trait::async_trait;
use formic_common::profile::{CustomAnswer, Profile};
use formic_common::protocol::{ControlKind, JobTarget};
use formic_common::semantic::SemanticType;
use formic_engine::extract::{FieldCandidate, LabelSource};
use formic_engine::resolve::{
    CustomAnswerTier, DeclineTier, FieldResolver, ProfileTier, ResolveContext, ResolverTier,
    SourceTier, TierOutcome,
};
use formic_engine::store::ProfileStore;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

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

/// Wraps a tier, counting invocations.
struct Counting<T> {
    inner: T,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl<T: ResolverTier> ResolverTier for Counting<T> {
    fn tier(&self) -> SourceTier {
        self.inner.tier()
    }
    async fn resolve(&self, field: &FieldCandidate, ctx: &ResolveContext<'_>) -> TierOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.resolve(field, ctx).await
    }
}

#[tokio::test]
async fn tier_one_hit_never_reaches_later_tiers() {
    let custom_calls = Arc::new(AtomicUsize::new(0));
    let decline_calls = Arc::new(AtomicUsize::new(0));
    let resolver = FieldResolver::with_tiers(vec![
        Box::new(ProfileTier),
        Box::new(Counting {
            inner: CustomAnswerTier,
            calls: custom_calls.clone(),
        }),
        Box::new(Counting {
            inner: DeclineTier,
            calls: decline_calls.clone(),
        }),
    ]);

    let mut profile = Profile::default();
    profile.personal.email = "ada@example.com".into();
    let j = job();
    let ctx = ResolveContext::new(&profile, &j);

    let resolved = resolver
        .resolve(&candidate("Email", SemanticType::Email, &[]), &ctx)
        .await;
    assert_eq!(resolved.source_tier, SourceTier::Profile);
    assert_eq!(resolved.value.as_deref(), Some("ada@example.com"));
    assert_eq!(custom_calls.load(Ordering::SeqCst), 0);
    assert_eq!(decline_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn authorized_scenario_resolves_at_profile_tier_as_high_risk() {
    let resolver = FieldResolver::new(None);
    let mut profile = Profile::default();
    profile.work_authorization.authorized_in_us = true;
    let j = job();
    let ctx = ResolveContext::new(&profile, &j);

    let resolved = resolver
        .resolve(
            &candidate(
                "Are you legally authorized to work in the US?",
                SemanticType::AuthorizedInUs,
                &["Yes", "No"],
            ),
            &ctx,
        )
        .await;

    assert_eq!(resolved.value.as_deref(), Some("Yes"));
    assert_eq!(resolved.source_tier, SourceTier::Profile);
    assert!(resolved.is_high_risk());
}

#[tokio::test]
async fn eeoc_gender_scenario_resolves_via_decline() {
    let resolver = FieldResolver::new(None);
    let profile = Profile::default();
    let j = job();
    let ctx = ResolveContext::new(&profile, &j);

    let resolved = resolver
        .resolve(
            &candidate(
                "Gender",
                SemanticType::EeocGender,
                &["Male", "Female", "I do not wish to disclose"],
            ),
            &ctx,
        )
        .await;

    assert_eq!(resolved.value.as_deref(), Some("I do not wish to disclose"));
    assert_eq!(resolved.source_tier, SourceTier::Decline);
    assert!(resolved.is_high_risk());
}

#[tokio::test]
async fn decline_never_fires_for_work_authorization() {
    let resolver = FieldResolver::new(None);
    // Empty work auth cannot happen through the typed profile (it's a
    // boolean), so force the miss with a visa-status field instead.
    let profile = Profile::default();
    let j = job();
    let ctx = ResolveContext::new(&profile, &j);

    let resolved = resolver
        .resolve(
            &candidate(
                "Visa status",
                SemanticType::VisaStatus,
                &["H-1B", "Green card", "Decline to answer"],
            ),
            &ctx,
        )
        .await;

    // The option list even offers a decline phrasing; policy still forbids
    // tier 4 for non-EEOC high-risk types.
    assert_eq!(resolved.source_tier, SourceTier::Unresolved);
    assert_eq!(resolved.value, None);
}

#[tokio::test]
async fn free_text_without_backend_goes_to_pending_once() {
    let resolver = FieldResolver::new(None);
    let mut store = ProfileStore::in_memory(Profile::default());
    let j = job();
    let field = candidate(
        "What's your favorite team ritual?",
        SemanticType::CustomText,
        &[],
    );

    // Two jobs encounter the identically normalized question.
    let first = resolver.resolve_all(&[field.clone()], &mut store, &j).await;
    assert_eq!(first[0].source_tier, SourceTier::Unresolved);
    store.flush().unwrap();

    let second = resolver.resolve_all(&[field], &mut store, &j).await;
    assert_eq!(second[0].source_tier, SourceTier::Unresolved);
    store.flush().unwrap();

    assert_eq!(store.profile().custom_answers.pending.len(), 1);
}

#[tokio::test]
async fn high_risk_unresolved_is_never_queued_as_pending() {
    let resolver = FieldResolver::new(None);
    let mut store = ProfileStore::in_memory(Profile::default());
    let j = job();
    let field = candidate(
        "What is your expected salary?",
        SemanticType::SalaryExpectation,
        &[],
    );

    let resolved = resolver.resolve_all(&[field], &mut store, &j).await;
    assert_eq!(resolved[0].source_tier, SourceTier::Unresolved);
    store.flush().unwrap();
    assert!(store.profile().custom_answers.pending.is_empty());
}

#[tokio::test]
async fn custom_answer_reuse_refreshes_recency() {
    let resolver = FieldResolver::new(None);
    let mut profile = Profile::default();
    profile.custom_answers.answered.push(CustomAnswer {
        question: "Are you subject to a non-compete agreement?".into(),
        answer: "No".into(),
        options: vec![],
        keywords: vec![],
        last_used: None,
    });
    let mut store = ProfileStore::in_memory(profile);
    let j = job();
    let field = candidate(
        "Does a non-compete restrict you from joining?",
        SemanticType::CustomText,
        &[],
    );

    let resolved = resolver.resolve_all(&[field], &mut store, &j).await;
    assert_eq!(resolved[0].source_tier, SourceTier::CustomAnswer);
    assert_eq!(resolved[0].value.as_deref(), Some("No"));
    store.flush().unwrap();
    assert!(
        store.profile().custom_answers.answered[0]
            .last_used
            .is_some()
    );
}

#[tokio::test]
async fn resolver_never_reclassifies_a_field() {
    let resolver = FieldResolver::new(None);
    let mut profile = Profile::default();
    profile.personal.email = "ada@example.com".into();
    let j = job();
    let ctx = ResolveContext::new(&profile, &j);

    let field = candidate("Email", SemanticType::Email, &[]);
    let resolved = resolver.resolve(&field, &ctx).await;
    assert_eq!(resolved.field.semantic_type, field.semantic_type);
    assert_eq!(resolved.field.selector, field.selector);
}
