//! Label/question text normalization shared by the extractor, the resolver
//! and the profile store. All cross-session matching (pending dedup, custom
//! answer lookup) goes through `normalize_label` so the same question phrased
//! with different punctuation or casing collapses to one key.

/// Casefold, strip punctuation, collapse whitespace.
pub fn normalize_label(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped: String = lowered
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c.is_whitespace() {
                c
            } else {
                ' '
            }
        })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Question phrases that carry the semantic weight of a custom question.
/// Ordered longest-first where one contains another so containment checks
/// prefer the more specific phrase.
const KEYWORD_PATTERNS: &[&str] = &[
    "non compete",
    "noncompete",
    "non solicitation",
    "previously worked",
    "ever worked",
    "worked for",
    "worked at",
    "currently work",
    "employed by",
    "employment",
    "authorized",
    "sponsorship",
    "visa",
    "relocate",
    "remote",
    "hybrid",
    "onsite",
    "salary",
    "compensation",
    "notice period",
    "start date",
    "available",
    "clearance",
    "security",
    "background check",
    "disability",
    "veteran",
    "gender",
    "race",
    "ethnicity",
    "referred",
    "hear about",
    "how did you find",
    "years of experience",
    "experience with",
];

/// Extract the known question keywords present in `text` (normalized form).
pub fn extract_keywords(text: &str) -> Vec<String> {
    let normalized = normalize_label(text);
    KEYWORD_PATTERNS
        .iter()
        .filter(|p| normalized.contains(*p))
        .map(|p| p.to_string())
        .collect()
}
