//! Matching a candidate value onto a bounded option list. Shared by the
//! profile, custom-answer and inference tiers: a choice field only ever
//! receives one of its offered options, verbatim.

use formic_common::normalize::normalize_label;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchQuality {
    Exact,
    Prefix,
    Contains,
    Fuzzy,
}

const FUZZY_THRESHOLD: f64 = 0.88;

/// Find the offered option that best matches `value`. Quality degrades
/// exact → prefix → contains → fuzzy (Jaro-Winkler); `None` when nothing
/// clears the fuzzy threshold. Empty values never match — an empty needle
/// would prefix-match everything.
pub fn best_option(value: &str, options: &[String]) -> Option<(String, MatchQuality)> {
    let needle = normalize_label(value);
    if needle.is_empty() {
        return None;
    }

    for opt in options {
        if normalize_label(opt) == needle {
            return Some((opt.clone(), MatchQuality::Exact));
        }
    }
    for opt in options {
        let hay = normalize_label(opt);
        if hay.starts_with(&needle) || needle.starts_with(&hay) {
            return Some((opt.clone(), MatchQuality::Prefix));
        }
    }
    for opt in options {
        let hay = normalize_label(opt);
        if hay.contains(&needle) || needle.contains(&hay) {
            return Some((opt.clone(), MatchQuality::Contains));
        }
    }

    let mut best: Option<(&String, f64)> = None;
    for opt in options {
        let score = strsim::jaro_winkler(&normalize_label(opt), &needle);
        if score >= FUZZY_THRESHOLD && best.map_or(true, |(_, s)| score > s) {
            best = Some((opt, score));
        }
    }
    best.map(|(opt, _)| (opt.clone(), MatchQuality::Fuzzy))
}
