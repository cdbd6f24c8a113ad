//! Application-tracking-system detection. Advisory only: the tag selects
//! extraction heuristics (iframe-first scanning, settle delays) and is
//! recorded in the audit trail, but nothing downstream depends on it being
//! right.

use formic_common::protocol::DomMarkers;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AtsPlatform {
    Lever,
    Greenhouse,
    Ashby,
    Workday,
    Icims,
    Taleo,
    BambooHr,
    Jobvite,
    SmartRecruiters,
    Generic,
}

impl AtsPlatform {
    /// Platforms that commonly embed the application form in an iframe on
    /// the company's own careers page.
    pub fn expects_iframe(self) -> bool {
        matches!(self, AtsPlatform::Greenhouse | AtsPlatform::Lever)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    Url,
    Dom,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    pub platform: AtsPlatform,
    pub confidence: f32,
    pub method: DetectionMethod,
}

impl Detection {
    pub fn generic() -> Self {
        Self {
            platform: AtsPlatform::Generic,
            confidence: 0.0,
            method: DetectionMethod::None,
        }
    }
}

const URL_CONFIDENCE: f32 = 0.95;
const DOM_CONFIDENCE: f32 = 0.75;

struct UrlRule {
    platform: AtsPlatform,
    patterns: &'static [&'static str],
}

// Ordered: first match wins. URL rules always take precedence over DOM
// markers, so a Greenhouse board embedded on a Lever-looking page resolves
// by the address bar.
const URL_RULES: &[UrlRule] = &[
    UrlRule {
        platform: AtsPlatform::Lever,
        patterns: &[r"jobs\.lever\.co", r"lever\.co/[^/]+/jobs"],
    },
    UrlRule {
        platform: AtsPlatform::Greenhouse,
        patterns: &[r"boards\.greenhouse\.io", r"greenhouse\.io/[^/]+/jobs", r"/greenhouse/"],
    },
    UrlRule {
        platform: AtsPlatform::Ashby,
        patterns: &[r"jobs\.ashbyhq\.com", r"ashbyhq\.com/[^/]+/jobs"],
    },
    UrlRule {
        platform: AtsPlatform::Workday,
        patterns: &[r"myworkdayjobs\.com", r"\.workday\.com", r"/workday/"],
    },
    UrlRule {
        platform: AtsPlatform::Icims,
        patterns: &[r"careers-[^.]+\.icims\.com", r"\.icims\.com"],
    },
    UrlRule {
        platform: AtsPlatform::Taleo,
        patterns: &[r"\.taleo\.net", r"taleo\.com"],
    },
    UrlRule {
        platform: AtsPlatform::BambooHr,
        patterns: &[r"[^.]+\.bamboohr\.com/jobs"],
    },
    UrlRule {
        platform: AtsPlatform::Jobvite,
        patterns: &[r"jobs\.jobvite\.com", r"\.jobvite\.com"],
    },
    UrlRule {
        platform: AtsPlatform::SmartRecruiters,
        patterns: &[r"jobs\.smartrecruiters\.com", r"\.smartrecruiters\.com"],
    },
];

struct MarkerRule {
    platform: AtsPlatform,
    markers: &'static [&'static str],
}

const MARKER_RULES: &[MarkerRule] = &[
    MarkerRule {
        platform: AtsPlatform::Greenhouse,
        markers: &["grnhse_app", "grnhse_iframe", "greenhouse-job-board", "boards.greenhouse.io"],
    },
    MarkerRule {
        platform: AtsPlatform::Lever,
        markers: &["lever-jobs-container", "lever-application-form", "jobs.lever.co"],
    },
    MarkerRule {
        platform: AtsPlatform::Ashby,
        markers: &["ashby-job-posting", "_ashby_", "ashbyhq.com"],
    },
    MarkerRule {
        platform: AtsPlatform::Workday,
        markers: &["workday-application", "myworkdayjobs.com"],
    },
    MarkerRule {
        platform: AtsPlatform::Icims,
        markers: &["icims"],
    },
];

lazy_static! {
    static ref URL_REGEXES: Vec<(AtsPlatform, Vec<Regex>)> = URL_RULES
        .iter()
        .map(|rule| {
            let compiled = rule
                .patterns
                .iter()
                .map(|p| Regex::new(p).expect("static url patterns compile"))
                .collect();
            (rule.platform, compiled)
        })
        .collect();
}

/// Detect by URL shape first, DOM markers second. `source` is the optional
/// hint from the job list and only consulted when the page itself yields
/// nothing.
pub fn detect(url: &str, markers: &DomMarkers, source: Option<&str>) -> Detection {
    let url_lower = url.to_lowercase();
    for (platform, regexes) in URL_REGEXES.iter() {
        if regexes.iter().any(|r| r.is_match(&url_lower)) {
            return Detection {
                platform: *platform,
                confidence: URL_CONFIDENCE,
                method: DetectionMethod::Url,
            };
        }
    }

    let haystack: Vec<String> = markers
        .iframe_srcs
        .iter()
        .cloned()
        .chain(markers.body_markers.iter().cloned())
        .chain(markers.meta.iter().map(|m| format!("{} {}", m.name, m.content)))
        .map(|s| s.to_lowercase())
        .collect();
    for rule in MARKER_RULES {
        for marker in rule.markers {
            if haystack.iter().any(|h| h.contains(marker)) {
                return Detection {
                    platform: rule.platform,
                    confidence: DOM_CONFIDENCE,
                    method: DetectionMethod::Dom,
                };
            }
        }
    }

    if let Some(hint) = source {
        if let Some(platform) = platform_from_hint(hint) {
            return Detection {
                platform,
                confidence: 0.5,
                method: DetectionMethod::None,
            };
        }
    }

    Detection::generic()
}

fn platform_from_hint(hint: &str) -> Option<AtsPlatform> {
    match hint.to_lowercase().as_str() {
        "lever" => Some(AtsPlatform::Lever),
        "greenhouse" => Some(AtsPlatform::Greenhouse),
        "ashby" | "ashbyhq" => Some(AtsPlatform::Ashby),
        "workday" => Some(AtsPlatform::Workday),
        "icims" => Some(AtsPlatform::Icims),
        "taleo" => Some(AtsPlatform::Taleo),
        "bamboohr" => Some(AtsPlatform::BambooHr),
        "jobvite" => Some(AtsPlatform::Jobvite),
        "smartrecruiters" => Some(AtsPlatform::SmartRecruiters),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formic_common::protocol::MetaTag;

    #[test]
    fn url_match_wins_with_high_confidence() {
        let d = detect(
            "https://boards.greenhouse.io/acme/jobs/123",
            &DomMarkers::default(),
            None,
        );
        assert_eq!(d.platform, AtsPlatform::Greenhouse);
        assert_eq!(d.method, DetectionMethod::Url);
        assert!(d.confidence > 0.9);
    }

    #[test]
    fn url_precedes_dom_markers() {
        let markers = DomMarkers {
            body_markers: vec!["lever-application-form".into()],
            ..Default::default()
        };
        let d = detect("https://jobs.ashbyhq.com/acme/123", &markers, None);
        assert_eq!(d.platform, AtsPlatform::Ashby);
    }

    #[test]
    fn dom_marker_fallback() {
        let markers = DomMarkers {
            iframe_srcs: vec!["https://boards.greenhouse.io/embed/job_app?for=acme".into()],
            ..Default::default()
        };
        let d = detect("https://careers.acme.com/senior-engineer", &markers, None);
        assert_eq!(d.platform, AtsPlatform::Greenhouse);
        assert_eq!(d.method, DetectionMethod::Dom);
    }

    #[test]
    fn meta_tag_marker() {
        let markers = DomMarkers {
            meta: vec![MetaTag {
                name: "generator".into(),
                content: "iCIMS Talent Platform".into(),
            }],
            ..Default::default()
        };
        let d = detect("https://careers.acme.com/", &markers, None);
        assert_eq!(d.platform, AtsPlatform::Icims);
    }

    #[test]
    fn no_match_is_generic_with_zero_confidence() {
        let d = detect("https://careers.acme.com/apply", &DomMarkers::default(), None);
        assert_eq!(d.platform, AtsPlatform::Generic);
        assert_eq!(d.confidence, 0.0);
    }

    #[test]
    fn source_hint_only_when_page_says_nothing() {
        let d = detect(
            "https://careers.acme.com/apply",
            &DomMarkers::default(),
            Some("lever"),
        );
        assert_eq!(d.platform, AtsPlatform::Lever);
        assert!(d.confidence < URL_CONFIDENCE);
    }
}
