//! Closed semantic field taxonomy and the pattern table that maps raw form
//! labels onto it. The type assigned here is immutable for the lifetime of a
//! candidate: the resolver only attaches values, it never reclassifies.

use lazy_static::lazy_static;
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// Semantic category of a form control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticType {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    Linkedin,
    Github,
    Portfolio,
    Address,
    City,
    State,
    ZipCode,
    Country,
    ResumeUpload,
    CoverLetterUpload,
    AuthorizedInUs,
    RequireSponsorship,
    VisaStatus,
    YearsOfExperience,
    CurrentCompany,
    CurrentTitle,
    HighestDegree,
    University,
    SalaryExpectation,
    StartDate,
    HowDidYouHear,
    EeocGender,
    EeocEthnicity,
    EeocRace,
    EeocHispanicLatino,
    EeocVeteran,
    EeocDisability,
    CustomText,
    CustomChoice,
}

impl SemanticType {
    /// High risk is a static property of the type, independent of how
    /// confidently it was detected: legal weight (work authorization,
    /// sponsorship, visa), money (salary), and every EEOC category.
    pub fn is_high_risk(self) -> bool {
        matches!(
            self,
            SemanticType::AuthorizedInUs
                | SemanticType::RequireSponsorship
                | SemanticType::VisaStatus
                | SemanticType::SalaryExpectation
        ) || self.is_eeoc()
    }

    /// EEOC/voluntary self-identification categories. Only these are
    /// eligible for the decline tier.
    pub fn is_eeoc(self) -> bool {
        matches!(
            self,
            SemanticType::EeocGender
                | SemanticType::EeocEthnicity
                | SemanticType::EeocRace
                | SemanticType::EeocHispanicLatino
                | SemanticType::EeocVeteran
                | SemanticType::EeocDisability
        )
    }

    pub fn is_custom(self) -> bool {
        matches!(self, SemanticType::CustomText | SemanticType::CustomChoice)
    }

    pub fn is_upload(self) -> bool {
        matches!(
            self,
            SemanticType::ResumeUpload | SemanticType::CoverLetterUpload
        )
    }
}

/// Voluntary non-disclosure phrasings, in selection priority order. The
/// decline tier picks the first of these present in a field's option list.
pub const DECLINE_PHRASES: &[&str] = &[
    "i do not wish to disclose",
    "decline to answer",
    "prefer not to say",
    "decline to self-identify",
    "i don't wish to answer",
    "choose not to disclose",
    "decline",
    "prefer not to answer",
    "i choose not to disclose",
];

/// Keywords that flag a question as EEOC-class even when the pattern table
/// only produced a custom type. Used as a safety net so decline handling
/// still applies to oddly phrased self-identification questions.
const EEOC_KEYWORDS: &[&str] = &[
    "race",
    "ethnicity",
    "gender",
    "disability",
    "veteran",
    "hispanic",
    "latino",
    "eeo",
    "eeoc",
    "equal employment",
    "self identification",
    "demographic",
];

pub fn looks_eeoc(label: &str) -> bool {
    let normalized = crate::normalize::normalize_label(label);
    EEOC_KEYWORDS.iter().any(|k| normalized.contains(k))
}

struct PatternRow {
    semantic: SemanticType,
    label: &'static [&'static str],
    attr: &'static [&'static str],
}

/// Ordered pattern table. Order matters: earlier rows win, so the more
/// specific categories (first/last name, hispanic/latino before ethnicity)
/// sit above the broader ones.
const PATTERN_ROWS: &[PatternRow] = &[
    PatternRow {
        semantic: SemanticType::FirstName,
        label: &[r"first\s*name", r"given\s*name"],
        attr: &[r"first_?name", r"\bfname\b", r"given_?name"],
    },
    PatternRow {
        semantic: SemanticType::LastName,
        label: &[r"last\s*name", r"family\s*name", r"surname"],
        attr: &[r"last_?name", r"\blname\b", r"surname", r"family_?name"],
    },
    PatternRow {
        semantic: SemanticType::FullName,
        label: &[r"full\s*name", r"^name$", r"your\s*name"],
        attr: &[r"full_?name", r"^name$"],
    },
    PatternRow {
        semantic: SemanticType::Email,
        label: &[r"e\s?mail"],
        attr: &[r"e-?mail"],
    },
    PatternRow {
        semantic: SemanticType::Phone,
        label: &[r"phone", r"telephone", r"mobile", r"\bcell\b"],
        attr: &[r"phone", r"\btel\b", r"mobile", r"\bcell\b"],
    },
    PatternRow {
        semantic: SemanticType::Linkedin,
        label: &[r"linked\s?in"],
        attr: &[r"linkedin"],
    },
    PatternRow {
        semantic: SemanticType::Github,
        label: &[r"github"],
        attr: &[r"github"],
    },
    PatternRow {
        semantic: SemanticType::Portfolio,
        label: &[r"portfolio", r"personal\s*website", r"website"],
        attr: &[r"portfolio", r"website"],
    },
    PatternRow {
        semantic: SemanticType::Address,
        label: &[r"street\s*address", r"^address$", r"address\s*line"],
        attr: &[r"address", r"street"],
    },
    PatternRow {
        semantic: SemanticType::City,
        label: &[r"^city$", r"\bcity\b"],
        attr: &[r"^city$"],
    },
    PatternRow {
        semantic: SemanticType::State,
        label: &[r"^state$", r"province"],
        attr: &[r"^state$", r"province"],
    },
    PatternRow {
        semantic: SemanticType::ZipCode,
        label: &[r"\bzip\b", r"postal\s*code"],
        attr: &[r"zip", r"postal"],
    },
    PatternRow {
        semantic: SemanticType::Country,
        label: &[r"^country$"],
        attr: &[r"^country$"],
    },
    // Work authorization block sits above the custom fallbacks and above
    // salary so "authorized ... salary expectations" style compound labels
    // classify by their leading question.
    PatternRow {
        semantic: SemanticType::AuthorizedInUs,
        label: &[r"authorized\s*to\s*work", r"legally\s*(authorized|eligible)"],
        attr: &[r"authorized", r"work_?auth"],
    },
    PatternRow {
        semantic: SemanticType::RequireSponsorship,
        label: &[r"sponsorship", r"require.*visa", r"need.*sponsorship"],
        attr: &[r"sponsor"],
    },
    PatternRow {
        semantic: SemanticType::VisaStatus,
        label: &[r"visa\s*status", r"immigration\s*status", r"work\s*status"],
        attr: &[r"visa", r"immigration"],
    },
    PatternRow {
        semantic: SemanticType::YearsOfExperience,
        label: &[r"years?\s*(of)?\s*experience", r"experience\s*years"],
        attr: &[r"years_?of_?experience"],
    },
    PatternRow {
        semantic: SemanticType::CurrentCompany,
        label: &[r"current\s*(company|employer)", r"\bemployer\b", r"company\s*name"],
        attr: &[r"company", r"employer", r"organization"],
    },
    PatternRow {
        semantic: SemanticType::CurrentTitle,
        label: &[r"current\s*(title|position|role)", r"job\s*title", r"^title$"],
        attr: &[r"job_?title", r"^title$", r"^role$"],
    },
    PatternRow {
        semantic: SemanticType::HighestDegree,
        label: &[r"highest\s*degree", r"education\s*level", r"^degree$"],
        attr: &[r"degree", r"edu_?degree"],
    },
    PatternRow {
        semantic: SemanticType::University,
        label: &[r"university", r"^school$", r"institution", r"college"],
        attr: &[r"university", r"school", r"college", r"institution"],
    },
    PatternRow {
        semantic: SemanticType::CoverLetterUpload,
        label: &[r"cover\s*letter"],
        attr: &[r"cover_?letter"],
    },
    PatternRow {
        semantic: SemanticType::ResumeUpload,
        label: &[r"resume", r"\bcv\b", r"curriculum\s*vitae"],
        attr: &[r"resume", r"\bcv\b", r"resume_?file"],
    },
    PatternRow {
        semantic: SemanticType::SalaryExpectation,
        label: &[r"(expected|desired)\s*salary", r"salary\s*(expectation|requirement)", r"compensation"],
        attr: &[r"salary", r"compensation"],
    },
    PatternRow {
        semantic: SemanticType::StartDate,
        label: &[r"start\s*date", r"availab(le|ility)\s*date", r"when.*start"],
        attr: &[r"start_?date"],
    },
    PatternRow {
        semantic: SemanticType::HowDidYouHear,
        label: &[r"how\s*did\s*you\s*(hear|find)", r"referral\s*source"],
        attr: &[r"referral", r"source"],
    },
    // EEOC block: hispanic/latino and race before the broader ethnicity row.
    PatternRow {
        semantic: SemanticType::EeocHispanicLatino,
        label: &[r"hispanic", r"latino"],
        attr: &[r"hispanic", r"latino"],
    },
    PatternRow {
        semantic: SemanticType::EeocGender,
        label: &[r"^gender\b", r"gender\s*identity"],
        attr: &[r"gender"],
    },
    PatternRow {
        semantic: SemanticType::EeocRace,
        label: &[r"^race\b"],
        attr: &[r"^race$"],
    },
    PatternRow {
        semantic: SemanticType::EeocEthnicity,
        label: &[r"ethnic"],
        attr: &[r"ethnic"],
    },
    PatternRow {
        semantic: SemanticType::EeocVeteran,
        label: &[r"veteran", r"military"],
        attr: &[r"veteran", r"military"],
    },
    PatternRow {
        semantic: SemanticType::EeocDisability,
        label: &[r"disabilit", r"disabled"],
        attr: &[r"disability"],
    },
];

lazy_static! {
    static ref LABEL_SETS: Vec<RegexSet> = PATTERN_ROWS
        .iter()
        .map(|row| RegexSet::new(row.label).expect("static label patterns compile"))
        .collect();
    static ref ATTR_SETS: Vec<RegexSet> = PATTERN_ROWS
        .iter()
        .map(|row| RegexSet::new(row.attr).expect("static attr patterns compile"))
        .collect();
}

/// Match a normalized label plus the control's name/id attributes against
/// the pattern table. First matching row wins; label evidence is consulted
/// before attribute evidence within each row. Returns `None` when nothing
/// matches (the caller falls back to a custom type).
pub fn classify(normalized_label: &str, name_attr: &str, id_attr: &str) -> Option<SemanticType> {
    let attrs = format!("{} {}", name_attr.to_lowercase(), id_attr.to_lowercase());
    for (idx, row) in PATTERN_ROWS.iter().enumerate() {
        if !normalized_label.is_empty() && LABEL_SETS[idx].is_match(normalized_label) {
            return Some(row.semantic);
        }
        if !attrs.trim().is_empty() && ATTR_SETS[idx].is_match(&attrs) {
            return Some(row.semantic);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize_label;

    fn classify_label(label: &str) -> Option<SemanticType> {
        classify(&normalize_label(label), "", "")
    }

    #[test]
    fn common_identity_fields() {
        assert_eq!(classify_label("First Name *"), Some(SemanticType::FirstName));
        assert_eq!(classify_label("E-mail address"), Some(SemanticType::Email));
        assert_eq!(classify_label("Phone number"), Some(SemanticType::Phone));
        assert_eq!(classify_label("LinkedIn Profile"), Some(SemanticType::Linkedin));
    }

    #[test]
    fn work_authorization_and_sponsorship() {
        assert_eq!(
            classify_label("Are you legally authorized to work in the US?"),
            Some(SemanticType::AuthorizedInUs)
        );
        assert_eq!(
            classify_label("Will you now or in the future require sponsorship?"),
            Some(SemanticType::RequireSponsorship)
        );
    }

    #[test]
    fn eeoc_ordering_prefers_specific_rows() {
        assert_eq!(
            classify_label("Are you Hispanic or Latino?"),
            Some(SemanticType::EeocHispanicLatino)
        );
        assert_eq!(classify_label("Ethnicity"), Some(SemanticType::EeocEthnicity));
        assert_eq!(classify_label("Veteran Status"), Some(SemanticType::EeocVeteran));
    }

    #[test]
    fn attribute_evidence_when_label_missing() {
        assert_eq!(classify("", "job_title", ""), Some(SemanticType::CurrentTitle));
        assert_eq!(classify("", "", "resume_file"), Some(SemanticType::ResumeUpload));
    }

    #[test]
    fn cover_letter_wins_over_resume() {
        assert_eq!(
            classify_label("Cover Letter (optional)"),
            Some(SemanticType::CoverLetterUpload)
        );
    }

    #[test]
    fn unknown_labels_do_not_match() {
        assert_eq!(classify_label("What's your favorite team ritual?"), None);
    }

    #[test]
    fn risk_classification() {
        assert!(SemanticType::AuthorizedInUs.is_high_risk());
        assert!(SemanticType::SalaryExpectation.is_high_risk());
        assert!(SemanticType::EeocGender.is_high_risk());
        assert!(SemanticType::EeocGender.is_eeoc());
        assert!(!SemanticType::AuthorizedInUs.is_eeoc());
        assert!(!SemanticType::Email.is_high_risk());
    }

    #[test]
    fn eeoc_keyword_net_catches_unclassified_questions() {
        assert!(looks_eeoc("Voluntary Self-Identification of Disability"));
        assert!(!looks_eeoc("How did you hear about this role?"));
    }
}
