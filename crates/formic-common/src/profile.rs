//! Operator profile: the static facts used by the profile tier plus the two
//! learned collections (`answered`, `pending`). The shape mirrors the YAML
//! the operator maintains; every section defaults so a minimal profile still
//! loads.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::semantic::SemanticType;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Profile {
    pub personal: Personal,
    pub location: Location,
    pub work_authorization: WorkAuthorization,
    pub experience: Experience,
    pub education: Education,
    pub resume: ResumeRef,
    pub salary: Salary,
    pub availability: Availability,
    pub diversity: Diversity,
    pub default_answers: std::collections::BTreeMap<String, String>,
    pub custom_answers: CustomAnswers,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Personal {
    pub first_name: String,
    pub last_name: String,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub linkedin: String,
    pub github: String,
    pub portfolio: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkAuthorization {
    pub authorized_in_us: bool,
    pub require_sponsorship: bool,
    pub visa_status: String,
}

impl Default for WorkAuthorization {
    fn default() -> Self {
        Self {
            authorized_in_us: true,
            require_sponsorship: false,
            visa_status: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Experience {
    pub years_of_experience: u32,
    pub current_company: String,
    pub current_title: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Education {
    pub highest_degree: String,
    pub field_of_study: String,
    pub university: String,
    pub graduation_year: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResumeRef {
    pub path: String,
    pub cover_letter_path: String,
}

impl ResumeRef {
    /// Resolve the resume file: explicit absolute path, then relative to the
    /// profile directory, then `resume.pdf` next to the profile.
    pub fn resolve(&self, profile_dir: Option<&Path>) -> Option<PathBuf> {
        if !self.path.is_empty() {
            let p = PathBuf::from(&self.path);
            if p.is_absolute() && p.exists() {
                return Some(p);
            }
            if let Some(dir) = profile_dir {
                let joined = dir.join(&p);
                if joined.exists() {
                    return Some(joined);
                }
            }
        }
        if let Some(dir) = profile_dir {
            for candidate in ["resume.pdf", "Resume.pdf"] {
                let p = dir.join(candidate);
                if p.exists() {
                    return Some(p);
                }
            }
        }
        None
    }

    pub fn resolve_cover_letter(&self, profile_dir: Option<&Path>) -> Option<PathBuf> {
        if self.cover_letter_path.is_empty() {
            return None;
        }
        let p = PathBuf::from(&self.cover_letter_path);
        if p.is_absolute() && p.exists() {
            return Some(p);
        }
        profile_dir
            .map(|dir| dir.join(&p))
            .filter(|joined| joined.exists())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Salary {
    pub expected_salary: String,
    pub currency: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Availability {
    pub start_date: String,
    pub available_immediately: bool,
}

/// EEOC answers the operator chose to pre-fill. Left empty, the decline
/// tier handles these categories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Diversity {
    pub gender: String,
    pub race: String,
    pub ethnicity: String,
    pub hispanic_latino: String,
    pub veteran_status: String,
    pub disability_status: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomAnswers {
    pub answered: Vec<CustomAnswer>,
    pub pending: Vec<PendingQuestion>,
}

/// A learned question → answer pair. `keywords` drive matching; `last_used`
/// breaks ties between equally specific matches.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomAnswer {
    pub question: String,
    pub answer: String,
    pub options: Vec<String>,
    pub keywords: Vec<String>,
    pub last_used: Option<DateTime<Utc>>,
}

impl Default for CustomAnswer {
    fn default() -> Self {
        Self {
            question: String::new(),
            answer: String::new(),
            options: Vec::new(),
            keywords: Vec::new(),
            last_used: None,
        }
    }
}

/// A question the pipeline could not answer, awaiting operator input.
/// Never auto-answered; promoted to `answered` once the operator fills in
/// `answer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingQuestion {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
    pub encountered_at: Option<DateTime<Utc>>,
    pub job: String,
}

impl Profile {
    /// Tier-1 mapping from semantic type to profile attribute. Booleans
    /// render as "Yes"/"No" so they line up with typical option lists.
    /// Upload and custom types have no direct attribute.
    pub fn value_for(&self, semantic: SemanticType) -> Option<String> {
        let yes_no = |b: bool| Some(if b { "Yes" } else { "No" }.to_string());
        let non_empty = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.to_string())
            }
        };
        match semantic {
            SemanticType::FirstName => non_empty(&self.personal.first_name),
            SemanticType::LastName => non_empty(&self.personal.last_name),
            SemanticType::FullName => non_empty(&self.personal.full_name).or_else(|| {
                if self.personal.first_name.is_empty() || self.personal.last_name.is_empty() {
                    None
                } else {
                    Some(format!(
                        "{} {}",
                        self.personal.first_name, self.personal.last_name
                    ))
                }
            }),
            SemanticType::Email => non_empty(&self.personal.email),
            SemanticType::Phone => non_empty(&self.personal.phone),
            SemanticType::Linkedin => non_empty(&self.personal.linkedin),
            SemanticType::Github => non_empty(&self.personal.github),
            SemanticType::Portfolio => non_empty(&self.personal.portfolio),
            SemanticType::Address => non_empty(&self.location.address),
            SemanticType::City => non_empty(&self.location.city),
            SemanticType::State => non_empty(&self.location.state),
            SemanticType::ZipCode => non_empty(&self.location.zip_code),
            SemanticType::Country => non_empty(&self.location.country),
            SemanticType::AuthorizedInUs => yes_no(self.work_authorization.authorized_in_us),
            SemanticType::RequireSponsorship => yes_no(self.work_authorization.require_sponsorship),
            SemanticType::VisaStatus => non_empty(&self.work_authorization.visa_status),
            SemanticType::YearsOfExperience => {
                if self.experience.years_of_experience == 0 {
                    None
                } else {
                    Some(self.experience.years_of_experience.to_string())
                }
            }
            SemanticType::CurrentCompany => non_empty(&self.experience.current_company),
            SemanticType::CurrentTitle => non_empty(&self.experience.current_title),
            SemanticType::HighestDegree => non_empty(&self.education.highest_degree),
            SemanticType::University => non_empty(&self.education.university),
            SemanticType::SalaryExpectation => non_empty(&self.salary.expected_salary),
            SemanticType::StartDate => non_empty(&self.availability.start_date),
            SemanticType::HowDidYouHear => self
                .default_answers
                .get("how_did_you_hear")
                .filter(|s| !s.is_empty())
                .cloned(),
            SemanticType::EeocGender => non_empty(&self.diversity.gender),
            SemanticType::EeocRace => non_empty(&self.diversity.race),
            SemanticType::EeocEthnicity => non_empty(&self.diversity.ethnicity)
                .or_else(|| non_empty(&self.diversity.race)),
            SemanticType::EeocHispanicLatino => non_empty(&self.diversity.hispanic_latino),
            SemanticType::EeocVeteran => non_empty(&self.diversity.veteran_status),
            SemanticType::EeocDisability => non_empty(&self.diversity.disability_status),
            SemanticType::ResumeUpload
            | SemanticType::CoverLetterUpload
            | SemanticType::CustomText
            | SemanticType::CustomChoice => None,
        }
    }
}
