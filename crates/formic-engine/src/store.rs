//! Single-owner profile store. Loaded once at run start, threaded mutably
//! through the run, and flushed to disk only between job attempts — a
//! resolution pass never observes a concurrent mutation. Test harnesses
//! substitute an in-memory store.

use chrono::Utc;
use formic_common::normalize::{extract_keywords, normalize_label};
use formic_common::profile::{CustomAnswer, PendingQuestion, Profile};
use formic_common::protocol::JobTarget;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::extract::FieldCandidate;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("profile not found: {path}{hint}")]
    NotFound { path: String, hint: String },
    #[error("failed to read profile: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse profile: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub struct ProfileStore {
    profile: Profile,
    path: Option<PathBuf>,
    queued_pending: Vec<PendingQuestion>,
    touched: Vec<String>,
}

impl ProfileStore {
    /// Root directory holding named profiles: `~/.formic/profiles/<name>/`.
    pub fn profiles_root() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".formic").join("profiles"))
    }

    pub fn path_for(name: &str) -> Option<PathBuf> {
        Self::profiles_root().map(|root| root.join(name).join("profile.yaml"))
    }

    /// Names of profiles available on disk.
    pub fn available_profiles() -> Vec<String> {
        let Some(root) = Self::profiles_root() else {
            return Vec::new();
        };
        let Ok(entries) = std::fs::read_dir(&root) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().join("profile.yaml").exists())
            .filter_map(|e| e.file_name().into_string().ok())
            .collect();
        names.sort();
        names
    }

    pub fn load_named(name: &str) -> Result<Self, ProfileError> {
        let path = Self::path_for(name).ok_or_else(|| ProfileError::NotFound {
            path: format!("<home>/.formic/profiles/{name}/profile.yaml"),
            hint: String::new(),
        })?;
        Self::load(&path)
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        if !path.exists() {
            let available = Self::available_profiles();
            let hint = if available.is_empty() {
                String::new()
            } else {
                format!(" (available profiles: {})", available.join(", "))
            };
            return Err(ProfileError::NotFound {
                path: path.display().to_string(),
                hint,
            });
        }

        let content = std::fs::read_to_string(path)?;
        let mut profile: Profile = serde_yaml::from_str(&content)?;
        apply_env_overrides(&mut profile);

        let mut store = Self {
            profile,
            path: Some(path.to_path_buf()),
            queued_pending: Vec::new(),
            touched: Vec::new(),
        };
        let promoted = store.promote_pending();
        if promoted > 0 {
            info!(promoted, "promoted answered pending questions");
            store.save()?;
        }
        Ok(store)
    }

    /// In-memory store for tests and dry runs.
    pub fn in_memory(profile: Profile) -> Self {
        Self {
            profile,
            path: None,
            queued_pending: Vec::new(),
            touched: Vec::new(),
        }
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn profile_dir(&self) -> Option<&Path> {
        self.path.as_deref().and_then(|p| p.parent())
    }

    /// Move pending entries the operator has answered into `answered`.
    /// Pending entries are never auto-answered; this is the only path from
    /// `pending` to `answered`.
    pub fn promote_pending(&mut self) -> usize {
        let custom = &mut self.profile.custom_answers;
        let mut remaining = Vec::with_capacity(custom.pending.len());
        let mut promoted = 0;
        for entry in custom.pending.drain(..) {
            if entry.answer.trim().is_empty() {
                remaining.push(entry);
                continue;
            }
            custom.answered.push(CustomAnswer {
                keywords: extract_keywords(&entry.question),
                question: entry.question,
                answer: entry.answer,
                options: entry.options,
                last_used: None,
            });
            promoted += 1;
        }
        custom.pending = remaining;
        promoted
    }

    /// Queue an unanswered question for the operator. Applied and
    /// deduplicated at the next flush.
    pub fn queue_pending(&mut self, field: &FieldCandidate, job: &JobTarget) {
        self.queued_pending.push(PendingQuestion {
            question: field.label_text.clone(),
            options: field.options.clone(),
            answer: String::new(),
            encountered_at: Some(Utc::now()),
            job: format!("{} - {}", job.company, job.title),
        });
    }

    /// Record that a stored answer was reused, refreshing its recency at the
    /// next flush.
    pub fn touch_answer(&mut self, question: &str) {
        self.touched.push(question.to_string());
    }

    /// Apply queued mutations and persist. Called between job attempts —
    /// never while a resolution pass is in flight. Returns how many pending
    /// questions were actually appended after deduplication.
    pub fn flush(&mut self) -> Result<usize, ProfileError> {
        let now = Utc::now();
        let touched_any = !self.touched.is_empty();
        for question in self.touched.drain(..) {
            if let Some(answer) = self
                .profile
                .custom_answers
                .answered
                .iter_mut()
                .find(|a| a.question == question)
            {
                answer.last_used = Some(now);
            }
        }

        let mut appended = 0;
        let queued: Vec<PendingQuestion> = self.queued_pending.drain(..).collect();
        for entry in queued {
            let norm = normalize_label(&entry.question);
            if norm.is_empty() {
                continue;
            }
            let already_known = self
                .profile
                .custom_answers
                .answered
                .iter()
                .any(|a| normalize_label(&a.question) == norm)
                || self
                    .profile
                    .custom_answers
                    .pending
                    .iter()
                    .any(|p| normalize_label(&p.question) == norm);
            if already_known {
                continue;
            }
            info!(question = %entry.question, "saved pending question for review");
            self.profile.custom_answers.pending.push(entry);
            appended += 1;
        }

        if appended > 0 || touched_any {
            self.save()?;
        }
        Ok(appended)
    }

    fn save(&self) -> Result<(), ProfileError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let yaml = serde_yaml::to_string(&self.profile)?;
        if let Err(e) = std::fs::write(path, yaml) {
            warn!(path = %path.display(), error = %e, "could not persist profile");
            return Err(e.into());
        }
        Ok(())
    }
}

fn apply_env_overrides(profile: &mut Profile) {
    if let Ok(email) = std::env::var("FORMIC_EMAIL") {
        if !email.is_empty() {
            profile.personal.email = email;
        }
    }
    if let Ok(phone) = std::env::var("FORMIC_PHONE") {
        if !phone.is_empty() {
            profile.personal.phone = phone;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::LabelSource;
    use formic_common::protocol::ControlKind;
    use formic_common::semantic::SemanticType;

    fn job() -> JobTarget {
        JobTarget {
            url: "https://jobs.example.com/1".into(),
            company: "Acme".into(),
            title: "Engineer".into(),
            source: None,
        }
    }

    fn custom_field(label: &str) -> FieldCandidate {
        FieldCandidate {
            selector: "#q".into(),
            frame: "main".into(),
            label_text: label.into(),
            label_source: LabelSource::Explicit,
            semantic_type: SemanticType::CustomText,
            confidence: 0.95,
            options: Vec::new(),
            control: ControlKind::Textarea,
            required: false,
        }
    }

    #[test]
    fn pending_dedups_across_flushes() {
        let mut store = ProfileStore::in_memory(Profile::default());
        store.queue_pending(&custom_field("What's your favorite team ritual?"), &job());
        assert_eq!(store.flush().unwrap(), 1);

        // Same question from a second job, differently punctuated.
        store.queue_pending(&custom_field("Whats your favorite team ritual"), &job());
        assert_eq!(store.flush().unwrap(), 0);
        assert_eq!(store.profile().custom_answers.pending.len(), 1);
    }

    #[test]
    fn answered_questions_are_not_re_queued() {
        let mut profile = Profile::default();
        profile.custom_answers.answered.push(CustomAnswer {
            question: "Do you require sponsorship?".into(),
            answer: "No".into(),
            options: Vec::new(),
            keywords: Vec::new(),
            last_used: None,
        });
        let mut store = ProfileStore::in_memory(profile);
        store.queue_pending(&custom_field("Do you require sponsorship"), &job());
        assert_eq!(store.flush().unwrap(), 0);
        assert!(store.profile().custom_answers.pending.is_empty());
    }

    #[test]
    fn promote_moves_only_answered_entries() {
        let mut profile = Profile::default();
        profile.custom_answers.pending = vec![
            PendingQuestion {
                question: "Notice period?".into(),
                answer: "Two weeks".into(),
                ..Default::default()
            },
            PendingQuestion {
                question: "Favorite ritual?".into(),
                ..Default::default()
            },
        ];
        let mut store = ProfileStore::in_memory(profile);
        assert_eq!(store.promote_pending(), 1);
        assert_eq!(store.profile().custom_answers.answered.len(), 1);
        assert_eq!(store.profile().custom_answers.pending.len(), 1);
        assert_eq!(
            store.profile().custom_answers.answered[0].answer,
            "Two weeks"
        );
    }

    #[test]
    fn touch_refreshes_recency_on_flush() {
        let mut profile = Profile::default();
        profile.custom_answers.answered.push(CustomAnswer {
            question: "Do you require sponsorship?".into(),
            answer: "No".into(),
            options: Vec::new(),
            keywords: Vec::new(),
            last_used: None,
        });
        let mut store = ProfileStore::in_memory(profile);
        store.touch_answer("Do you require sponsorship?");
        store.flush().unwrap();
        assert!(store.profile().custom_answers.answered[0].last_used.is_some());
    }
}
