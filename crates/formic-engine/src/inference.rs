//! Inference-tier transport: a thin client for the Anthropic Messages API.
//! The engine treats it as a black-box classifier with a fixed contract —
//! request {label, question_text, options[]}, reply {value, qualitative
//! confidence}. Missing credentials disable the tier without touching the
//! rest of the pipeline.

use formic_common::profile::{CustomAnswer, Profile};
use formic_common::protocol::JobTarget;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::resolve::{MatchQuality, best_option};

const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const MAX_ANSWER_TOKENS: u32 = 500;
/// Cap on previously answered questions included as prompt context.
const MAX_CONTEXT_ANSWERS: usize = 15;

#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("inference request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("inference response malformed: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

impl Confidence {
    pub fn score(self) -> f32 {
        match self {
            Confidence::Low => 0.4,
            Confidence::Medium => 0.7,
            Confidence::High => 0.9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct InferenceRequest {
    pub label: String,
    pub question_text: String,
    pub options: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct InferenceReply {
    pub value: String,
    pub confidence: Confidence,
}

#[derive(Serialize)]
struct MessagesBody<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<Message<'a>>,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'a str,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: String,
}

pub struct InferenceClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl InferenceClient {
    pub fn new(api_key: String, model: Option<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        }
    }

    /// `None` when no credentials are configured — the tier is then absent
    /// from the chain entirely.
    pub fn from_env(model: Option<String>) -> Option<Self> {
        std::env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|k| !k.is_empty())
            .map(|key| Self::new(key, model))
    }

    /// Ask for a value for one field. `Ok(None)` means the model declined to
    /// answer (the tier misses and the chain continues).
    pub async fn answer(
        &self,
        request: &InferenceRequest,
        profile: &Profile,
        job: &JobTarget,
    ) -> Result<Option<InferenceReply>, InferenceError> {
        let prompt = build_prompt(request, profile, job);
        let body = MessagesBody {
            model: &self.model,
            max_tokens: MAX_ANSWER_TOKENS,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        let parsed: MessagesResponse = response.json().await?;
        let text = parsed
            .content
            .first()
            .map(|b| b.text.trim().to_string())
            .ok_or_else(|| InferenceError::Malformed("empty content".into()))?;

        debug!(label = %request.label, answer = %text, "inference reply");
        Ok(interpret_answer(&text, &request.options))
    }
}

/// Map the raw model text onto the reply contract. For choice fields the
/// answer must land on an offered option; the match quality drives the
/// qualitative confidence.
pub fn interpret_answer(text: &str, options: &[String]) -> Option<InferenceReply> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("skip") {
        return None;
    }

    if options.is_empty() {
        return Some(InferenceReply {
            value: trimmed.to_string(),
            confidence: Confidence::Medium,
        });
    }

    let (option, quality) = best_option(trimmed, options)?;
    let confidence = match quality {
        MatchQuality::Exact => Confidence::High,
        MatchQuality::Prefix | MatchQuality::Contains => Confidence::Medium,
        MatchQuality::Fuzzy => Confidence::Low,
    };
    Some(InferenceReply {
        value: option,
        confidence,
    })
}

fn build_prompt(request: &InferenceRequest, profile: &Profile, job: &JobTarget) -> String {
    let mut prompt = String::new();
    prompt.push_str(
        "You are helping fill out a job application form. Use the candidate's \
         profile and their previously answered questions to provide the best \
         response.\n\nCANDIDATE PROFILE:\n",
    );
    prompt.push_str(&profile_summary(profile));
    prompt.push_str("\nPREVIOUSLY ANSWERED QUESTIONS:\n");
    prompt.push_str(&answered_context(&profile.custom_answers.answered));
    prompt.push_str(&format!(
        "\nJOB DETAILS:\n- Position: {}\n- Company: {}\n",
        job.title, job.company
    ));
    prompt.push_str(&format!(
        "\nCURRENT FORM FIELD:\n- Label: {}\n- Question: {}\n",
        request.label, request.question_text
    ));
    if !request.options.is_empty() {
        prompt.push_str(&format!("- Options: {}\n", request.options.join(", ")));
    }
    prompt.push_str(
        "\nINSTRUCTIONS:\n\
         1. If this is similar to a previously answered question, reuse that answer.\n\
         2. If options are listed, respond with EXACTLY one of them.\n\
         3. For Yes/No questions, respond with just \"Yes\" or \"No\".\n\
         4. For text fields, provide a concise, professional response.\n\
         5. For \"Have you worked at [Company]\" questions, answer \"No\" unless the profile shows employment there.\n\
         6. If you cannot determine a reasonable answer, respond with \"SKIP\".\n\
         \nYOUR RESPONSE (just the value, no explanation):",
    );
    prompt
}

fn profile_summary(profile: &Profile) -> String {
    format!(
        "- Name: {}\n- Current role: {} at {}\n- Years of experience: {}\n\
         - Education: {} in {} from {}\n- Location: {}, {}\n\
         - Authorized to work in the US: {}\n- Requires sponsorship: {}\n",
        profile.personal.full_name,
        profile.experience.current_title,
        profile.experience.current_company,
        profile.experience.years_of_experience,
        profile.education.highest_degree,
        profile.education.field_of_study,
        profile.education.university,
        profile.location.city,
        profile.location.state,
        if profile.work_authorization.authorized_in_us { "Yes" } else { "No" },
        if profile.work_authorization.require_sponsorship { "Yes" } else { "No" },
    )
}

fn answered_context(answered: &[CustomAnswer]) -> String {
    if answered.is_empty() {
        return "None available\n".to_string();
    }
    let mut out = String::new();
    for answer in answered.iter().take(MAX_CONTEXT_ANSWERS) {
        out.push_str(&format!("Q: {}\nA: {}\n", answer.question, answer.answer));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn skip_means_no_answer() {
        assert!(interpret_answer("SKIP", &[]).is_none());
        assert!(interpret_answer("  skip  ", &opts(&["Yes", "No"])).is_none());
    }

    #[test]
    fn exact_option_match_is_high_confidence() {
        let reply = interpret_answer("Yes", &opts(&["Yes", "No"])).unwrap();
        assert_eq!(reply.value, "Yes");
        assert_eq!(reply.confidence, Confidence::High);
    }

    #[test]
    fn partial_option_match_is_medium() {
        let reply = interpret_answer(
            "No",
            &opts(&["No, I do not require sponsorship", "Yes, I do"]),
        )
        .unwrap();
        assert_eq!(reply.value, "No, I do not require sponsorship");
        assert_eq!(reply.confidence, Confidence::Medium);
    }

    #[test]
    fn free_text_is_medium() {
        let reply = interpret_answer("I lead weekly design reviews.", &[]).unwrap();
        assert_eq!(reply.confidence, Confidence::Medium);
    }

    #[test]
    fn unmatched_choice_answer_is_dropped() {
        assert!(interpret_answer("Trampoline", &opts(&["Yes", "No"])).is_none());
    }
}
