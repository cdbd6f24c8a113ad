//! Operator confirmation channel: the summary presented before submission
//! and the decision contract. The engine renders the summary; the surface
//! (terminal prompt, or the browser itself in watch mode) is supplied by the
//! caller.

use async_trait::async_trait;
use formic_common::protocol::JobTarget;
use serde::{Deserialize, Serialize};

use crate::resolve::{ResolvedValue, SourceTier};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Decline,
}

#[async_trait]
pub trait ConfirmationChannel: Send {
    /// Present the summary and block for an explicit decision.
    async fn confirm(&mut self, summary: &ConfirmationSummary) -> std::io::Result<Decision>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HighRiskLine {
    pub label: String,
    pub value: Option<String>,
    pub source_tier: SourceTier,
}

/// What the operator sees: job identity, how much was filled, and every
/// high-risk field with its resolution outcome — including the unresolved
/// ones, which is exactly what needs human eyes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationSummary {
    pub company: String,
    pub title: String,
    pub filled_count: usize,
    pub total_fields: usize,
    pub high_risk: Vec<HighRiskLine>,
    pub unresolved: Vec<String>,
}

impl ConfirmationSummary {
    pub fn build(job: &JobTarget, resolved: &[ResolvedValue]) -> Self {
        let high_risk = resolved
            .iter()
            .filter(|r| r.is_high_risk())
            .map(|r| HighRiskLine {
                label: r.field.label_text.clone(),
                value: r.value.clone(),
                source_tier: r.source_tier,
            })
            .collect();
        let unresolved = resolved
            .iter()
            .filter(|r| !r.is_resolved())
            .map(|r| r.field.label_text.clone())
            .collect();
        Self {
            company: job.company.clone(),
            title: job.title.clone(),
            filled_count: resolved.iter().filter(|r| r.is_resolved()).count(),
            total_fields: resolved.len(),
            high_risk,
            unresolved,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "\n{} - {}\nFilled {} of {} fields.\n",
            self.company, self.title, self.filled_count, self.total_fields
        ));
        if !self.high_risk.is_empty() {
            out.push_str("\nHigh-risk fields (review carefully):\n");
            for line in &self.high_risk {
                match &line.value {
                    Some(value) => out.push_str(&format!(
                        "  {} = {:?}  [{}]\n",
                        line.label,
                        value,
                        tier_name(line.source_tier)
                    )),
                    None => out.push_str(&format!("  {} = <unresolved>\n", line.label)),
                }
            }
        }
        if !self.unresolved.is_empty() {
            out.push_str("\nLeft untouched:\n");
            for label in &self.unresolved {
                out.push_str(&format!("  {label}\n"));
            }
        }
        out
    }
}

fn tier_name(tier: SourceTier) -> &'static str {
    match tier {
        SourceTier::Profile => "profile",
        SourceTier::CustomAnswer => "custom answer",
        SourceTier::Llm => "inference",
        SourceTier::Decline => "declined to disclose",
        SourceTier::Unresolved => "unresolved",
    }
}
