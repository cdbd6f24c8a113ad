//! DOM snapshot → semantically typed field candidates.
//!
//! Candidates are produced fresh on every pass and never persisted. The
//! semantic type assigned here is final: downstream stages attach values or
//! decline, they never reclassify. Extraction is deterministic — the same
//! snapshot always yields the same candidate sequence.

use formic_common::normalize::normalize_label;
use formic_common::protocol::{ControlKind, FormSnapshot, RawControl};
use formic_common::semantic::{self, SemanticType};
use serde::{Deserialize, Serialize};

use crate::ats::Detection;

/// Where the label text came from. Determines the confidence tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelSource {
    /// `<label for=>` association or a wrapping label element.
    Explicit,
    /// Placeholder or accessible-label attribute.
    Attribute,
    /// Nearest preceding visible text within the probe's bounded walk.
    Proximity,
    /// No label at all; the name attribute stands in.
    NameFallback,
}

impl LabelSource {
    pub fn confidence(self) -> f32 {
        match self {
            LabelSource::Explicit => 0.95,
            LabelSource::Attribute => 0.8,
            LabelSource::Proximity => 0.5,
            LabelSource::NameFallback => 0.3,
        }
    }
}

/// One form control with a semantic interpretation attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldCandidate {
    pub selector: String,
    pub frame: String,
    pub label_text: String,
    pub label_source: LabelSource,
    pub semantic_type: SemanticType,
    pub confidence: f32,
    pub options: Vec<String>,
    pub control: ControlKind,
    pub required: bool,
}

impl FieldCandidate {
    /// Identity for rescan merging: a control is the same control if it has
    /// the same selector in the same frame.
    pub fn identity(&self) -> (&str, &str) {
        (self.frame.as_str(), self.selector.as_str())
    }

    /// Risk is a static property of the semantic type, never of detection
    /// confidence.
    pub fn is_high_risk(&self) -> bool {
        self.semantic_type.is_high_risk()
    }
}

/// Extract candidates from a snapshot. Frame ordering follows the detection
/// hint (iframe-hosting platforms scan iframes first) but every frame is
/// always scanned — the hint re-orders, it never gates.
pub fn extract(snapshot: &FormSnapshot, detection: &Detection) -> Vec<FieldCandidate> {
    let mut frames: Vec<_> = snapshot.frames.iter().collect();
    if detection.platform.expects_iframe() {
        frames.sort_by_key(|f| f.frame == "main");
    }

    let mut candidates = Vec::new();
    for frame in frames {
        for control in &frame.controls {
            if !control.visible {
                continue;
            }
            candidates.push(analyze(frame.frame.as_str(), control));
        }
    }

    // A generically labeled file input ("Attach") on a form with no resume
    // field yet is the resume slot; later unlabeled ones stay custom.
    if !candidates
        .iter()
        .any(|c| c.semantic_type == SemanticType::ResumeUpload)
    {
        if let Some(first_file) = candidates
            .iter_mut()
            .find(|c| c.control == ControlKind::File && c.semantic_type.is_custom())
        {
            first_file.semantic_type = SemanticType::ResumeUpload;
        }
    }

    candidates
}

fn analyze(frame: &str, control: &RawControl) -> FieldCandidate {
    let (label_text, label_source) = pick_label(control);
    let normalized = normalize_label(&label_text);

    let semantic_type = semantic::classify(&normalized, &control.name, &control.id)
        .unwrap_or_else(|| {
            if control.kind.is_choice() || !control.options.is_empty() {
                SemanticType::CustomChoice
            } else {
                SemanticType::CustomText
            }
        });

    FieldCandidate {
        selector: control.selector.clone(),
        frame: frame.to_string(),
        label_text,
        label_source,
        semantic_type,
        confidence: label_source.confidence(),
        options: control.options.clone(),
        control: control.kind,
        required: control.required,
    }
}

/// Label priority: explicit association > placeholder/aria attribute >
/// proximity text > name attribute. First non-empty source wins and fixes
/// the confidence tier.
fn pick_label(control: &RawControl) -> (String, LabelSource) {
    let explicit = control.explicit_label.trim();
    if !explicit.is_empty() {
        return (explicit.to_string(), LabelSource::Explicit);
    }
    let aria = control.aria_label.trim();
    if !aria.is_empty() {
        return (aria.to_string(), LabelSource::Attribute);
    }
    let placeholder = control.placeholder.trim();
    if !placeholder.is_empty() {
        return (placeholder.to_string(), LabelSource::Attribute);
    }
    let nearby = control.nearby_text.trim();
    if !nearby.is_empty() {
        return (nearby.to_string(), LabelSource::Proximity);
    }
    (control.name.clone(), LabelSource::NameFallback)
}

/// Merge a rescan pass into the initial set by selector identity, returning
/// only the newly revealed candidates. Fields from the initial pass keep
/// their original classification and are not re-resolved.
pub fn newly_revealed(
    initial: &[FieldCandidate],
    rescan: Vec<FieldCandidate>,
) -> Vec<FieldCandidate> {
    rescan
        .into_iter()
        .filter(|c| !initial.iter().any(|seen| seen.identity() == c.identity()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ats::Detection;
    use formic_common::protocol::{FrameDocument, PageInfo};

    fn control(selector: &str, kind: ControlKind) -> RawControl {
        RawControl {
            selector: selector.into(),
            tag: "input".into(),
            kind,
            name: String::new(),
            id: String::new(),
            explicit_label: String::new(),
            aria_label: String::new(),
            placeholder: String::new(),
            nearby_text: String::new(),
            options: Vec::new(),
            required: false,
            visible: true,
            value: String::new(),
        }
    }

    fn snapshot(controls: Vec<RawControl>) -> FormSnapshot {
        FormSnapshot {
            page: PageInfo {
                url: "https://example.com".into(),
                title: String::new(),
            },
            frames: vec![FrameDocument {
                frame: "main".into(),
                url: "https://example.com".into(),
                controls,
            }],
            markers: Default::default(),
        }
    }

    #[test]
    fn label_priority_and_confidence_tiers() {
        let mut explicit = control("#a", ControlKind::Text);
        explicit.explicit_label = "Email".into();
        explicit.placeholder = "ignored".into();

        let mut attr = control("#b", ControlKind::Text);
        attr.placeholder = "Phone number".into();

        let mut proximity = control("#c", ControlKind::Text);
        proximity.nearby_text = "LinkedIn profile".into();

        let fields = extract(&snapshot(vec![explicit, attr, proximity]), &Detection::generic());
        assert_eq!(fields[0].label_source, LabelSource::Explicit);
        assert_eq!(fields[0].confidence, 0.95);
        assert_eq!(fields[0].semantic_type, SemanticType::Email);
        assert_eq!(fields[1].label_source, LabelSource::Attribute);
        assert_eq!(fields[1].confidence, 0.8);
        assert_eq!(fields[1].semantic_type, SemanticType::Phone);
        assert_eq!(fields[2].label_source, LabelSource::Proximity);
        assert_eq!(fields[2].confidence, 0.5);
        assert_eq!(fields[2].semantic_type, SemanticType::Linkedin);
    }

    #[test]
    fn unmatched_labels_fall_back_by_option_boundedness() {
        let mut free = control("#q1", ControlKind::Textarea);
        free.explicit_label = "What's your favorite team ritual?".into();

        let mut bounded = control("#q2", ControlKind::Select);
        bounded.explicit_label = "Pick a department".into();
        bounded.options = vec!["Engineering".into(), "Design".into()];

        let fields = extract(&snapshot(vec![free, bounded]), &Detection::generic());
        assert_eq!(fields[0].semantic_type, SemanticType::CustomText);
        assert_eq!(fields[1].semantic_type, SemanticType::CustomChoice);
    }

    #[test]
    fn invisible_controls_are_skipped() {
        let mut hidden = control("#h", ControlKind::Text);
        hidden.visible = false;
        let fields = extract(&snapshot(vec![hidden]), &Detection::generic());
        assert!(fields.is_empty());
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut a = control("#a", ControlKind::Text);
        a.explicit_label = "First Name".into();
        let mut b = control("#b", ControlKind::Select);
        b.explicit_label = "Veteran Status".into();
        b.options = vec!["Yes".into(), "No".into()];
        let snap = snapshot(vec![a, b]);

        let first = extract(&snap, &Detection::generic());
        let second = extract(&snap, &Detection::generic());
        assert_eq!(first.len(), second.len());
        for (x, y) in first.iter().zip(second.iter()) {
            assert_eq!(x.identity(), y.identity());
            assert_eq!(x.semantic_type, y.semantic_type);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[test]
    fn first_generic_file_input_becomes_the_resume_slot() {
        let mut attach = control("#attach1", ControlKind::File);
        attach.nearby_text = "Attach".into();
        let mut second = control("#attach2", ControlKind::File);
        second.nearby_text = "Attach".into();

        let fields = extract(&snapshot(vec![attach, second]), &Detection::generic());
        assert_eq!(fields[0].semantic_type, SemanticType::ResumeUpload);
        assert_eq!(fields[1].semantic_type, SemanticType::CustomText);
    }

    #[test]
    fn labeled_cover_letter_file_is_not_stolen_by_the_resume_rule() {
        let mut cover = control("#cover", ControlKind::File);
        cover.explicit_label = "Cover Letter".into();
        let mut resume = control("#resume", ControlKind::File);
        resume.explicit_label = "Resume/CV".into();

        let fields = extract(&snapshot(vec![cover, resume]), &Detection::generic());
        assert_eq!(fields[0].semantic_type, SemanticType::CoverLetterUpload);
        assert_eq!(fields[1].semantic_type, SemanticType::ResumeUpload);
    }

    #[test]
    fn rescan_merge_keeps_only_new_selectors() {
        let mut a = control("#a", ControlKind::Text);
        a.explicit_label = "Email".into();
        let initial = extract(&snapshot(vec![a.clone()]), &Detection::generic());

        let mut revealed = control("#sponsorship_details", ControlKind::Textarea);
        revealed.explicit_label = "Please describe your visa situation".into();
        let rescan = extract(&snapshot(vec![a, revealed]), &Detection::generic());

        let fresh = newly_revealed(&initial, rescan);
        assert_eq!(fresh.len(), 1);
        assert_eq!(fresh[0].selector, "#sponsorship_details");
    }
}
