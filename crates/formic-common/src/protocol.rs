//! Wire types exchanged with the injected DOM probe. The probe serializes a
//! `FormSnapshot` as JSON; backends deserialize it and hand it to the
//! extractor untouched. Field names here are the protocol — keep them in
//! sync with `probe.js`.

use serde::{Deserialize, Serialize};

/// Envelope for every probe call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResponse {
    Ok {
        #[serde(flatten)]
        data: ProbeData,
    },
    Error {
        code: String,
        message: String,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProbeData {
    Snapshot(Box<FormSnapshot>),
    Action(ActionResult),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// One full read of the page: top document plus reachable same-origin
/// frames, with enough ambient markers for platform detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormSnapshot {
    pub page: PageInfo,
    #[serde(default)]
    pub frames: Vec<FrameDocument>,
    #[serde(default)]
    pub markers: DomMarkers,
}

impl FormSnapshot {
    /// All controls across frames, in document order.
    pub fn controls(&self) -> impl Iterator<Item = (&str, &RawControl)> {
        self.frames
            .iter()
            .flat_map(|f| f.controls.iter().map(move |c| (f.frame.as_str(), c)))
    }

    pub fn control_count(&self) -> usize {
        self.frames.iter().map(|f| f.controls.len()).sum()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageInfo {
    pub url: String,
    #[serde(default)]
    pub title: String,
}

/// One document (the main page is frame `"main"`; iframes carry a stable
/// path like `"iframe:0"` or the frame element's selector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameDocument {
    pub frame: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub controls: Vec<RawControl>,
}

/// A single input-like DOM node, as observed by the probe. The probe only
/// reports what the DOM says; semantic interpretation happens engine-side.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawControl {
    pub selector: String,
    #[serde(default)]
    pub tag: String,
    #[serde(rename = "kind")]
    pub kind: ControlKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
    /// Text from an explicit `<label for=>` association or a wrapping label.
    #[serde(default)]
    pub explicit_label: String,
    #[serde(default)]
    pub aria_label: String,
    #[serde(default)]
    pub placeholder: String,
    /// Nearest preceding visible text within the probe's bounded walk.
    #[serde(default)]
    pub nearby_text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub visible: bool,
    #[serde(default)]
    pub value: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlKind {
    Text,
    Textarea,
    Select,
    Radio,
    Checkbox,
    File,
}

impl ControlKind {
    /// Bounded option set → the field is a choice, not free text.
    pub fn is_choice(self) -> bool {
        matches!(self, ControlKind::Select | ControlKind::Radio | ControlKind::Checkbox)
    }
}

/// Page-level markers the detector consumes: meta tags, iframe sources and
/// distinctive class/id fragments, plus a flag for verification challenges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomMarkers {
    #[serde(default)]
    pub meta: Vec<MetaTag>,
    #[serde(default)]
    pub iframe_srcs: Vec<String>,
    #[serde(default)]
    pub body_markers: Vec<String>,
    /// True when the probe found a captcha/turnstile style widget.
    #[serde(default)]
    pub challenge: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaTag {
    pub name: String,
    #[serde(default)]
    pub content: String,
}

/// A job application target. Identity key is the URL; one attempt per
/// target per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobTarget {
    pub url: String,
    pub company: String,
    pub title: String,
    /// Optional hint about the hosting platform, advisory only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probe_envelope_round_trips() {
        let json = r##"{
            "status": "ok",
            "page": {"url": "https://jobs.example.com/apply", "title": "Apply"},
            "frames": [{
                "frame": "main",
                "url": "https://jobs.example.com/apply",
                "controls": [{
                    "selector": "#email",
                    "tag": "input",
                    "kind": "text",
                    "name": "email",
                    "id": "email",
                    "explicit_label": "Email",
                    "visible": true
                }]
            }],
            "markers": {"challenge": false}
        }"##;
        let resp: ProbeResponse = serde_json::from_str(json).unwrap();
        match resp {
            ProbeResponse::Ok {
                data: ProbeData::Snapshot(snap),
            } => {
                assert_eq!(snap.control_count(), 1);
                let (frame, control) = snap.controls().next().unwrap();
                assert_eq!(frame, "main");
                assert_eq!(control.kind, ControlKind::Text);
                assert_eq!(control.explicit_label, "Email");
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn probe_error_envelope() {
        let json = r#"{"status": "error", "code": "no_document", "message": "detached"}"#;
        let resp: ProbeResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(resp, ProbeResponse::Error { .. }));
    }

    #[test]
    fn action_result_round_trips() {
        let json = r#"{"status": "ok", "success": true, "message": null}"#;
        let resp: ProbeResponse = serde_json::from_str(json).unwrap();
        match resp {
            ProbeResponse::Ok {
                data: ProbeData::Action(act),
            } => assert!(act.success),
            other => panic!("unexpected response: {:?}", other),
        }
    }
}
