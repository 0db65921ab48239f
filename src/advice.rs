// src/advice.rs
//! Parsing of the advice endpoint's marker-delimited text.
//!
//! The endpoint answers with a single text blob laid out as
//!
//! ```text
//! TITLE: <title>
//! CONTENT: <body>
//! POINTS:
//! - success: <point>
//! - warning: <point>
//! ```
//!
//! Anything that does not follow this layout degrades to
//! [`AdviceResponse::default`], so callers never see an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_TITLE: &str = "Market Insight";
pub const DEFAULT_CONTENT: &str = "No market data available at this time.";
pub const DEFAULT_POINT: &str = "Check back later for updated insights";

const TITLE_MARKER: &str = "TITLE:";
const CONTENT_MARKER: &str = "CONTENT:";
const POINTS_MARKER: &str = "POINTS:";

const SEVERITY_MARKERS: [(&str, Severity); 3] = [
    ("success:", Severity::Success),
    ("warning:", Severity::Warning),
    ("info:", Severity::Info),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Success,
    Warning,
}

impl Severity {
    /// Colour used when rendering a point of this severity.
    pub fn color(self) -> &'static str {
        match self {
            Severity::Info => "#3b82f6",
            Severity::Success => "#22c55e",
            Severity::Warning => "#f59e0b",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdvicePoint {
    pub text: String,
    pub severity: Severity,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AdviceResponse {
    pub title: String,
    pub content: String,
    pub points: Vec<AdvicePoint>,
}

impl Default for AdviceResponse {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            content: DEFAULT_CONTENT.to_string(),
            points: default_points(),
        }
    }
}

impl AdviceResponse {
    /// True when the response is the fallback rather than parsed advice.
    pub fn is_fallback(&self) -> bool {
        *self == Self::default()
    }
}

fn default_points() -> Vec<AdvicePoint> {
    vec![AdvicePoint {
        text: DEFAULT_POINT.to_string(),
        severity: Severity::Info,
    }]
}

/// Payload shapes the advice endpoint produces: either a bare string or an
/// object carrying the text under `answer` or `advice`.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum AdvicePayload {
    Text(String),
    Keyed {
        #[serde(default)]
        answer: Option<String>,
        #[serde(default)]
        advice: Option<String>,
    },
}

impl AdvicePayload {
    /// The advice text, taking the first non-blank of `answer` then `advice`.
    pub fn text(&self) -> Option<&str> {
        let text = match self {
            AdvicePayload::Text(text) => Some(text.as_str()),
            AdvicePayload::Keyed { answer, advice } => [answer, advice]
                .into_iter()
                .flatten()
                .map(String::as_str)
                .find(|text| !text.trim().is_empty()),
        };
        text.filter(|text| !text.trim().is_empty())
    }
}

pub fn parse_advice(payload: Option<&AdvicePayload>) -> AdviceResponse {
    match payload.and_then(AdvicePayload::text) {
        Some(text) => parse_marked_text(text),
        None => AdviceResponse::default(),
    }
}

/// Parses advice straight from a decoded JSON body. Shapes other than a
/// string or an object with `answer`/`advice` yield the default.
pub fn parse_advice_value(value: &Value) -> AdviceResponse {
    let payload = AdvicePayload::deserialize(value).ok();
    parse_advice(payload.as_ref())
}

pub fn parse_marked_text(text: &str) -> AdviceResponse {
    let Some((title, content, points)) = split_sections(text) else {
        return AdviceResponse::default();
    };

    let points: Vec<AdvicePoint> = points.lines().filter_map(parse_point).collect();

    AdviceResponse {
        title: non_blank_or(title, DEFAULT_TITLE),
        content: non_blank_or(content, DEFAULT_CONTENT),
        points: if points.is_empty() {
            default_points()
        } else {
            points
        },
    }
}

// Markers must appear in order; each is searched after the previous one.
fn split_sections(text: &str) -> Option<(&str, &str, &str)> {
    let title_start = text.find(TITLE_MARKER)? + TITLE_MARKER.len();
    let content_at = title_start + text[title_start..].find(CONTENT_MARKER)?;
    let content_start = content_at + CONTENT_MARKER.len();
    let points_at = content_start + text[content_start..].find(POINTS_MARKER)?;
    let points_start = points_at + POINTS_MARKER.len();

    Some((
        &text[title_start..content_at],
        &text[content_start..points_at],
        &text[points_start..],
    ))
}

fn parse_point(line: &str) -> Option<AdvicePoint> {
    let body = line.trim().strip_prefix('-')?.trim();
    // ASCII lowering keeps byte offsets aligned with `body`.
    let lower = body.to_ascii_lowercase();

    let marker = SEVERITY_MARKERS
        .iter()
        .filter_map(|(marker, severity)| lower.find(marker).map(|at| (at, marker.len(), *severity)))
        .min_by_key(|(at, _, _)| *at);

    let (text, severity) = match marker {
        Some((at, len, severity)) => (body[at + len..].trim(), severity),
        None => (body, Severity::Info),
    };

    if text.is_empty() {
        return None;
    }
    Some(AdvicePoint {
        text: text.to_string(),
        severity,
    })
}

fn non_blank_or(value: &str, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
