//! Validation System - Rules, Then Lenient Decode
//!
//! Rules produce structured violations. Only three structural requirements
//! are errors: a non-empty string `title`, a non-empty `slides` array, and a
//! string `title` on every slide. Everything else is defaulted, never
//! rejected, because candidates come from an unreliable generator.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::model::{
    ChartData, ChartKind, Columns, ContentBlock, Presentation, Quote, Slide, SlideContent,
    TimelineEvent, Transition,
};
use crate::themes;

/// Every content block tag the model understands.
pub const BLOCK_KINDS: [&str; 11] = [
    "paragraph",
    "bullets",
    "image-left",
    "image-right",
    "quote",
    "title-only",
    "two-column",
    "grid-images",
    "timeline",
    "chart",
    "section-divider",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    /// JSON pointer into the candidate, e.g. `/slides/2/title`.
    pub path: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

impl ValidationViolation {
    fn new(rule: &str, severity: ViolationSeverity, path: &str, message: &str) -> Self {
        Self {
            rule: rule.to_string(),
            severity,
            message: message.to_string(),
            path: path.to_string(),
            expected: None,
            actual: None,
            remediation: vec![],
        }
    }

    fn expected(mut self, expected: &str, actual: &Value) -> Self {
        self.expected = Some(expected.to_string());
        self.actual = Some(describe(actual));
        self
    }

    fn remediation(mut self, hint: &str) -> Self {
        self.remediation.push(hint.to_string());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationViolation> {
        self.violations
            .iter()
            .filter(|v| v.severity == ViolationSeverity::Error)
    }
}

#[derive(Debug, Error)]
#[error("Schema violation: {}", summarize(.violations))]
pub struct ValidationError {
    pub violations: Vec<ValidationViolation>,
}

fn summarize(violations: &[ValidationViolation]) -> String {
    violations
        .iter()
        .map(|v| format!("{} ({})", v.message, v.path))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Validation rule trait - produces violations
pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn check(&self, candidate: &Value) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct TitleRule;

impl ValidationRule for TitleRule {
    fn name(&self) -> &'static str {
        "title"
    }

    fn check(&self, candidate: &Value) -> Vec<ValidationViolation> {
        match candidate.get("title") {
            Some(Value::String(title)) if !title.is_empty() => vec![],
            Some(Value::String(_)) => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Error,
                "/title",
                "Presentation title is empty",
            )
            .remediation("Provide a non-empty presentation title")],
            other => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Error,
                "/title",
                "Presentation title missing",
            )
            .expected("string", other.unwrap_or(&Value::Null))],
        }
    }
}

pub struct SlidesRule;

impl ValidationRule for SlidesRule {
    fn name(&self) -> &'static str {
        "slides"
    }

    fn check(&self, candidate: &Value) -> Vec<ValidationViolation> {
        match candidate.get("slides") {
            Some(Value::Array(slides)) if !slides.is_empty() => vec![],
            Some(Value::Array(_)) => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Error,
                "/slides",
                "Presentation has no slides",
            )
            .remediation("Generate at least one slide")],
            other => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Error,
                "/slides",
                "Slides missing",
            )
            .expected("array", other.unwrap_or(&Value::Null))],
        }
    }
}

pub struct SlideTitleRule;

impl ValidationRule for SlideTitleRule {
    fn name(&self) -> &'static str {
        "slide_title"
    }

    fn check(&self, candidate: &Value) -> Vec<ValidationViolation> {
        let Some(slides) = candidate.get("slides").and_then(Value::as_array) else {
            return vec![];
        };

        slides
            .iter()
            .enumerate()
            .filter_map(|(index, slide)| {
                let title = slide.get("title");
                if matches!(title, Some(Value::String(_))) {
                    return None;
                }
                Some(
                    ValidationViolation::new(
                        self.name(),
                        ViolationSeverity::Error,
                        &format!("/slides/{}/title", index),
                        "Slide title missing",
                    )
                    .expected("string", title.unwrap_or(&Value::Null)),
                )
            })
            .collect()
    }
}

pub struct ThemeRule;

impl ValidationRule for ThemeRule {
    fn name(&self) -> &'static str {
        "theme"
    }

    fn check(&self, candidate: &Value) -> Vec<ValidationViolation> {
        match candidate.get("theme") {
            Some(Value::Object(_)) => vec![],
            None | Some(Value::Null) => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Info,
                "/theme",
                "Theme absent; default preset substituted",
            )],
            Some(other) => vec![ValidationViolation::new(
                self.name(),
                ViolationSeverity::Warning,
                "/theme",
                "Theme is not an object; default preset substituted",
            )
            .expected("object", other)],
        }
    }
}

pub struct ContentTypeRule;

impl ValidationRule for ContentTypeRule {
    fn name(&self) -> &'static str {
        "content_type"
    }

    fn check(&self, candidate: &Value) -> Vec<ValidationViolation> {
        let Some(slides) = candidate.get("slides").and_then(Value::as_array) else {
            return vec![];
        };

        let mut violations = vec![];
        for (index, slide) in slides.iter().enumerate() {
            let Some(content) = slide.get("content").filter(|c| !c.is_null()) else {
                continue;
            };
            let kind = content.get("type").and_then(Value::as_str);
            if !kind.map_or(false, |k| BLOCK_KINDS.contains(&k)) {
                violations.push(
                    ValidationViolation::new(
                        self.name(),
                        ViolationSeverity::Warning,
                        &format!("/slides/{}/content/type", index),
                        "Unknown content block type; slide renders title only",
                    )
                    .expected("known block type", content.get("type").unwrap_or(&Value::Null)),
                );
            }
        }
        violations
    }
}

/// Validator orchestrates rules, then decodes the candidate leniently
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule + Send + Sync>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(TitleRule),
                Box::new(SlidesRule),
                Box::new(SlideTitleRule),
                Box::new(ThemeRule),
                Box::new(ContentTypeRule),
            ],
        }
    }

    /// Run every rule. Warnings and info never make a candidate invalid.
    pub fn check(&self, candidate: &Value) -> ValidationReport {
        let violations: Vec<_> = self
            .rules
            .iter()
            .flat_map(|rule| rule.check(candidate))
            .collect();
        let valid = !violations
            .iter()
            .any(|v| v.severity == ViolationSeverity::Error);

        ValidationReport { valid, violations }
    }

    pub fn validate(&self, candidate: &Value) -> Result<Presentation, ValidationError> {
        let report = self.check(candidate);
        if !report.valid {
            return Err(ValidationError {
                violations: report.errors().cloned().collect(),
            });
        }
        for warning in report
            .violations
            .iter()
            .filter(|v| v.severity != ViolationSeverity::Error)
        {
            tracing::warn!(rule = %warning.rule, path = %warning.path, "{}", warning.message);
        }
        Ok(decode_presentation(candidate))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

/// Validate an untrusted candidate with the default rule set.
pub fn validate(candidate: &Value) -> Result<Presentation, ValidationError> {
    Validator::new().validate(candidate)
}

// --- Lenient decoding ---

pub(crate) fn string_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn text_at(value: &Value, key: &str) -> String {
    value.get(key).and_then(scalar_text).unwrap_or_default()
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn string_list(value: &Value, key: &str) -> Vec<String> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(scalar_text).collect())
        .unwrap_or_default()
}

fn number_list(value: &Value, key: &str) -> Vec<f64> {
    value
        .get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .map(|item| {
                    let parsed = match item {
                        Value::Number(n) => n.as_f64(),
                        Value::String(s) => s.trim().parse::<f64>().ok(),
                        _ => None,
                    };
                    parsed.filter(|v| v.is_finite()).unwrap_or(0.0)
                })
                .collect()
        })
        .unwrap_or_default()
}

fn describe(value: &Value) -> String {
    match value {
        Value::Null => "missing".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    }
}

fn decode_presentation(candidate: &Value) -> Presentation {
    let theme = match candidate.get("theme") {
        Some(theme @ Value::Object(_)) => themes::normalize(theme),
        _ => themes::default_theme(),
    };

    let slides = candidate
        .get("slides")
        .and_then(Value::as_array)
        .map(|slides| slides.iter().map(decode_slide).collect())
        .unwrap_or_default();

    Presentation {
        title: string_at(candidate, "title").unwrap_or_default(),
        theme,
        slides,
    }
}

fn decode_slide(slide: &Value) -> Slide {
    Slide {
        title: string_at(slide, "title").unwrap_or_default(),
        image_url: string_at(slide, "imageUrl"),
        content: slide.get("content").and_then(decode_content),
        background_color: string_at(slide, "backgroundColor"),
        text_color: string_at(slide, "textColor"),
        transition: string_at(slide, "transition")
            .map(|t| Transition::parse(&t))
            .unwrap_or_default(),
    }
}

fn decode_content(content: &Value) -> Option<SlideContent> {
    let block = decode_block(content)?;
    Some(SlideContent {
        block,
        notes: string_at(content, "notes"),
    })
}

fn decode_block(content: &Value) -> Option<ContentBlock> {
    let kind = content.get("type").and_then(Value::as_str)?;
    let block = match kind {
        "paragraph" => ContentBlock::Paragraph {
            text: text_at(content, "text"),
        },
        "bullets" => ContentBlock::Bullets {
            bullets: string_list(content, "bullets"),
        },
        "image-left" => ContentBlock::ImageLeft {
            text: text_at(content, "text"),
        },
        "image-right" => ContentBlock::ImageRight {
            text: text_at(content, "text"),
        },
        "quote" => {
            let quote = content.get("quote").unwrap_or(&Value::Null);
            ContentBlock::Quote {
                quote: Quote {
                    text: text_at(quote, "text"),
                    author: text_at(quote, "author"),
                },
            }
        }
        "title-only" => ContentBlock::TitleOnly {},
        "two-column" => {
            let columns = content.get("columns").unwrap_or(&Value::Null);
            ContentBlock::TwoColumn {
                columns: Columns {
                    left: text_at(columns, "left"),
                    right: text_at(columns, "right"),
                    left_title: string_at(columns, "leftTitle"),
                    right_title: string_at(columns, "rightTitle"),
                },
            }
        }
        "grid-images" => ContentBlock::GridImages {
            images: string_list(content, "images"),
        },
        "timeline" => ContentBlock::Timeline {
            timeline_events: content
                .get("timelineEvents")
                .and_then(Value::as_array)
                .map(|events| {
                    events
                        .iter()
                        .filter(|e| e.is_object())
                        .map(|e| TimelineEvent {
                            year: text_at(e, "year"),
                            event: text_at(e, "event"),
                        })
                        .collect()
                })
                .unwrap_or_default(),
        },
        "chart" => {
            let data = content.get("chartData").unwrap_or(&Value::Null);
            let kind = match data.get("type").and_then(Value::as_str) {
                Some("line") => ChartKind::Line,
                Some("pie") => ChartKind::Pie,
                _ => ChartKind::Bar,
            };
            ContentBlock::Chart {
                chart_data: ChartData {
                    labels: string_list(data, "labels"),
                    values: number_list(data, "values"),
                    kind,
                },
            }
        }
        "section-divider" => ContentBlock::SectionDivider {
            text: text_at(content, "text"),
        },
        other => {
            tracing::debug!(kind = other, "Dropping content block of unknown type");
            return None;
        }
    };
    Some(block)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_minimal_candidate() {
        let presentation = validate(&json!({"title": "T", "slides": [{"title": "Only"}]})).unwrap();
        assert_eq!(presentation.title, "T");
        assert_eq!(presentation.slides.len(), 1);
        assert_eq!(presentation.theme, themes::default_theme());
        let slide = &presentation.slides[0];
        assert!(slide.content.is_none());
        assert!(slide.image_url.is_none());
        assert_eq!(slide.transition, Transition::None);
    }

    #[test]
    fn test_rejects_missing_title() {
        let err = validate(&json!({"slides": [{"title": "A"}]})).unwrap_err();
        assert_eq!(err.violations.len(), 1);
        assert_eq!(err.violations[0].rule, "title");
        assert_eq!(err.violations[0].actual.as_deref(), Some("missing"));
    }

    #[test]
    fn test_rejects_empty_slides() {
        let err = validate(&json!({"title": "T", "slides": []})).unwrap_err();
        assert_eq!(err.violations[0].rule, "slides");
        assert!(err.to_string().contains("Presentation has no slides"));
    }

    #[test]
    fn test_rejects_non_string_slide_title() {
        let err = validate(&json!({
            "title": "T",
            "slides": [{"title": "A"}, {"title": 7}, "not a slide"]
        }))
        .unwrap_err();
        let paths: Vec<_> = err.violations.iter().map(|v| v.path.as_str()).collect();
        assert_eq!(paths, vec!["/slides/1/title", "/slides/2/title"]);
    }

    #[test]
    fn test_warnings_do_not_block() {
        let candidate = json!({
            "title": "T",
            "theme": "blue",
            "slides": [{"title": "A", "content": {"type": "hologram", "notes": "lost"}}]
        });
        let report = Validator::new().check(&candidate);
        assert!(report.valid);
        assert!(!report.has_errors());
        assert_eq!(report.violations.len(), 2);

        let presentation = validate(&candidate).unwrap();
        assert!(presentation.slides[0].content.is_none());
        assert_eq!(presentation.theme, themes::default_theme());
    }

    #[test]
    fn test_theme_is_normalized() {
        let presentation = validate(&json!({
            "title": "T",
            "theme": {"primaryColor": "#101010"},
            "slides": [{"title": "A"}]
        }))
        .unwrap();
        assert_eq!(presentation.theme.name, themes::CUSTOM_THEME_NAME);
        assert_eq!(presentation.theme.primary_color, "#101010");
        assert_eq!(presentation.theme.secondary_color, themes::DEFAULT_SECONDARY_COLOR);
    }

    #[test]
    fn test_lenient_block_fields() {
        let presentation = validate(&json!({
            "title": "T",
            "slides": [
                {"title": "B", "content": {"type": "bullets", "bullets": ["one", 2, null, {"x": 1}]}},
                {"title": "Q", "content": {"type": "quote"}},
                {"title": "C", "content": {"type": "chart", "chartData": {
                    "labels": ["a", "b", "c"], "values": [1, "2.5", "x"], "type": "pie"
                }}},
                {"title": "L", "content": {"type": "timeline", "timelineEvents": [
                    {"year": 1969, "event": "Moon"}, "junk"
                ]}, "transition": "flip"}
            ]
        }))
        .unwrap();

        assert_eq!(
            presentation.slides[0].block(),
            Some(&ContentBlock::Bullets {
                bullets: vec!["one".to_string(), "2".to_string()]
            })
        );
        assert_eq!(
            presentation.slides[1].block(),
            Some(&ContentBlock::Quote {
                quote: Quote::default()
            })
        );
        assert_eq!(
            presentation.slides[2].block(),
            Some(&ContentBlock::Chart {
                chart_data: ChartData {
                    labels: vec!["a".to_string(), "b".to_string(), "c".to_string()],
                    values: vec![1.0, 2.5, 0.0],
                    kind: ChartKind::Pie,
                }
            })
        );
        assert_eq!(
            presentation.slides[3].block(),
            Some(&ContentBlock::Timeline {
                timeline_events: vec![TimelineEvent {
                    year: "1969".to_string(),
                    event: "Moon".to_string(),
                }]
            })
        );
        assert_eq!(presentation.slides[3].transition, Transition::Flip);
    }

    #[test]
    fn test_notes_are_kept() {
        let presentation = validate(&json!({
            "title": "T",
            "slides": [{"title": "A", "content": {"type": "paragraph", "text": "x", "notes": "say x"}}]
        }))
        .unwrap();
        assert_eq!(presentation.slides[0].notes(), Some("say x"));
    }

    #[test]
    fn test_non_finite_chart_values_become_zero() {
        let presentation = validate(&json!({
            "title": "T",
            "slides": [{"title": "C", "content": {"type": "chart", "chartData": {
                "labels": ["a", "b", "c", "d"], "values": ["NaN", "inf", "-infinity", " 4 "], "type": "bar"
            }}}]
        }))
        .unwrap();
        let Some(ContentBlock::Chart { chart_data }) = presentation.slides[0].block() else {
            panic!("expected a chart block");
        };
        assert_eq!(chart_data.values, vec![0.0, 0.0, 0.0, 4.0]);

        let text = serde_json::to_string(&presentation).unwrap();
        let restored: Presentation = serde_json::from_str(&text).unwrap();
        assert_eq!(restored, presentation);
    }
}
