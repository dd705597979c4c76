//! Slide Document Model
//!
//! A Presentation is a value. The only permitted edits are a whole-theme
//! replace and a presenter-notes replace on one slide; both produce a new
//! Presentation and leave the original untouched.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Presentation {
    pub title: String,
    pub theme: Theme,
    pub slides: Vec<Slide>,
}

impl Presentation {
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    pub fn slide(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }

    /// Copy with the theme replaced wholesale.
    pub fn with_theme(&self, theme: Theme) -> Self {
        Self {
            title: self.title.clone(),
            theme,
            slides: self.slides.clone(),
        }
    }

    /// Copy with one slide's presenter notes replaced.
    ///
    /// The slide array is rebuilt rather than patched. Returns `None` when
    /// `index` is out of range.
    pub fn with_slide_notes(&self, index: usize, notes: impl Into<String>) -> Option<Self> {
        if index >= self.slides.len() {
            return None;
        }
        let notes = notes.into();
        let slides = self
            .slides
            .iter()
            .enumerate()
            .map(|(i, slide)| {
                if i == index {
                    slide.with_notes(notes.clone())
                } else {
                    slide.clone()
                }
            })
            .collect();

        Some(Self {
            title: self.title.clone(),
            theme: self.theme.clone(),
            slides,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    pub name: String,
    pub primary_color: String,
    pub secondary_color: String,
    pub font_family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accent_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Slide {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<SlideContent>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default, skip_serializing_if = "Transition::is_none")]
    pub transition: Transition,
}

impl Slide {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            image_url: None,
            content: None,
            background_color: None,
            text_color: None,
            transition: Transition::None,
        }
    }

    pub fn notes(&self) -> Option<&str> {
        self.content.as_ref().and_then(|c| c.notes.as_deref())
    }

    pub fn block(&self) -> Option<&ContentBlock> {
        self.content.as_ref().map(|c| &c.block)
    }

    /// A slide without content gains a `title-only` block to carry the notes.
    fn with_notes(&self, notes: String) -> Self {
        let content = match &self.content {
            Some(content) => SlideContent {
                block: content.block.clone(),
                notes: Some(notes),
            },
            None => SlideContent {
                block: ContentBlock::TitleOnly {},
                notes: Some(notes),
            },
        };
        Self {
            content: Some(content),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transition {
    Fade,
    Slide,
    Zoom,
    Flip,
    #[default]
    None,
}

impl Transition {
    pub fn is_none(&self) -> bool {
        matches!(self, Transition::None)
    }

    /// Lenient parse; anything unrecognised is `None`.
    pub fn parse(value: &str) -> Self {
        match value {
            "fade" => Transition::Fade,
            "slide" => Transition::Slide,
            "zoom" => Transition::Zoom,
            "flip" => Transition::Flip,
            _ => Transition::None,
        }
    }
}

/// A slide body plus its presenter notes.
///
/// Notes ride alongside every block variant but are never part of the
/// rendered body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlideContent {
    #[serde(flatten)]
    pub block: ContentBlock,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl SlideContent {
    pub fn new(block: ContentBlock) -> Self {
        Self { block, notes: None }
    }

    pub fn with_notes(block: ContentBlock, notes: impl Into<String>) -> Self {
        Self {
            block,
            notes: Some(notes.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentBlock {
    Paragraph {
        #[serde(default)]
        text: String,
    },
    Bullets {
        #[serde(default)]
        bullets: Vec<String>,
    },
    ImageLeft {
        #[serde(default)]
        text: String,
    },
    ImageRight {
        #[serde(default)]
        text: String,
    },
    Quote {
        #[serde(default)]
        quote: Quote,
    },
    TitleOnly {},
    TwoColumn {
        #[serde(default)]
        columns: Columns,
    },
    GridImages {
        #[serde(default)]
        images: Vec<String>,
    },
    Timeline {
        #[serde(default, rename = "timelineEvents")]
        timeline_events: Vec<TimelineEvent>,
    },
    Chart {
        #[serde(default, rename = "chartData")]
        chart_data: ChartData,
    },
    SectionDivider {
        #[serde(default)]
        text: String,
    },
}

impl ContentBlock {
    /// The wire tag for this variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Paragraph { .. } => "paragraph",
            ContentBlock::Bullets { .. } => "bullets",
            ContentBlock::ImageLeft { .. } => "image-left",
            ContentBlock::ImageRight { .. } => "image-right",
            ContentBlock::Quote { .. } => "quote",
            ContentBlock::TitleOnly {} => "title-only",
            ContentBlock::TwoColumn { .. } => "two-column",
            ContentBlock::GridImages { .. } => "grid-images",
            ContentBlock::Timeline { .. } => "timeline",
            ContentBlock::Chart { .. } => "chart",
            ContentBlock::SectionDivider { .. } => "section-divider",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Columns {
    #[serde(default)]
    pub left: String,
    #[serde(default)]
    pub right: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub left_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right_title: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default)]
    pub year: String,
    #[serde(default)]
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChartData {
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub values: Vec<f64>,
    #[serde(default, rename = "type")]
    pub kind: ChartKind,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
    Pie,
}

impl ChartKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::Bar => "bar",
            ChartKind::Line => "line",
            ChartKind::Pie => "pie",
        }
    }
}
