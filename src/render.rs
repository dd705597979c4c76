//! Slide Renderer
//!
//! Pure mapping from `(Slide, Theme, is_first)` to a visual tree. Dispatch is
//! exhaustive on the content block; missing sub-fields render empty.

use serde::Serialize;

use crate::model::{ContentBlock, Slide, Theme, Transition};

/// Text color used when neither slide nor theme decides it.
pub const FIRST_SLIDE_TEXT_COLOR: &str = "#ffffff";
pub const BODY_TEXT_COLOR: &str = "#333333";
/// Darkening layered over a first-slide background image.
pub const COVER_OVERLAY: &str = "linear-gradient(rgba(0, 0, 0, 0.6), rgba(0, 0, 0, 0.6))";

pub const CHART_PLACEHOLDER: &str = "[Chart Visualization Would Appear Here]";

/// Colors and backdrop shared by every renderer of a slide.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideStyle {
    pub background_color: String,
    pub text_color: String,
    pub font_family: String,
    /// Full-bleed background image; only ever set on the first slide.
    pub background_image: Option<String>,
}

impl SlideStyle {
    pub fn resolve(slide: &Slide, theme: &Theme, is_first: bool) -> Self {
        let default_text = if is_first {
            FIRST_SLIDE_TEXT_COLOR
        } else {
            BODY_TEXT_COLOR
        };
        Self {
            background_color: slide
                .background_color
                .clone()
                .unwrap_or_else(|| theme.primary_color.clone()),
            text_color: slide
                .text_color
                .clone()
                .unwrap_or_else(|| default_text.to_string()),
            font_family: theme.font_family.clone(),
            background_image: slide.image_url.clone().filter(|_| is_first),
        }
    }

    /// CSS `background-image` value, darkened.
    pub fn background_image_css(&self) -> Option<String> {
        self.background_image
            .as_ref()
            .map(|url| format!("{}, url({})", COVER_OVERLAY, url))
    }
}

/// Entry animation class for a transition. Cosmetic only.
pub fn entry_animation(transition: Transition) -> Option<&'static str> {
    match transition {
        Transition::Fade => Some("animate-fadeIn"),
        Transition::Slide => Some("animate-slideIn"),
        Transition::Zoom => Some("animate-zoomIn"),
        Transition::Flip => Some("animate-flipIn"),
        Transition::None => None,
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "kebab-case")]
pub enum Node {
    Text { text: String },
    List { items: Vec<String> },
    Image { src: String, alt: String },
    /// Side-by-side halves, in reading order.
    Row { children: Vec<Node> },
    Column { title: Option<String>, body: String },
    Blockquote { text: String, cite: String },
    Grid { images: Vec<String> },
    TimelineEntry { year: String, event: String },
    ChartPlaceholder { caption: String, summary: String },
    Divider { text: String },
}

impl Node {
    fn collect_text(&self, out: &mut Vec<String>) {
        match self {
            Node::Text { text } | Node::Divider { text } => out.push(text.clone()),
            Node::List { items } => out.extend(items.iter().cloned()),
            Node::Image { .. } | Node::Grid { .. } => {}
            Node::Row { children } => children.iter().for_each(|c| c.collect_text(out)),
            Node::Column { title, body } => {
                out.extend(title.iter().cloned());
                out.push(body.clone());
            }
            Node::Blockquote { text, cite } => {
                out.push(format!("\"{}\"", text));
                out.push(format!("— {}", cite));
            }
            Node::TimelineEntry { year, event } => {
                out.push(year.clone());
                out.push(event.clone());
            }
            Node::ChartPlaceholder { caption, summary } => {
                out.push(caption.clone());
                out.push(summary.clone());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedSlide {
    pub title: String,
    /// First slide: large centered title.
    pub hero: bool,
    pub style: SlideStyle,
    pub animation: Option<&'static str>,
    pub body: Vec<Node>,
    /// Surfaced beside the slide, never inside the body.
    pub notes: Option<String>,
}

impl RenderedSlide {
    /// Visible text in reading order: title first, then body.
    pub fn plain_text(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        for node in &self.body {
            node.collect_text(&mut out);
        }
        out
    }
}

pub fn render_slide(slide: &Slide, theme: &Theme, is_first: bool) -> RenderedSlide {
    RenderedSlide {
        title: slide.title.clone(),
        hero: is_first,
        style: SlideStyle::resolve(slide, theme, is_first),
        animation: entry_animation(slide.transition),
        body: slide.block().map(|b| render_block(slide, b)).unwrap_or_default(),
        notes: slide.notes().map(str::to_string),
    }
}

fn side_image(slide: &Slide) -> Option<Node> {
    slide.image_url.as_ref().map(|src| Node::Image {
        src: src.clone(),
        alt: slide.title.clone(),
    })
}

fn render_block(slide: &Slide, block: &ContentBlock) -> Vec<Node> {
    match block {
        ContentBlock::Paragraph { text } => vec![Node::Text { text: text.clone() }],
        ContentBlock::Bullets { bullets } => vec![Node::List {
            items: bullets.clone(),
        }],
        ContentBlock::ImageLeft { text } => {
            let mut children: Vec<Node> = side_image(slide).into_iter().collect();
            children.push(Node::Text { text: text.clone() });
            vec![Node::Row { children }]
        }
        ContentBlock::ImageRight { text } => {
            let mut children = vec![Node::Text { text: text.clone() }];
            children.extend(side_image(slide));
            vec![Node::Row { children }]
        }
        ContentBlock::Quote { quote } => vec![Node::Blockquote {
            text: quote.text.clone(),
            cite: quote.author.clone(),
        }],
        ContentBlock::TitleOnly {} => vec![],
        ContentBlock::TwoColumn { columns } => vec![Node::Row {
            children: vec![
                Node::Column {
                    title: columns.left_title.clone(),
                    body: columns.left.clone(),
                },
                Node::Column {
                    title: columns.right_title.clone(),
                    body: columns.right.clone(),
                },
            ],
        }],
        ContentBlock::GridImages { images } => vec![Node::Grid {
            images: images.clone(),
        }],
        ContentBlock::Timeline { timeline_events } => timeline_events
            .iter()
            .map(|e| Node::TimelineEntry {
                year: e.year.clone(),
                event: e.event.clone(),
            })
            .collect(),
        ContentBlock::Chart { chart_data } => vec![Node::ChartPlaceholder {
            caption: CHART_PLACEHOLDER.to_string(),
            summary: format!(
                "{} chart showing {}",
                chart_data.kind.as_str(),
                chart_data.labels.join(", ")
            ),
        }],
        ContentBlock::SectionDivider { text } => vec![Node::Divider { text: text.clone() }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChartData, ChartKind, Columns, SlideContent};
    use crate::themes;

    fn with_block(block: ContentBlock) -> Slide {
        Slide {
            content: Some(SlideContent::with_notes(block, "psst")),
            ..Slide::new("Heading")
        }
    }

    #[test]
    fn test_style_resolution_order() {
        let theme = themes::default_theme();
        let plain = Slide::new("x");

        let first = SlideStyle::resolve(&plain, &theme, true);
        assert_eq!(first.background_color, theme.primary_color);
        assert_eq!(first.text_color, FIRST_SLIDE_TEXT_COLOR);

        let later = SlideStyle::resolve(&plain, &theme, false);
        assert_eq!(later.text_color, BODY_TEXT_COLOR);

        let custom = Slide {
            background_color: Some("#abcdef".to_string()),
            text_color: Some("#010101".to_string()),
            ..Slide::new("x")
        };
        let style = SlideStyle::resolve(&custom, &theme, true);
        assert_eq!(style.background_color, "#abcdef");
        assert_eq!(style.text_color, "#010101");
    }

    #[test]
    fn test_background_image_only_on_first_slide() {
        let theme = themes::default_theme();
        let slide = Slide {
            image_url: Some("cover.jpg".to_string()),
            ..Slide::new("x")
        };
        let first = SlideStyle::resolve(&slide, &theme, true);
        assert_eq!(
            first.background_image_css().unwrap(),
            format!("{}, url(cover.jpg)", COVER_OVERLAY)
        );
        assert!(SlideStyle::resolve(&slide, &theme, false).background_image.is_none());
    }

    #[test]
    fn test_absent_content_renders_title_only() {
        let rendered = render_slide(&Slide::new("Lonely"), &themes::default_theme(), false);
        assert!(rendered.body.is_empty());
        assert_eq!(rendered.plain_text(), vec!["Lonely".to_string()]);
        assert!(rendered.notes.is_none());
    }

    #[test]
    fn test_title_only_has_no_body_but_keeps_notes() {
        let rendered = render_slide(
            &with_block(ContentBlock::TitleOnly {}),
            &themes::default_theme(),
            false,
        );
        assert!(rendered.body.is_empty());
        assert_eq!(rendered.notes.as_deref(), Some("psst"));
        assert!(!rendered.plain_text().contains(&"psst".to_string()));
    }

    #[test]
    fn test_image_sides() {
        let theme = themes::default_theme();
        let mut slide = with_block(ContentBlock::ImageLeft {
            text: "words".to_string(),
        });
        slide.image_url = Some("pic.png".to_string());

        let left = render_slide(&slide, &theme, false);
        let Node::Row { children } = &left.body[0] else {
            panic!("expected row");
        };
        assert!(matches!(children[0], Node::Image { .. }));
        assert!(matches!(children[1], Node::Text { .. }));

        slide.content = Some(SlideContent::new(ContentBlock::ImageRight {
            text: "words".to_string(),
        }));
        let right = render_slide(&slide, &theme, false);
        let Node::Row { children } = &right.body[0] else {
            panic!("expected row");
        };
        assert!(matches!(children[0], Node::Text { .. }));
        assert!(matches!(children[1], Node::Image { .. }));

        slide.image_url = None;
        let bare = render_slide(&slide, &theme, false);
        assert_eq!(
            bare.body,
            vec![Node::Row {
                children: vec![Node::Text {
                    text: "words".to_string()
                }]
            }]
        );
    }

    #[test]
    fn test_two_column_text_order() {
        let rendered = render_slide(
            &with_block(ContentBlock::TwoColumn {
                columns: Columns {
                    left: "L".to_string(),
                    right: "R".to_string(),
                    left_title: Some("LT".to_string()),
                    right_title: None,
                },
            }),
            &themes::default_theme(),
            false,
        );
        assert_eq!(rendered.plain_text(), vec!["Heading", "LT", "L", "R"]);
    }

    #[test]
    fn test_chart_placeholder() {
        let rendered = render_slide(
            &with_block(ContentBlock::Chart {
                chart_data: ChartData {
                    labels: vec!["Q1".to_string(), "Q2".to_string()],
                    values: vec![1.0, 2.0],
                    kind: ChartKind::Line,
                },
            }),
            &themes::default_theme(),
            false,
        );
        assert_eq!(
            rendered.body,
            vec![Node::ChartPlaceholder {
                caption: CHART_PLACEHOLDER.to_string(),
                summary: "line chart showing Q1, Q2".to_string(),
            }]
        );
    }

    #[test]
    fn test_entry_animation() {
        assert_eq!(entry_animation(Transition::Zoom), Some("animate-zoomIn"));
        assert_eq!(entry_animation(Transition::None), None);
    }
}
