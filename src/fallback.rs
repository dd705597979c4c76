//! Fallback Synthesis
//!
//! Builds a complete nine-slide deck from the topic string alone. Pure
//! string interpolation into fixed sentences: the same topic always yields
//! the same Presentation.

use crate::model::{
    Columns, ContentBlock, Presentation, Quote, Slide, SlideContent, TimelineEvent, Transition,
};
use crate::themes;

/// Titles longer than this many characters are cut and suffixed with `...`.
pub const MAX_TITLE_CHARS: usize = 30;

pub const FALLBACK_SLIDE_COUNT: usize = 9;

const COVER_IMAGE: &str = "/placeholder.svg?height=800&width=1200";
const ILLUSTRATION_IMAGE: &str = "/placeholder.svg?height=600&width=800";

pub fn truncate_title(topic: &str) -> String {
    if topic.chars().count() > MAX_TITLE_CHARS {
        let head: String = topic.chars().take(MAX_TITLE_CHARS).collect();
        format!("{}...", head)
    } else {
        topic.to_string()
    }
}

fn slide(
    title: &str,
    background: &str,
    text: &str,
    transition: Transition,
    block: ContentBlock,
    notes: &str,
) -> Slide {
    Slide {
        title: title.to_string(),
        image_url: None,
        content: Some(SlideContent::with_notes(block, notes)),
        background_color: Some(background.to_string()),
        text_color: Some(text.to_string()),
        transition,
    }
}

/// Synthesize the fallback deck for `topic`.
pub fn synthesize(topic: &str) -> Presentation {
    let title = truncate_title(topic);

    let cover = Slide {
        title: title.clone(),
        image_url: Some(COVER_IMAGE.to_string()),
        content: None,
        background_color: Some("#2c3e50".to_string()),
        text_color: Some("#ffffff".to_string()),
        transition: Transition::Fade,
    };

    let introduction = slide(
        "Introduction",
        "#ecf0f1",
        "#2c3e50",
        Transition::Zoom,
        ContentBlock::SectionDivider {
            text: format!("Let's explore {}", topic),
        },
        "This is an introduction slide. Pause here to introduce the main topics.",
    );

    let key_points = slide(
        "Key Points",
        "#ffffff",
        "#2c3e50",
        Transition::Fade,
        ContentBlock::Bullets {
            bullets: vec![
                format!("First key point about {}", topic),
                "Second important aspect to consider".to_string(),
                "Third element worth discussing".to_string(),
                "Fourth critical component".to_string(),
                "Fifth relevant consideration".to_string(),
            ],
        },
        "Go through each bullet point with a brief explanation.",
    );

    let illustration = Slide {
        image_url: Some(ILLUSTRATION_IMAGE.to_string()),
        ..slide(
            "Visual Representation",
            "#ffffff",
            "#2c3e50",
            Transition::Slide,
            ContentBlock::ImageRight {
                text: format!(
                    "This visual representation helps illustrate the key concepts related to {}. \
                     The image provides context and makes the information more accessible to visual learners.",
                    topic
                ),
            },
            "Explain the significance of the visual and how it relates to the topic.",
        )
    };

    let comparison = slide(
        "Comparing Perspectives",
        "#ffffff",
        "#2c3e50",
        Transition::Slide,
        ContentBlock::TwoColumn {
            columns: Columns {
                left: format!(
                    "The conventional understanding of {} focuses on established methodologies and historical context.",
                    topic
                ),
                right: format!(
                    "Contemporary views on {} incorporate recent developments and innovative thinking.",
                    topic
                ),
                left_title: Some("Traditional Approach".to_string()),
                right_title: Some("Modern Perspective".to_string()),
            },
        },
        "Highlight the evolution of thinking on this topic over time.",
    );

    let timeline = slide(
        "Timeline of Developments",
        "#f8f9fa",
        "#2c3e50",
        Transition::Fade,
        ContentBlock::Timeline {
            timeline_events: vec![
                event("Early Stage", &format!("Initial developments related to {}", topic)),
                event("Middle Period", "Significant advancements and refinements"),
                event("Recent Times", "Current state and latest innovations"),
                event("Future", "Projected developments and potential directions"),
            ],
        },
        "This timeline shows the evolution of the topic over time.",
    );

    let insight = slide(
        "Expert Insight",
        "#34495e",
        "#ecf0f1",
        Transition::Zoom,
        ContentBlock::Quote {
            quote: Quote {
                text: format!(
                    "The most profound insights about {} come from examining it from multiple perspectives.",
                    topic
                ),
                author: "Expert in the field".to_string(),
            },
        },
        "This quote emphasizes the importance of diverse viewpoints on the topic.",
    );

    let conclusion = slide(
        "Conclusion",
        "#2c3e50",
        "#ffffff",
        Transition::Fade,
        ContentBlock::Paragraph {
            text: format!(
                "In conclusion, {} represents an important area of study with significant implications. \
                 By understanding its key components and evolution, we can better appreciate its relevance \
                 and potential future developments.",
                topic
            ),
        },
        "Summarize the key points and emphasize the significance of the topic.",
    );

    let thanks = slide(
        "Thank You",
        "#2c3e50",
        "#ffffff",
        Transition::Fade,
        ContentBlock::TitleOnly {},
        "Thank the audience for their attention and open the floor for questions.",
    );

    Presentation {
        title,
        theme: themes::default_theme(),
        slides: vec![
            cover,
            introduction,
            key_points,
            illustration,
            comparison,
            timeline,
            insight,
            conclusion,
            thanks,
        ],
    }
}

fn event(year: &str, event: &str) -> TimelineEvent {
    TimelineEvent {
        year: year.to_string(),
        event: event.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nine_slides_with_topic() {
        let deck = synthesize("Quantum Computing");
        assert_eq!(deck.slides.len(), FALLBACK_SLIDE_COUNT);
        assert_eq!(deck.title, "Quantum Computing");
        assert_eq!(deck.slides[0].title, "Quantum Computing");
        assert_eq!(deck.theme, themes::default_theme());
    }

    #[test]
    fn test_block_sequence() {
        let kinds: Vec<_> = synthesize("Tides")
            .slides
            .iter()
            .map(|s| s.block().map(|b| b.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                None,
                Some("section-divider"),
                Some("bullets"),
                Some("image-right"),
                Some("two-column"),
                Some("timeline"),
                Some("quote"),
                Some("paragraph"),
                Some("title-only"),
            ]
        );
    }

    #[test]
    fn test_long_topic_truncated() {
        let topic = "The Economic History of the Mediterranean Basin";
        let deck = synthesize(topic);
        assert_eq!(deck.title, "The Economic History of the Me...");
        assert_eq!(deck.title.chars().count(), MAX_TITLE_CHARS + 3);
        // Body text keeps the full topic.
        assert_eq!(
            deck.slides[1].block(),
            Some(&ContentBlock::SectionDivider {
                text: format!("Let's explore {}", topic)
            })
        );
    }

    #[test]
    fn test_truncation_counts_chars_not_bytes() {
        let topic = "é".repeat(31);
        assert_eq!(truncate_title(&topic), format!("{}...", "é".repeat(30)));
        assert_eq!(truncate_title(&"é".repeat(30)), "é".repeat(30));
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(synthesize("Rust"), synthesize("Rust"));
    }

    #[test]
    fn test_every_content_slide_has_notes() {
        let deck = synthesize("Bees");
        assert!(deck.slides[1..].iter().all(|s| s.notes().is_some()));
        assert!(deck.slides[0].notes().is_none());
    }
}
