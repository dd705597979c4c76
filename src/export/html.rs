//! Print export: one self-contained HTML document, one page per slide,
//! which asks the host to print itself once loaded.

use std::fmt::Write;

use super::{escape_markup, sanitize_title, ExportEngine, ExportError, ExportFormat, ExportSink, ExportedFile};
use crate::model::{ContentBlock, Presentation, Slide, Theme};
use crate::render::SlideStyle;

pub const MEDIA_TYPE: &str = "text/html";

const FONT_FALLBACK: &str = "Arial, sans-serif";

const STYLESHEET: &str = r#"
    @page { size: landscape; margin: 0; }
    body { margin: 0; padding: 0; }
    .slide { width: 100%; height: 100vh; box-sizing: border-box; padding: 40px; page-break-after: always; display: flex; flex-direction: column; background-size: cover; background-position: center; }
    .slide:last-child { page-break-after: auto; }
    .slide h2 { font-size: 32px; margin-bottom: 24px; }
    .slide-content { flex: 1; font-size: 20px; }
    .image-row { display: flex; gap: 24px; align-items: center; }
    .image-row img { max-width: 45%; }
    .two-column { display: flex; gap: 32px; }
    .two-column > div { flex: 1; }
    blockquote { font-size: 28px; font-style: italic; text-align: center; }
    cite { display: block; text-align: right; }
    .grid-images { display: grid; grid-template-columns: repeat(2, 1fr); gap: 16px; }
    .grid-images img { width: 100%; }
    .timeline-event { display: flex; gap: 16px; margin-bottom: 12px; }
    .timeline-year { font-weight: bold; min-width: 120px; }
    .section-divider { display: flex; align-items: center; justify-content: center; flex: 1; }
"#;

#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlExporter;

impl ExportEngine for HtmlExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pdf
    }

    fn export(&self, presentation: &Presentation, sink: &mut dyn ExportSink) -> Result<(), ExportError> {
        let document = render_document(presentation)?;
        sink.deliver(ExportedFile {
            filename: format!("{}.html", sanitize_title(&presentation.title)),
            media_type: MEDIA_TYPE,
            bytes: document.into_bytes(),
        })
    }
}

/// The complete print document for `presentation`.
pub fn render_document(presentation: &Presentation) -> Result<String, ExportError> {
    let mut html = String::with_capacity(4096);
    html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    writeln!(html, "<title>{}</title>", escape_markup(&presentation.title))?;
    html.push_str("<style>");
    writeln!(
        html,
        "    body {{ font-family: {}; }}",
        css_font_stack(&presentation.theme.font_family)
    )?;
    html.push_str(STYLESHEET);
    html.push_str("</style>\n</head>\n<body>\n");

    for (index, slide) in presentation.slides.iter().enumerate() {
        html.push_str(&render_slide_html(slide, &presentation.theme, index == 0)?);
    }

    html.push_str("<script>\n    window.onload = function() { window.print(); };\n</script>\n");
    html.push_str("</body>\n</html>\n");
    Ok(html)
}

/// The theme font as a `font-family` value. Each family keeps only
/// characters that can appear in a font name; an empty stack falls back to
/// Arial.
fn css_font_stack(font_family: &str) -> String {
    let families: Vec<String> = font_family
        .split(',')
        .map(|family| {
            let name: String = family
                .chars()
                .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
                .collect();
            name.split_whitespace().collect::<Vec<_>>().join(" ")
        })
        .filter(|name| !name.is_empty())
        .map(|name| {
            if name.contains(' ') {
                format!("\"{}\"", name)
            } else {
                name
            }
        })
        .collect();

    if families.is_empty() {
        FONT_FALLBACK.to_string()
    } else {
        families.join(", ")
    }
}

/// One `.slide` page. Notes never appear in the output.
pub fn render_slide_html(slide: &Slide, theme: &Theme, is_first: bool) -> Result<String, ExportError> {
    let style = SlideStyle::resolve(slide, theme, is_first);
    let mut css = format!(
        "background-color: {}; color: {};",
        style.background_color, style.text_color
    );
    if let Some(image) = style.background_image_css() {
        write!(css, " background-image: {};", image)?;
    }

    let mut html = String::new();
    writeln!(html, "<div class=\"slide\" style=\"{}\">", escape_markup(&css))?;
    writeln!(html, "  <h2>{}</h2>", escape_markup(&slide.title))?;
    html.push_str("  <div class=\"slide-content\">\n");
    if let Some(block) = slide.block() {
        write_block(&mut html, slide, block)?;
    }
    html.push_str("  </div>\n</div>\n");
    Ok(html)
}

fn write_image(html: &mut String, slide: &Slide) -> std::fmt::Result {
    if let Some(src) = &slide.image_url {
        writeln!(
            html,
            "      <img src=\"{}\" alt=\"{}\">",
            escape_markup(src),
            escape_markup(&slide.title)
        )?;
    }
    Ok(())
}

fn write_block(html: &mut String, slide: &Slide, block: &ContentBlock) -> std::fmt::Result {
    match block {
        ContentBlock::Paragraph { text } => {
            writeln!(html, "    <p>{}</p>", escape_markup(text))?;
        }
        ContentBlock::Bullets { bullets } => {
            html.push_str("    <ul>\n");
            for bullet in bullets {
                writeln!(html, "      <li>{}</li>", escape_markup(bullet))?;
            }
            html.push_str("    </ul>\n");
        }
        ContentBlock::ImageLeft { text } => {
            html.push_str("    <div class=\"image-row\">\n");
            write_image(html, slide)?;
            writeln!(html, "      <p>{}</p>", escape_markup(text))?;
            html.push_str("    </div>\n");
        }
        ContentBlock::ImageRight { text } => {
            html.push_str("    <div class=\"image-row\">\n");
            writeln!(html, "      <p>{}</p>", escape_markup(text))?;
            write_image(html, slide)?;
            html.push_str("    </div>\n");
        }
        ContentBlock::Quote { quote } => {
            writeln!(html, "    <blockquote>\"{}\"</blockquote>", escape_markup(&quote.text))?;
            writeln!(html, "    <cite>— {}</cite>", escape_markup(&quote.author))?;
        }
        ContentBlock::TitleOnly {} => {}
        ContentBlock::TwoColumn { columns } => {
            html.push_str("    <div class=\"two-column\">\n");
            for (title, body) in [
                (&columns.left_title, &columns.left),
                (&columns.right_title, &columns.right),
            ] {
                html.push_str("      <div>\n");
                if let Some(title) = title {
                    writeln!(html, "        <h3>{}</h3>", escape_markup(title))?;
                }
                writeln!(html, "        <p>{}</p>", escape_markup(body))?;
                html.push_str("      </div>\n");
            }
            html.push_str("    </div>\n");
        }
        ContentBlock::GridImages { images } => {
            if !images.is_empty() {
                html.push_str("    <div class=\"grid-images\">\n");
                for (i, src) in images.iter().enumerate() {
                    writeln!(
                        html,
                        "      <img src=\"{}\" alt=\"Grid image {}\">",
                        escape_markup(src),
                        i + 1
                    )?;
                }
                html.push_str("    </div>\n");
            }
        }
        ContentBlock::Timeline { timeline_events } => {
            html.push_str("    <div class=\"timeline\">\n");
            for event in timeline_events {
                html.push_str("      <div class=\"timeline-event\">\n");
                writeln!(html, "        <div class=\"timeline-year\">{}</div>", escape_markup(&event.year))?;
                writeln!(
                    html,
                    "        <div class=\"timeline-description\">{}</div>",
                    escape_markup(&event.event)
                )?;
                html.push_str("      </div>\n");
            }
            html.push_str("    </div>\n");
        }
        // Charts have no print rendering; the slide keeps its title.
        ContentBlock::Chart { .. } => {}
        ContentBlock::SectionDivider { text } => {
            writeln!(
                html,
                "    <div class=\"section-divider\"><h1>{}</h1></div>",
                escape_markup(text)
            )?;
        }
    }
    Ok(())
}
