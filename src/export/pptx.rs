//! Binary deck export: a minimal Office Open XML presentation package.
//!
//! Every part is written as a hand-built XML string. One slide master, one
//! blank layout and one theme carry the whole deck; each slide is a solid
//! background plus absolutely positioned text boxes. Presenter notes add a
//! notes master and one notes slide per annotated slide.

use std::fmt::Write as _;
use std::io::{Cursor, Write as _};

use chrono::{DateTime, Utc};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use super::{escape_markup, sanitize_title, ExportEngine, ExportError, ExportFormat, ExportSink, ExportedFile};
use crate::model::{ContentBlock, Presentation, Slide, Theme};
use crate::render::SlideStyle;

pub const MEDIA_TYPE: &str = "application/vnd.openxmlformats-officedocument.presentationml.presentation";

/// Author and company written into the document properties.
pub const DOCUMENT_AUTHOR: &str = "AI Presentation Generator";

/// English Metric Units per inch.
pub const EMU_PER_INCH: f64 = 914_400.0;
pub const SLIDE_WIDTH_IN: f64 = 10.0;
pub const SLIDE_HEIGHT_IN: f64 = 5.625;

const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_P: &str = "http://schemas.openxmlformats.org/presentationml/2006/main";
const NS_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_BASE: &str = "application/vnd.openxmlformats-officedocument";

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;

const EMPTY_GROUP: &str = concat!(
    r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#,
    r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/>"#,
    r#"<a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#
);

const CLR_MAP: &str = concat!(
    r#"<p:clrMap bg1="lt1" tx1="dk1" bg2="lt2" tx2="dk2" accent1="accent1" accent2="accent2" "#,
    r#"accent3="accent3" accent4="accent4" accent5="accent5" accent6="accent6" "#,
    r#"hlink="hlink" folHlink="folHlink"/>"#
);

#[derive(Debug, Default, Clone, Copy)]
pub struct PptxExporter;

impl ExportEngine for PptxExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Pptx
    }

    fn export(&self, presentation: &Presentation, sink: &mut dyn ExportSink) -> Result<(), ExportError> {
        let bytes = build_deck(presentation, Utc::now())?;
        sink.deliver(ExportedFile {
            filename: format!("{}.pptx", sanitize_title(&presentation.title)),
            media_type: MEDIA_TYPE,
            bytes,
        })
    }
}

fn emu(inches: f64) -> i64 {
    (inches * EMU_PER_INCH).round() as i64
}

/// `#rgb` / `#rrggbb` to the six uppercase hex digits DrawingML expects.
pub fn hex_color(value: &str, fallback: &str) -> String {
    let digits = value.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return fallback.to_string();
    }
    match digits.len() {
        6 => digits.to_ascii_uppercase(),
        3 => digits
            .chars()
            .flat_map(|c| [c, c])
            .collect::<String>()
            .to_ascii_uppercase(),
        _ => fallback.to_string(),
    }
}

/// First family of a CSS font stack, unquoted.
fn primary_typeface(font_family: &str) -> String {
    font_family
        .split(',')
        .next()
        .map(|f| f.trim().trim_matches(|c| c == '"' || c == '\''))
        .filter(|f| !f.is_empty())
        .unwrap_or("Calibri")
        .to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Center,
    Right,
}

impl Align {
    fn as_attr(self) -> &'static str {
        match self {
            Align::Left => "l",
            Align::Center => "ctr",
            Align::Right => "r",
        }
    }
}

/// A positioned text box; geometry in inches, one `<a:p>` per line.
#[derive(Debug, Clone)]
struct TextBox {
    x: f64,
    y: f64,
    w: f64,
    h: f64,
    lines: Vec<String>,
    size_pt: u32,
    bold: bool,
    italic: bool,
    align: Align,
}

impl TextBox {
    fn new(x: f64, y: f64, w: f64, h: f64, text: impl Into<String>, size_pt: u32) -> Self {
        let text = text.into();
        Self {
            x,
            y,
            w,
            h,
            lines: text.split('\n').map(str::to_string).collect(),
            size_pt,
            bold: false,
            italic: false,
            align: Align::Left,
        }
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    fn write_xml(&self, xml: &mut String, shape_id: usize, color: &str, typeface: &str) -> std::fmt::Result {
        xml.push_str("<p:sp><p:nvSpPr>");
        write!(xml, r#"<p:cNvPr id="{}" name="Text Box {}"/>"#, shape_id, shape_id)?;
        xml.push_str(r#"<p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr>"#);

        xml.push_str("<p:spPr><a:xfrm>");
        write!(xml, r#"<a:off x="{}" y="{}"/>"#, emu(self.x), emu(self.y))?;
        write!(xml, r#"<a:ext cx="{}" cy="{}"/>"#, emu(self.w), emu(self.h))?;
        xml.push_str(r#"</a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);

        xml.push_str(r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#);
        for line in &self.lines {
            write!(xml, r#"<a:p><a:pPr algn="{}"/>"#, self.align.as_attr())?;
            let mut run_props = format!(r#"lang="en-US" sz="{}""#, self.size_pt * 100);
            if self.bold {
                run_props.push_str(r#" b="1""#);
            }
            if self.italic {
                run_props.push_str(r#" i="1""#);
            }
            if line.is_empty() {
                write!(xml, "<a:endParaRPr {}/>", run_props)?;
            } else {
                write!(
                    xml,
                    r#"<a:r><a:rPr {} dirty="0"><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:latin typeface="{}"/></a:rPr><a:t>{}</a:t></a:r>"#,
                    run_props,
                    color,
                    escape_markup(typeface),
                    escape_markup(line)
                )?;
            }
            xml.push_str("</a:p>");
        }
        xml.push_str("</p:txBody></p:sp>");
        Ok(())
    }
}

/// Text boxes for one slide, title first.
fn slide_boxes(slide: &Slide, is_first: bool) -> Vec<TextBox> {
    let title = if is_first {
        TextBox::new(0.5, 0.5, 9.0, 1.0, slide.title.clone(), 44).align(Align::Center)
    } else {
        TextBox::new(0.5, 0.5, 9.0, 1.0, slide.title.clone(), 36)
    }
    .bold();

    let mut boxes = vec![title];
    let Some(block) = slide.block() else {
        return boxes;
    };

    match block {
        ContentBlock::Paragraph { text } => {
            boxes.push(TextBox::new(0.5, 1.5, 9.0, 3.0, text.clone(), 18));
        }
        ContentBlock::Bullets { bullets } => {
            let text = bullets
                .iter()
                .map(|b| format!("• {}", b))
                .collect::<Vec<_>>()
                .join("\n");
            boxes.push(TextBox::new(0.5, 1.5, 9.0, 3.0, text, 18));
        }
        ContentBlock::Quote { quote } => {
            boxes.push(
                TextBox::new(1.0, 2.0, 8.0, 1.5, format!("\"{}\"", quote.text), 24)
                    .italic()
                    .align(Align::Center),
            );
            boxes.push(
                TextBox::new(1.0, 3.5, 8.0, 0.5, format!("— {}", quote.author), 16).align(Align::Right),
            );
        }
        ContentBlock::TwoColumn { columns } => {
            // Reading order: left column, then right.
            if let Some(title) = &columns.left_title {
                boxes.push(TextBox::new(0.5, 1.5, 4.0, 0.5, title.clone(), 20).bold());
            }
            boxes.push(TextBox::new(0.5, 2.0, 4.0, 2.5, columns.left.clone(), 16));
            if let Some(title) = &columns.right_title {
                boxes.push(TextBox::new(5.0, 1.5, 4.0, 0.5, title.clone(), 20).bold());
            }
            boxes.push(TextBox::new(5.0, 2.0, 4.0, 2.5, columns.right.clone(), 16));
        }
        ContentBlock::Timeline { timeline_events } => {
            let text = timeline_events
                .iter()
                .map(|e| format!("{}: {}", e.year, e.event))
                .collect::<Vec<_>>()
                .join("\n\n");
            boxes.push(TextBox::new(0.5, 1.5, 9.0, 3.0, text, 16));
        }
        ContentBlock::SectionDivider { text } => {
            boxes.push(
                TextBox::new(0.5, 2.0, 9.0, 1.5, text.clone(), 36)
                    .bold()
                    .align(Align::Center),
            );
        }
        ContentBlock::ImageLeft { .. }
        | ContentBlock::ImageRight { .. }
        | ContentBlock::TitleOnly {}
        | ContentBlock::GridImages { .. }
        | ContentBlock::Chart { .. } => {}
    }
    boxes
}

fn slide_xml(slide: &Slide, theme: &Theme, is_first: bool) -> Result<String, std::fmt::Error> {
    let style = SlideStyle::resolve(slide, theme, is_first);
    let background = hex_color(&style.background_color, "FFFFFF");
    let color = hex_color(&style.text_color, "000000");
    let typeface = primary_typeface(&style.font_family);

    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:sld xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P)?;
    write!(
        xml,
        r#"<p:cSld><p:bg><p:bgPr><a:solidFill><a:srgbClr val="{}"/></a:solidFill><a:effectLst/></p:bgPr></p:bg>"#,
        background
    )?;
    xml.push_str("<p:spTree>");
    xml.push_str(EMPTY_GROUP);
    for (i, text_box) in slide_boxes(slide, is_first).iter().enumerate() {
        text_box.write_xml(&mut xml, i + 2, &color, &typeface)?;
    }
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sld>");
    Ok(xml)
}

/// Presenter notes worth a notes slide.
fn speaker_notes(slide: &Slide) -> Option<&str> {
    slide.notes().filter(|notes| !notes.is_empty())
}

fn notes_slide_xml(notes: &str) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:notes xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P)?;
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(EMPTY_GROUP);
    xml.push_str(concat!(
        r#"<p:sp><p:nvSpPr><p:cNvPr id="2" name="Notes Placeholder 1"/>"#,
        r#"<p:cNvSpPr><a:spLocks noGrp="1"/></p:cNvSpPr><p:nvPr><p:ph type="body" idx="1"/></p:nvPr></p:nvSpPr>"#,
        r#"<p:spPr/><p:txBody><a:bodyPr/><a:lstStyle/>"#
    ));
    for line in notes.split('\n') {
        if line.is_empty() {
            xml.push_str(r#"<a:p><a:endParaRPr lang="en-US"/></a:p>"#);
        } else {
            write!(
                xml,
                r#"<a:p><a:r><a:rPr lang="en-US" dirty="0"/><a:t>{}</a:t></a:r></a:p>"#,
                escape_markup(line)
            )?;
        }
    }
    xml.push_str("</p:txBody></p:sp></p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:notes>");
    Ok(xml)
}

type Relationship = (String, String, String);

fn rel(id: usize, kind: &str, target: impl Into<String>) -> Relationship {
    (format!("rId{}", id), format!("{}/{}", REL_BASE, kind), target.into())
}

fn rels_xml(rels: Vec<Relationship>) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    write!(xml, r#"<Relationships xmlns="{}">"#, NS_RELS)?;
    for (id, kind, target) in rels {
        write!(
            xml,
            r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
            id,
            kind,
            escape_markup(&target)
        )?;
    }
    xml.push_str("</Relationships>");
    Ok(xml)
}

fn content_types_xml(slide_count: usize, notes: &[usize]) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(2048);
    xml.push_str(XML_DECL);
    xml.push_str(r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#);
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut overrides: Vec<(String, String)> = vec![
        (
            "/ppt/presentation.xml".to_string(),
            format!("{}.presentationml.presentation.main+xml", CT_BASE),
        ),
        (
            "/ppt/slideMasters/slideMaster1.xml".to_string(),
            format!("{}.presentationml.slideMaster+xml", CT_BASE),
        ),
        (
            "/ppt/slideLayouts/slideLayout1.xml".to_string(),
            format!("{}.presentationml.slideLayout+xml", CT_BASE),
        ),
        ("/ppt/theme/theme1.xml".to_string(), format!("{}.theme+xml", CT_BASE)),
        (
            "/docProps/core.xml".to_string(),
            "application/vnd.openxmlformats-package.core-properties+xml".to_string(),
        ),
        (
            "/docProps/app.xml".to_string(),
            format!("{}.extended-properties+xml", CT_BASE),
        ),
    ];
    for n in 1..=slide_count {
        overrides.push((
            format!("/ppt/slides/slide{}.xml", n),
            format!("{}.presentationml.slide+xml", CT_BASE),
        ));
    }
    if !notes.is_empty() {
        overrides.push((
            "/ppt/notesMasters/notesMaster1.xml".to_string(),
            format!("{}.presentationml.notesMaster+xml", CT_BASE),
        ));
        overrides.push(("/ppt/theme/theme2.xml".to_string(), format!("{}.theme+xml", CT_BASE)));
        for n in notes {
            overrides.push((
                format!("/ppt/notesSlides/notesSlide{}.xml", n),
                format!("{}.presentationml.notesSlide+xml", CT_BASE),
            ));
        }
    }
    for (part, content_type) in overrides {
        write!(xml, r#"<Override PartName="{}" ContentType="{}"/>"#, part, content_type)?;
    }
    xml.push_str("</Types>");
    Ok(xml)
}

fn core_xml(presentation: &Presentation, created: DateTime<Utc>) -> Result<String, std::fmt::Error> {
    let title = escape_markup(&presentation.title);
    let stamp = created.format("%Y-%m-%dT%H:%M:%SZ");
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    xml.push_str(concat!(
        r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
        r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
        r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#
    ));
    write!(xml, "<dc:title>{}</dc:title>", title)?;
    write!(xml, "<dc:subject>{}</dc:subject>", title)?;
    write!(xml, "<dc:creator>{}</dc:creator>", DOCUMENT_AUTHOR)?;
    write!(xml, "<cp:lastModifiedBy>{}</cp:lastModifiedBy>", DOCUMENT_AUTHOR)?;
    write!(xml, r#"<dcterms:created xsi:type="dcterms:W3CDTF">{}</dcterms:created>"#, stamp)?;
    write!(xml, r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{}</dcterms:modified>"#, stamp)?;
    xml.push_str("</cp:coreProperties>");
    Ok(xml)
}

fn app_xml(slide_count: usize, notes_count: usize) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(512);
    xml.push_str(XML_DECL);
    xml.push_str(concat!(
        r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
        r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#
    ));
    write!(xml, "<Application>{}</Application>", DOCUMENT_AUTHOR)?;
    write!(xml, "<PresentationFormat>Custom</PresentationFormat>")?;
    write!(xml, "<Slides>{}</Slides><Notes>{}</Notes>", slide_count, notes_count)?;
    write!(xml, "<Company>{}</Company>", DOCUMENT_AUTHOR)?;
    xml.push_str("</Properties>");
    Ok(xml)
}

fn presentation_xml(slide_count: usize, notes_master_rel: Option<usize>) -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:presentation xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" saveSubsetFonts="1">"#,
        NS_A, NS_R, NS_P
    )?;
    xml.push_str(r#"<p:sldMasterIdLst><p:sldMasterId id="2147483648" r:id="rId1"/></p:sldMasterIdLst>"#);
    if let Some(rel_id) = notes_master_rel {
        write!(
            xml,
            r#"<p:notesMasterIdLst><p:notesMasterId r:id="rId{}"/></p:notesMasterIdLst>"#,
            rel_id
        )?;
    }
    xml.push_str("<p:sldIdLst>");
    for n in 0..slide_count {
        write!(xml, r#"<p:sldId id="{}" r:id="rId{}"/>"#, 256 + n, n + 2)?;
    }
    xml.push_str("</p:sldIdLst>");
    write!(
        xml,
        r#"<p:sldSz cx="{}" cy="{}"/>"#,
        emu(SLIDE_WIDTH_IN),
        emu(SLIDE_HEIGHT_IN)
    )?;
    xml.push_str(r#"<p:notesSz cx="6858000" cy="9144000"/>"#);
    xml.push_str("</p:presentation>");
    Ok(xml)
}

fn slide_master_xml() -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:sldMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P)?;
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(EMPTY_GROUP);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(CLR_MAP);
    xml.push_str(r#"<p:sldLayoutIdLst><p:sldLayoutId id="2147483649" r:id="rId1"/></p:sldLayoutIdLst>"#);
    xml.push_str("</p:sldMaster>");
    Ok(xml)
}

fn slide_layout_xml() -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(
        xml,
        r#"<p:sldLayout xmlns:a="{}" xmlns:r="{}" xmlns:p="{}" type="blank" preserve="1">"#,
        NS_A, NS_R, NS_P
    )?;
    xml.push_str(r#"<p:cSld name="Blank"><p:spTree>"#);
    xml.push_str(EMPTY_GROUP);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str("<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr></p:sldLayout>");
    Ok(xml)
}

fn notes_master_xml() -> Result<String, std::fmt::Error> {
    let mut xml = String::with_capacity(1024);
    xml.push_str(XML_DECL);
    write!(xml, r#"<p:notesMaster xmlns:a="{}" xmlns:r="{}" xmlns:p="{}">"#, NS_A, NS_R, NS_P)?;
    xml.push_str("<p:cSld><p:spTree>");
    xml.push_str(EMPTY_GROUP);
    xml.push_str("</p:spTree></p:cSld>");
    xml.push_str(CLR_MAP);
    xml.push_str("</p:notesMaster>");
    Ok(xml)
}

/// Theme part: the deck's colors and font mapped onto the Office scheme.
fn theme_xml(theme: &Theme, name: &str) -> Result<String, std::fmt::Error> {
    let primary = hex_color(&theme.primary_color, "1A5276");
    let secondary = hex_color(&theme.secondary_color, "2ECC71");
    let accent = theme
        .accent_color
        .as_deref()
        .map(|c| hex_color(c, "E74C3C"))
        .unwrap_or_else(|| "E74C3C".to_string());
    let typeface = escape_markup(&primary_typeface(&theme.font_family));

    let mut xml = String::with_capacity(4096);
    xml.push_str(XML_DECL);
    write!(xml, r#"<a:theme xmlns:a="{}" name="{}">"#, NS_A, escape_markup(name))?;
    write!(xml, r#"<a:themeElements><a:clrScheme name="{}">"#, escape_markup(&theme.name))?;
    xml.push_str(r#"<a:dk1><a:srgbClr val="000000"/></a:dk1><a:lt1><a:srgbClr val="FFFFFF"/></a:lt1>"#);
    write!(xml, r#"<a:dk2><a:srgbClr val="{}"/></a:dk2>"#, primary)?;
    xml.push_str(r#"<a:lt2><a:srgbClr val="F2F2F2"/></a:lt2>"#);
    write!(xml, r#"<a:accent1><a:srgbClr val="{}"/></a:accent1>"#, primary)?;
    write!(xml, r#"<a:accent2><a:srgbClr val="{}"/></a:accent2>"#, secondary)?;
    write!(xml, r#"<a:accent3><a:srgbClr val="{}"/></a:accent3>"#, accent)?;
    xml.push_str(concat!(
        r#"<a:accent4><a:srgbClr val="F39C12"/></a:accent4>"#,
        r#"<a:accent5><a:srgbClr val="8E44AD"/></a:accent5>"#,
        r#"<a:accent6><a:srgbClr val="16A085"/></a:accent6>"#,
        r#"<a:hlink><a:srgbClr val="2980B9"/></a:hlink>"#,
        r#"<a:folHlink><a:srgbClr val="7F8C8D"/></a:folHlink></a:clrScheme>"#
    ));
    write!(
        xml,
        r#"<a:fontScheme name="{0}"><a:majorFont><a:latin typeface="{0}"/><a:ea typeface=""/><a:cs typeface=""/></a:majorFont><a:minorFont><a:latin typeface="{0}"/><a:ea typeface=""/><a:cs typeface=""/></a:minorFont></a:fontScheme>"#,
        typeface
    )?;
    xml.push_str(r#"<a:fmtScheme name="Office"><a:fillStyleLst>"#);
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:fillStyleLst><a:lnStyleLst>");
    for width in [6350, 12700, 19050] {
        write!(
            xml,
            r#"<a:ln w="{}"><a:solidFill><a:schemeClr val="phClr"/></a:solidFill></a:ln>"#,
            width
        )?;
    }
    xml.push_str("</a:lnStyleLst><a:effectStyleLst>");
    for _ in 0..3 {
        xml.push_str("<a:effectStyle><a:effectLst/></a:effectStyle>");
    }
    xml.push_str("</a:effectStyleLst><a:bgFillStyleLst>");
    for _ in 0..3 {
        xml.push_str(r#"<a:solidFill><a:schemeClr val="phClr"/></a:solidFill>"#);
    }
    xml.push_str("</a:bgFillStyleLst></a:fmtScheme></a:themeElements></a:theme>");
    Ok(xml)
}

struct Package {
    writer: ZipWriter<Cursor<Vec<u8>>>,
}

impl Package {
    fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    fn add_part(&mut self, path: &str, xml: &str) -> Result<(), ExportError> {
        let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        self.writer.start_file(path, options)?;
        self.writer.write_all(xml.as_bytes())?;
        Ok(())
    }

    fn finish(self) -> Result<Vec<u8>, ExportError> {
        Ok(self.writer.finish()?.into_inner())
    }
}

/// Build the complete `.pptx` package for `presentation`.
pub fn build_deck(presentation: &Presentation, created: DateTime<Utc>) -> Result<Vec<u8>, ExportError> {
    let slides = &presentation.slides;
    let slide_count = slides.len();
    // 1-based numbers of slides that carry notes.
    let annotated: Vec<usize> = slides
        .iter()
        .enumerate()
        .filter(|(_, s)| speaker_notes(s).is_some())
        .map(|(i, _)| i + 1)
        .collect();

    let mut package = Package::new();
    package.add_part("[Content_Types].xml", &content_types_xml(slide_count, &annotated)?)?;
    package.add_part(
        "_rels/.rels",
        &rels_xml(vec![
            rel(1, "officeDocument", "ppt/presentation.xml"),
            (
                "rId2".to_string(),
                "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties".to_string(),
                "docProps/core.xml".to_string(),
            ),
            rel(3, "extended-properties", "docProps/app.xml"),
        ])?,
    )?;
    package.add_part("docProps/core.xml", &core_xml(presentation, created)?)?;
    package.add_part("docProps/app.xml", &app_xml(slide_count, annotated.len())?)?;

    // rId1 master, rId2.. slides, then theme, then the notes master.
    let theme_rel = slide_count + 2;
    let notes_master_rel = (!annotated.is_empty()).then_some(slide_count + 3);
    package.add_part("ppt/presentation.xml", &presentation_xml(slide_count, notes_master_rel)?)?;

    let mut pres_rels = vec![rel(1, "slideMaster", "slideMasters/slideMaster1.xml")];
    for n in 1..=slide_count {
        pres_rels.push(rel(n + 1, "slide", format!("slides/slide{}.xml", n)));
    }
    pres_rels.push(rel(theme_rel, "theme", "theme/theme1.xml"));
    if let Some(id) = notes_master_rel {
        pres_rels.push(rel(id, "notesMaster", "notesMasters/notesMaster1.xml"));
    }
    package.add_part("ppt/_rels/presentation.xml.rels", &rels_xml(pres_rels)?)?;

    package.add_part("ppt/slideMasters/slideMaster1.xml", &slide_master_xml()?)?;
    package.add_part(
        "ppt/slideMasters/_rels/slideMaster1.xml.rels",
        &rels_xml(vec![
            rel(1, "slideLayout", "../slideLayouts/slideLayout1.xml"),
            rel(2, "theme", "../theme/theme1.xml"),
        ])?,
    )?;
    package.add_part("ppt/slideLayouts/slideLayout1.xml", &slide_layout_xml()?)?;
    package.add_part(
        "ppt/slideLayouts/_rels/slideLayout1.xml.rels",
        &rels_xml(vec![rel(1, "slideMaster", "../slideMasters/slideMaster1.xml")])?,
    )?;
    package.add_part("ppt/theme/theme1.xml", &theme_xml(&presentation.theme, "Deck Theme")?)?;

    for (index, slide) in slides.iter().enumerate() {
        let n = index + 1;
        package.add_part(
            &format!("ppt/slides/slide{}.xml", n),
            &slide_xml(slide, &presentation.theme, index == 0)?,
        )?;

        let mut slide_rels = vec![rel(1, "slideLayout", "../slideLayouts/slideLayout1.xml")];
        if let Some(notes) = speaker_notes(slide) {
            slide_rels.push(rel(2, "notesSlide", format!("../notesSlides/notesSlide{}.xml", n)));
            package.add_part(&format!("ppt/notesSlides/notesSlide{}.xml", n), &notes_slide_xml(notes)?)?;
            package.add_part(
                &format!("ppt/notesSlides/_rels/notesSlide{}.xml.rels", n),
                &rels_xml(vec![
                    rel(1, "notesMaster", "../notesMasters/notesMaster1.xml"),
                    rel(2, "slide", format!("../slides/slide{}.xml", n)),
                ])?,
            )?;
        }
        package.add_part(&format!("ppt/slides/_rels/slide{}.xml.rels", n), &rels_xml(slide_rels)?)?;
    }

    if notes_master_rel.is_some() {
        package.add_part("ppt/notesMasters/notesMaster1.xml", &notes_master_xml()?)?;
        package.add_part(
            "ppt/notesMasters/_rels/notesMaster1.xml.rels",
            &rels_xml(vec![rel(1, "theme", "../theme/theme2.xml")])?,
        )?;
        package.add_part("ppt/theme/theme2.xml", &theme_xml(&presentation.theme, "Notes Theme")?)?;
    }

    tracing::debug!(slides = slide_count, notes = annotated.len(), "Deck package assembled");
    package.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;
    use crate::model::{Quote, SlideContent};
    use crate::themes;
    use std::io::Read;

    fn open(bytes: Vec<u8>) -> zip::ZipArchive<Cursor<Vec<u8>>> {
        zip::ZipArchive::new(Cursor::new(bytes)).unwrap()
    }

    fn part(archive: &mut zip::ZipArchive<Cursor<Vec<u8>>>, name: &str) -> String {
        let mut out = String::new();
        archive.by_name(name).unwrap().read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_hex_color() {
        assert_eq!(hex_color("#1a5276", "000000"), "1A5276");
        assert_eq!(hex_color("#fff", "000000"), "FFFFFF");
        assert_eq!(hex_color("red", "000000"), "000000");
        assert_eq!(hex_color("#12345", "000000"), "000000");
    }

    #[test]
    fn test_primary_typeface() {
        assert_eq!(primary_typeface("Inter, sans-serif"), "Inter");
        assert_eq!(primary_typeface("'Playfair Display', serif"), "Playfair Display");
        assert_eq!(primary_typeface(""), "Calibri");
    }

    #[test]
    fn test_deck_has_every_slide_and_its_notes() {
        let deck = fallback::synthesize("Rivers");
        let bytes = build_deck(&deck, Utc::now()).unwrap();
        let mut archive = open(bytes);

        for n in 1..=deck.slides.len() {
            assert!(archive.by_name(&format!("ppt/slides/slide{}.xml", n)).is_ok());
        }
        assert!(archive.by_name("ppt/slides/slide10.xml").is_err());
        // The cover has no notes; every other fallback slide does.
        assert!(archive.by_name("ppt/notesSlides/notesSlide1.xml").is_err());
        let notes = part(&mut archive, "ppt/notesSlides/notesSlide2.xml");
        assert!(notes.contains("This is an introduction slide."));

        let presentation = part(&mut archive, "ppt/presentation.xml");
        assert!(presentation.contains(r#"<p:sldSz cx="9144000" cy="5143500"/>"#));
        assert!(presentation.contains("<p:notesMasterIdLst>"));
        assert_eq!(presentation.matches("<p:sldId ").count(), deck.slides.len());
    }

    #[test]
    fn test_document_properties() {
        let deck = fallback::synthesize("Rivers & Lakes");
        let mut archive = open(build_deck(&deck, Utc::now()).unwrap());
        let core = part(&mut archive, "docProps/core.xml");
        assert!(core.contains("<dc:title>Rivers &amp; Lakes</dc:title>"));
        assert!(core.contains("<dc:subject>Rivers &amp; Lakes</dc:subject>"));
        assert!(core.contains("<dc:creator>AI Presentation Generator</dc:creator>"));
        let app = part(&mut archive, "docProps/app.xml");
        assert!(app.contains("<Company>AI Presentation Generator</Company>"));
        assert!(app.contains("<Slides>9</Slides>"));
    }

    #[test]
    fn test_quote_boxes() {
        let mut deck = fallback::synthesize("Stoicism");
        deck.slides = vec![
            Slide::new("Cover"),
            Slide {
                content: Some(SlideContent::new(ContentBlock::Quote {
                    quote: Quote {
                        text: "Know thyself".to_string(),
                        author: "Socrates".to_string(),
                    },
                })),
                ..Slide::new("Wisdom")
            },
        ];
        let mut archive = open(build_deck(&deck, Utc::now()).unwrap());
        let xml = part(&mut archive, "ppt/slides/slide2.xml");

        assert!(xml.contains("&quot;Know thyself&quot;"));
        assert!(xml.contains("— Socrates"));
        let quote_at = xml.find("Know thyself").unwrap();
        let quote_para = &xml[xml[..quote_at].rfind("<a:p>").unwrap()..quote_at];
        assert!(quote_para.contains(r#"algn="ctr""#));
        assert!(quote_para.contains(r#"i="1""#));
        assert!(quote_para.contains(r#"sz="2400""#));
        // 1in, 2in
        assert!(xml.contains(r#"<a:off x="914400" y="1828800"/>"#));
        assert!(archive.by_name("ppt/notesMasters/notesMaster1.xml").is_err());
    }

    #[test]
    fn test_title_box_first_vs_later() {
        let theme = themes::default_theme();
        let first = slide_xml(&Slide::new("Hello"), &theme, true).unwrap();
        assert!(first.contains(r#"<a:pPr algn="ctr"/><a:r><a:rPr lang="en-US" sz="4400" b="1""#));
        let later = slide_xml(&Slide::new("Hello"), &theme, false).unwrap();
        assert!(later.contains(r#"<a:pPr algn="l"/><a:r><a:rPr lang="en-US" sz="3600" b="1""#));
        // Background falls back to the theme primary color.
        assert!(later.contains(r#"<a:srgbClr val="2C3E50"/></a:solidFill><a:effectLst/>"#));
    }

    #[test]
    fn test_timeline_lines_separated_by_blank_paragraph() {
        let deck = fallback::synthesize("Tea");
        let xml = slide_xml(&deck.slides[5], &deck.theme, false).unwrap();
        assert!(xml.contains("<a:t>Early Stage: Initial developments related to Tea</a:t>"));
        assert!(xml.contains(r#"<a:endParaRPr lang="en-US" sz="1600"/>"#));
    }

    #[test]
    fn test_empty_notes_add_no_notes_slide() {
        let mut deck = fallback::synthesize("Moss");
        deck.slides = vec![
            Slide::new("Cover"),
            Slide {
                content: Some(SlideContent::with_notes(
                    ContentBlock::Paragraph {
                        text: "Green".to_string(),
                    },
                    "",
                )),
                ..Slide::new("Silent")
            },
        ];
        let mut archive = open(build_deck(&deck, Utc::now()).unwrap());
        assert!(archive.by_name("ppt/notesSlides/notesSlide2.xml").is_err());
        assert!(archive.by_name("ppt/notesMasters/notesMaster1.xml").is_err());
        let rels = part(&mut archive, "ppt/slides/_rels/slide2.xml.rels");
        assert!(!rels.contains("notesSlide"));
        let presentation = part(&mut archive, "ppt/presentation.xml");
        assert!(!presentation.contains("<p:notesMasterIdLst>"));
        let types = part(&mut archive, "[Content_Types].xml");
        assert!(!types.contains("notesSlide"));
    }

    #[test]
    fn test_control_characters_are_dropped_from_parts() {
        let mut deck = fallback::synthesize("Bells");
        deck.title = "Ring\u{7}ing".to_string();
        deck.slides = vec![
            Slide::new("Cover"),
            Slide {
                content: Some(SlideContent::with_notes(
                    ContentBlock::Paragraph {
                        text: "bad\u{8}char".to_string(),
                    },
                    "note\u{1}here",
                )),
                ..Slide::new("Ti\u{0}tle")
            },
        ];
        let mut archive = open(build_deck(&deck, Utc::now()).unwrap());
        let slide = part(&mut archive, "ppt/slides/slide2.xml");
        assert!(slide.contains("<a:t>badchar</a:t>"));
        assert!(slide.contains("<a:t>Title</a:t>"));
        let notes = part(&mut archive, "ppt/notesSlides/notesSlide2.xml");
        assert!(notes.contains("<a:t>notehere</a:t>"));
        let core = part(&mut archive, "docProps/core.xml");
        assert!(core.contains("<dc:title>Ringing</dc:title>"));
        for text in [slide, notes, core] {
            assert!(!text.chars().any(|c| c < '\u{20}' && !matches!(c, '\t' | '\n' | '\r')));
        }
    }
}
