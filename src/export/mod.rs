//! Export Engines
//!
//! Three independent serializers over the same Presentation. Each engine
//! matches every content block variant itself and hands exactly one file
//! to an `ExportSink`; none of them mutate the Presentation.

pub mod html;
pub mod json;
pub mod pptx;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

use crate::hashing::sha256_hex;
use crate::model::Presentation;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Markup error: {0}")]
    Markup(#[from] std::fmt::Error),

    #[error("Export filename is not a plain file name: {0:?}")]
    UnsafeFilename(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Print-ready hypertext document.
    #[default]
    Pdf,
    /// Binary slide deck.
    Pptx,
    /// Structured-data dump.
    Docx,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 3] = [ExportFormat::Pdf, ExportFormat::Pptx, ExportFormat::Docx];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Pdf => "pdf",
            ExportFormat::Pptx => "pptx",
            ExportFormat::Docx => "docx",
        }
    }
}

/// One exported file, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub filename: String,
    pub media_type: &'static str,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    pub fn sha256(&self) -> String {
        sha256_hex(&self.bytes)
    }
}

/// Where exported files go: a download directory, a print context, memory.
pub trait ExportSink {
    fn deliver(&mut self, file: ExportedFile) -> Result<(), ExportError>;
}

/// Writes each file into a directory.
pub struct DirectorySink {
    dir: PathBuf,
    written: Vec<PathBuf>,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            written: vec![],
        }
    }

    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }
}

impl ExportSink for DirectorySink {
    fn deliver(&mut self, file: ExportedFile) -> Result<(), ExportError> {
        let mut components = Path::new(&file.filename).components();
        let name = match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => name.to_owned(),
            _ => return Err(ExportError::UnsafeFilename(file.filename)),
        };
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, &file.bytes)?;
        tracing::info!(
            path = %path.display(),
            bytes = file.bytes.len(),
            sha256 = %file.sha256(),
            "Export written"
        );
        self.written.push(path);
        Ok(())
    }
}

/// Keeps delivered files in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub files: Vec<ExportedFile>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExportSink for MemorySink {
    fn deliver(&mut self, file: ExportedFile) -> Result<(), ExportError> {
        self.files.push(file);
        Ok(())
    }
}

/// Export engine trait - one file format per engine
pub trait ExportEngine {
    fn format(&self) -> ExportFormat;
    fn export(&self, presentation: &Presentation, sink: &mut dyn ExportSink) -> Result<(), ExportError>;
}

pub fn engine_for(format: ExportFormat) -> Box<dyn ExportEngine> {
    match format {
        ExportFormat::Pdf => Box::new(html::HtmlExporter),
        ExportFormat::Pptx => Box::new(pptx::PptxExporter),
        ExportFormat::Docx => Box::new(json::JsonExporter),
    }
}

/// Export `presentation` in `format`, delivering one file to `sink`.
pub fn export(
    presentation: &Presentation,
    format: ExportFormat,
    sink: &mut dyn ExportSink,
) -> Result<(), ExportError> {
    engine_for(format).export(presentation, sink)
}

/// Escape text for HTML/XML element content and attribute values.
/// Characters XML 1.0 does not allow (C0 controls other than tab, line feed
/// and carriage return, U+FFFE, U+FFFF) are dropped.
pub(crate) fn escape_markup(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\t' | '\n' | '\r' => out.push(c),
            c if c < '\u{20}' || c == '\u{FFFE}' || c == '\u{FFFF}' => {}
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// File-name stem for a title. Every whitespace run, leading and trailing
/// ones included, becomes a single underscore; path separators and control
/// characters become underscores too.
pub fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut in_whitespace = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        match c {
            '/' | '\\' => out.push('_'),
            c if c.is_control() => out.push('_'),
            c => out.push(c),
        }
    }
    out
}

/// Write-side helper for callers that just want files on disk.
pub fn export_to_dir(
    presentation: &Presentation,
    format: ExportFormat,
    dir: &Path,
) -> Result<PathBuf, ExportError> {
    let mut sink = DirectorySink::new(dir);
    export(presentation, format, &mut sink)?;
    Ok(sink.written.pop().unwrap_or_else(|| dir.to_path_buf()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback;

    #[test]
    fn test_sanitize_title() {
        assert_eq!(sanitize_title("Quantum Computing"), "Quantum_Computing");
        assert_eq!(sanitize_title("A  \t B\nC"), "A_B_C");
        assert_eq!(sanitize_title("Solo"), "Solo");
        assert_eq!(sanitize_title(" Deck "), "_Deck_");
        assert_eq!(sanitize_title("   "), "_");
        assert_eq!(sanitize_title("../escaped"), ".._escaped");
        assert_eq!(sanitize_title("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_title("nul\0byte"), "nul_byte");
    }

    #[test]
    fn test_escape_markup_drops_xml_illegal_characters() {
        assert_eq!(escape_markup("bad\u{8}char"), "badchar");
        assert_eq!(escape_markup("a\u{0}b\u{1F}c\u{FFFF}"), "abc");
        assert_eq!(escape_markup("tab\tline\nreturn\r"), "tab\tline\nreturn\r");
    }

    #[test]
    fn test_escape_markup() {
        assert_eq!(
            escape_markup(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }

    #[test]
    fn test_engines_report_their_format() {
        for format in ExportFormat::ALL {
            assert_eq!(engine_for(format).format(), format);
        }
    }

    #[test]
    fn test_each_export_delivers_one_file() {
        let deck = fallback::synthesize("Coral Reefs");
        let before = deck.clone();
        let mut sink = MemorySink::new();
        for format in ExportFormat::ALL {
            export(&deck, format, &mut sink).unwrap();
        }
        let names: Vec<_> = sink.files.iter().map(|f| f.filename.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "Coral_Reefs.html",
                "Coral_Reefs.pptx",
                "Coral_Reefs_docx_export.json"
            ]
        );
        assert_eq!(deck, before);
    }

    #[test]
    fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let deck = fallback::synthesize("Tides");
        let path = export_to_dir(&deck, ExportFormat::Docx, dir.path()).unwrap();
        assert_eq!(path, dir.path().join("Tides_docx_export.json"));
        assert!(path.exists());
    }

    #[test]
    fn test_titles_cannot_escape_export_dir() {
        let root = tempfile::tempdir().unwrap();
        let out = root.path().join("out");
        for title in ["../escaped", "a/b", "/abs/path", ".."] {
            let mut deck = fallback::synthesize("Tides");
            deck.title = title.to_string();
            let path = export_to_dir(&deck, ExportFormat::Docx, &out).unwrap();
            assert_eq!(path.parent(), Some(out.as_path()), "{}", title);
            assert!(path.exists());
        }
        assert!(!root.path().join("escaped_docx_export.json").exists());
    }

    #[test]
    fn test_directory_sink_rejects_path_filenames() {
        let root = tempfile::tempdir().unwrap();
        let mut sink = DirectorySink::new(root.path().join("out"));
        for filename in ["../x.json", "sub/x.json", "/x.json", "..", ""] {
            let err = sink
                .deliver(ExportedFile {
                    filename: filename.to_string(),
                    media_type: "application/json",
                    bytes: b"{}".to_vec(),
                })
                .unwrap_err();
            assert!(matches!(err, ExportError::UnsafeFilename(_)), "{}", filename);
        }
        assert!(sink.written().is_empty());
        assert!(!root.path().join("x.json").exists());
    }
}
