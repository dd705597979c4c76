//! Structured-data export: the whole Presentation, pretty-printed.

use super::{sanitize_title, ExportEngine, ExportError, ExportFormat, ExportSink, ExportedFile};
use crate::model::Presentation;

pub const MEDIA_TYPE: &str = "application/json";

#[derive(Debug, Default, Clone, Copy)]
pub struct JsonExporter;

impl ExportEngine for JsonExporter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Docx
    }

    fn export(&self, presentation: &Presentation, sink: &mut dyn ExportSink) -> Result<(), ExportError> {
        let body = serde_json::to_string_pretty(presentation)?;
        sink.deliver(ExportedFile {
            filename: format!("{}_docx_export.json", sanitize_title(&presentation.title)),
            media_type: MEDIA_TYPE,
            bytes: body.into_bytes(),
        })
    }
}
