//! DeckForge Core - Slide Document Model and Multi-Format Rendering Pipeline
//!
//! # Guarantees
//! 1. Generated Output Is Untrusted
//! 2. Validation Precedes Every Presentation
//! 3. Generation Never Dead-Ends (fallback deck)
//! 4. Fallback Is Deterministic
//! 5. Presentations Are Values (copy-on-write edits)
//! 6. Exporters Read, Never Write

pub mod model;
pub mod themes;
pub mod validation;
pub mod generation;
pub mod fallback;
pub mod pipeline;
pub mod render;
pub mod export;
pub mod session;
pub mod hashing;

pub use model::{ChartData, ChartKind, Columns, ContentBlock, Presentation, Quote, Slide, SlideContent, Theme, TimelineEvent, Transition};
pub use themes::ThemeCatalog;
pub use validation::{ValidationError, ValidationReport, ValidationRule, ValidationViolation, Validator, ViolationSeverity};
pub use generation::{GeminiConfig, GeminiGenerator, GenerationError, OfflineGenerator, TextGenerator};
pub use pipeline::{Advisory, AdvisoryKind, GenerationOutcome, PipelineError, PresentationPipeline};
pub use render::{render_slide, RenderedSlide};
pub use export::{ExportError, ExportFormat, ExportSink, ExportedFile};
pub use session::{PresenterTimer, Session, SessionError};
pub use hashing::{canonical_json, presentation_fingerprint};
