//! Presenter Session
//!
//! Framework-free UI state around one live Presentation: the busy flag,
//! slide navigation, notes and theme edits, export and the presentation
//! timer. Every edit swaps in a new `Arc<Presentation>`, so pointer
//! identity changes exactly when content does.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::task::JoinHandle;

use crate::export::{self, ExportError, ExportFormat, ExportSink};
use crate::model::Presentation;
use crate::pipeline::{Advisory, GenerationOutcome, PipelineError, PresentationPipeline};
use crate::render::{self, RenderedSlide};
use crate::themes::ThemeCatalog;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("A generation request is already in progress")]
    Busy,

    #[error("No presentation loaded")]
    NoPresentation,

    #[error("Unknown theme: {0}")]
    UnknownTheme(String),

    #[error("Slide {index} out of range ({count} slides)")]
    SlideOutOfRange { index: usize, count: usize },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

/// `MM:SS`; minutes keep counting past 59.
pub fn format_elapsed(seconds: u64) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}

/// One-second ticker for presentation mode.
///
/// Runs on the ambient tokio runtime; the tick task is aborted on `stop`
/// and on drop.
#[derive(Debug, Default)]
pub struct PresenterTimer {
    elapsed: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl PresenterTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset to zero and start ticking. Restarting a running timer resets it.
    pub fn start(&mut self) {
        self.stop();
        self.elapsed.store(0, Ordering::SeqCst);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                tracing::warn!("Presenter timer needs a tokio runtime: {}", e);
                return;
            }
        };

        let elapsed = Arc::clone(&self.elapsed);
        self.handle = Some(runtime.spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                elapsed.fetch_add(1, Ordering::SeqCst);
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::SeqCst)
    }

    pub fn display(&self) -> String {
        format_elapsed(self.elapsed_secs())
    }
}

impl Drop for PresenterTimer {
    fn drop(&mut self) {
        self.stop();
    }
}

#[derive(Debug, Default)]
pub struct Session {
    presentation: Option<Arc<Presentation>>,
    current_slide: usize,
    busy: bool,
    show_notes: bool,
    advisory: Option<Advisory>,
    catalog: ThemeCatalog,
    timer: PresenterTimer,
}

impl Session {
    pub fn new(catalog: ThemeCatalog) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn presentation(&self) -> Option<&Arc<Presentation>> {
        self.presentation.as_ref()
    }

    pub fn current_slide(&self) -> usize {
        self.current_slide
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    /// Advisory from the last generation, if it fell back.
    pub fn advisory(&self) -> Option<&Advisory> {
        self.advisory.as_ref()
    }

    pub fn notes_visible(&self) -> bool {
        self.show_notes
    }

    pub fn is_presenting(&self) -> bool {
        self.timer.is_running()
    }

    pub fn catalog(&self) -> &ThemeCatalog {
        &self.catalog
    }

    fn live(&self) -> Result<&Arc<Presentation>, SessionError> {
        self.presentation.as_ref().ok_or(SessionError::NoPresentation)
    }

    /// Install an already-built presentation at slide 0.
    pub fn load(&mut self, presentation: Presentation) {
        self.presentation = Some(Arc::new(presentation));
        self.current_slide = 0;
        self.advisory = None;
    }

    /// Mark a generation as outstanding. Returns `false` if one already is.
    pub fn begin_generation(&mut self) -> bool {
        if self.busy {
            tracing::debug!("Generation requested while busy; ignored");
            return false;
        }
        self.busy = true;
        true
    }

    pub fn finish_generation(&mut self, outcome: GenerationOutcome) {
        self.presentation = Some(Arc::new(outcome.presentation));
        self.advisory = outcome.advisory;
        self.current_slide = 0;
        self.busy = false;
    }

    /// Run one generation through `pipeline`.
    ///
    /// Returns `Ok(false)` without doing anything when a generation is
    /// already outstanding.
    pub async fn generate(&mut self, pipeline: &PresentationPipeline, topic: &str) -> Result<bool, SessionError> {
        if !self.begin_generation() {
            return Ok(false);
        }
        match pipeline.generate_presentation(topic).await {
            Ok(outcome) => {
                self.finish_generation(outcome);
                Ok(true)
            }
            Err(e) => {
                self.busy = false;
                Err(e.into())
            }
        }
    }

    fn last_index(&self) -> Option<usize> {
        self.presentation
            .as_ref()
            .and_then(|p| p.slide_count().checked_sub(1))
    }

    pub fn next_slide(&mut self) {
        if self.busy {
            return;
        }
        if let Some(last) = self.last_index() {
            self.current_slide = (self.current_slide + 1).min(last);
        }
    }

    pub fn previous_slide(&mut self) {
        if self.busy {
            return;
        }
        self.current_slide = self.current_slide.saturating_sub(1);
    }

    /// Jump to `index`, clamped to the deck.
    pub fn go_to(&mut self, index: usize) {
        if self.busy {
            return;
        }
        if let Some(last) = self.last_index() {
            self.current_slide = index.min(last);
        }
    }

    /// Current slide's notes, empty when it has none.
    pub fn current_notes(&self) -> &str {
        self.presentation
            .as_ref()
            .and_then(|p| p.slide(self.current_slide))
            .and_then(|s| s.notes())
            .unwrap_or("")
    }

    pub fn toggle_notes(&mut self) {
        self.show_notes = !self.show_notes;
    }

    /// Replace the current slide's notes.
    pub fn save_notes(&mut self, notes: impl Into<String>) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        let live = self.live()?;
        let count = live.slide_count();
        let updated = live
            .with_slide_notes(self.current_slide, notes)
            .ok_or(SessionError::SlideOutOfRange {
                index: self.current_slide,
                count,
            })?;
        self.presentation = Some(Arc::new(updated));
        Ok(())
    }

    /// Replace the whole theme with the catalog entry called `name`.
    pub fn change_theme(&mut self, name: &str) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        let live = self.live()?;
        let theme = self
            .catalog
            .get(name)
            .cloned()
            .ok_or_else(|| SessionError::UnknownTheme(name.to_string()))?;
        let updated = live.with_theme(theme);
        self.presentation = Some(Arc::new(updated));
        tracing::debug!(theme = name, "Theme changed");
        Ok(())
    }

    /// Enter or leave presentation mode. Returns whether it is now on.
    pub fn toggle_presentation_mode(&mut self) -> bool {
        if self.timer.is_running() {
            self.timer.stop();
            false
        } else {
            self.timer.start();
            true
        }
    }

    pub fn elapsed_display(&self) -> String {
        self.timer.display()
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.timer.elapsed_secs()
    }

    pub fn render_at(&self, index: usize) -> Result<RenderedSlide, SessionError> {
        let live = self.live()?;
        let slide = live.slide(index).ok_or(SessionError::SlideOutOfRange {
            index,
            count: live.slide_count(),
        })?;
        Ok(render::render_slide(slide, &live.theme, index == 0))
    }

    pub fn render_current(&self) -> Result<RenderedSlide, SessionError> {
        self.render_at(self.current_slide)
    }

    pub fn export(&self, format: ExportFormat, sink: &mut dyn ExportSink) -> Result<(), SessionError> {
        if self.busy {
            return Err(SessionError::Busy);
        }
        export::export(self.live()?, format, sink)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::MemorySink;
    use crate::fallback;
    use crate::generation::{FnGenerator, GenerationError};
    use crate::model::Slide;

    fn loaded(topic: &str) -> Session {
        let mut session = Session::default();
        session.load(fallback::synthesize(topic));
        session
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(0), "00:00");
        assert_eq!(format_elapsed(75), "01:15");
        assert_eq!(format_elapsed(3600), "60:00");
    }

    #[test]
    fn test_navigation_clamps() {
        let mut session = loaded("Owls");
        session.previous_slide();
        assert_eq!(session.current_slide(), 0);
        for _ in 0..20 {
            session.next_slide();
        }
        assert_eq!(session.current_slide(), 8);
        session.go_to(3);
        assert_eq!(session.current_slide(), 3);
        session.go_to(99);
        assert_eq!(session.current_slide(), 8);
    }

    #[test]
    fn test_navigation_without_presentation_is_noop() {
        let mut session = Session::default();
        session.next_slide();
        session.go_to(4);
        assert_eq!(session.current_slide(), 0);
        assert_eq!(session.current_notes(), "");
    }

    #[test]
    fn test_busy_blocks_navigation_and_export() {
        let mut session = loaded("Owls");
        assert!(session.begin_generation());
        assert!(!session.begin_generation());

        session.next_slide();
        assert_eq!(session.current_slide(), 0);
        let mut sink = MemorySink::new();
        assert!(matches!(
            session.export(ExportFormat::Docx, &mut sink),
            Err(SessionError::Busy)
        ));
        assert!(sink.files.is_empty());
    }

    #[test]
    fn test_save_notes_replaces_presentation() {
        let mut session = loaded("Owls");
        session.go_to(2);
        let before = Arc::clone(session.presentation().unwrap());

        session.save_notes("Mention barn owls").unwrap();
        let after = session.presentation().unwrap();
        assert!(!Arc::ptr_eq(&before, after));
        assert_eq!(session.current_notes(), "Mention barn owls");
        // The old value is untouched.
        assert_ne!(before.slides[2].notes(), Some("Mention barn owls"));
    }

    #[test]
    fn test_save_notes_on_bare_slide_creates_title_only() {
        let mut session = Session::default();
        session.load(Presentation {
            title: "T".to_string(),
            theme: crate::themes::default_theme(),
            slides: vec![Slide::new("Bare")],
        });
        session.save_notes("hello").unwrap();
        let slide = &session.presentation().unwrap().slides[0];
        assert_eq!(slide.block().map(|b| b.kind()), Some("title-only"));
        assert_eq!(slide.notes(), Some("hello"));
    }

    #[test]
    fn test_change_theme() {
        let mut session = loaded("Owls");
        session.change_theme("Dark Elegance").unwrap();
        assert_eq!(session.presentation().unwrap().theme.name, "Dark Elegance");

        let before = Arc::clone(session.presentation().unwrap());
        assert!(matches!(
            session.change_theme("Nope"),
            Err(SessionError::UnknownTheme(_))
        ));
        assert!(Arc::ptr_eq(&before, session.presentation().unwrap()));
    }

    #[test]
    fn test_edits_need_a_presentation() {
        let mut session = Session::default();
        assert!(matches!(session.save_notes("x"), Err(SessionError::NoPresentation)));
        assert!(matches!(
            session.change_theme("Corporate Blue"),
            Err(SessionError::NoPresentation)
        ));
    }

    #[test]
    fn test_render_at_out_of_range() {
        let session = loaded("Owls");
        assert!(session.render_current().is_ok());
        assert!(matches!(
            session.render_at(9),
            Err(SessionError::SlideOutOfRange { index: 9, count: 9 })
        ));
    }

    #[tokio::test]
    async fn test_generate_installs_outcome() {
        let pipeline = PresentationPipeline::new(FnGenerator::new("down", |_topic: String| async {
            Err(GenerationError::Request("offline".to_string()))
        }));
        let mut session = Session::default();
        session.go_to(5);
        assert!(session.generate(&pipeline, "Owls").await.unwrap());
        assert!(!session.is_busy());
        assert_eq!(session.current_slide(), 0);
        assert!(session.advisory().is_some());
        assert_eq!(session.presentation().unwrap().slide_count(), 9);
    }

    #[tokio::test]
    async fn test_generate_while_busy_is_noop() {
        let pipeline = PresentationPipeline::new(FnGenerator::new("never", |_topic: String| async {
            Ok("{}".to_string())
        }));
        let mut session = Session::default();
        session.begin_generation();
        assert!(!session.generate(&pipeline, "Owls").await.unwrap());
        assert!(session.presentation().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_presenter_timer_ticks_each_second() {
        let mut session = loaded("Owls");
        assert!(session.toggle_presentation_mode());
        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(session.elapsed_secs(), 3);
        assert_eq!(session.elapsed_display(), "00:03");

        assert!(!session.toggle_presentation_mode());
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(session.elapsed_secs(), 3);

        // Restarting resets to zero.
        session.toggle_presentation_mode();
        assert_eq!(session.elapsed_secs(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_navigation_independent_of_timer() {
        let mut session = loaded("Owls");
        session.toggle_presentation_mode();
        session.next_slide();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        session.next_slide();
        assert_eq!(session.current_slide(), 2);
        assert_eq!(session.elapsed_secs(), 1);
    }
}
