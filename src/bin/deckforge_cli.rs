//! DeckForge CLI - Bridge interface for scripts and front-ends
//!
//! Commands: themes, generate, validate, export, render, fallback
//! Outputs JSON to stdout, logs to stderr
//! Returns 2 on validation failure

use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use deckforge_core::{
    export::{DirectorySink, ExportSink, ExportedFile, MemorySink},
    fallback, presentation_fingerprint, ExportFormat, GeminiConfig, GeminiGenerator, OfflineGenerator,
    Presentation, PresentationPipeline, Session, ThemeCatalog, Validator,
};

#[derive(Parser)]
#[command(name = "deckforge-cli")]
#[command(about = "DeckForge CLI - Slide generation, validation and export")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Gemini API key; without one, generation always uses the fallback deck
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL", default_value = GeminiConfig::DEFAULT_MODEL)]
    model: String,

    /// Gemini API base URL
    #[arg(long, default_value = GeminiConfig::DEFAULT_BASE_URL)]
    base_url: String,

    /// Directory of extra theme JSON files
    #[arg(short, long)]
    themes_dir: Option<PathBuf>,

    /// Where exported files are written
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// Debug-level logging (RUST_LOG still wins when set)
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Pdf,
    Pptx,
    Docx,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Pdf => ExportFormat::Pdf,
            FormatArg::Pptx => ExportFormat::Pptx,
            FormatArg::Docx => ExportFormat::Docx,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List available themes
    Themes,

    /// Generate a presentation for a topic
    Generate {
        #[arg(long)]
        topic: String,

        /// Apply a catalog theme after generation
        #[arg(long)]
        theme: Option<String>,

        /// Export formats to write (repeatable)
        #[arg(long, value_enum)]
        export: Vec<FormatArg>,

        /// Return exported bytes as base64 instead of writing files
        #[arg(long)]
        inline: bool,
    },

    /// Validate a candidate presentation document
    Validate {
        /// JSON payload
        #[arg(short, long)]
        payload: String,
    },

    /// Export a saved presentation
    Export {
        /// Presentation JSON file
        #[arg(short, long)]
        input: PathBuf,

        #[arg(short, long, value_enum, default_value = "pdf")]
        format: FormatArg,

        #[arg(long)]
        inline: bool,
    },

    /// Print the rendered view of one slide
    Render {
        #[arg(short, long)]
        input: PathBuf,

        /// Zero-based slide index
        #[arg(short, long, default_value_t = 0)]
        slide: usize,
    },

    /// Print the fallback presentation for a topic
    Fallback {
        #[arg(long)]
        topic: String,
    },
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

fn emit(value: &Value) -> ExitCode {
    emit_with(value, ExitCode::SUCCESS)
}

/// Print `value`, then exit with `code`.
fn emit_with(value: &Value, code: ExitCode) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(text) => {
            println!("{}", text);
            code
        }
        Err(e) => {
            eprintln!(r#"{{"error": "Failed to serialize output: {}"}}"#, e);
            ExitCode::FAILURE
        }
    }
}

fn failure(message: String) -> ExitCode {
    failure_with(message, ExitCode::FAILURE)
}

fn failure_with(message: String, code: ExitCode) -> ExitCode {
    println!("{}", json!({ "success": false, "error": message }));
    code
}

fn build_pipeline(cli: &Cli) -> Result<PresentationPipeline, String> {
    match cli.api_key.as_deref().filter(|k| !k.trim().is_empty()) {
        Some(key) => {
            let config = GeminiConfig {
                model: cli.model.clone(),
                base_url: cli.base_url.clone(),
                ..GeminiConfig::new(key)
            };
            tracing::debug!(?config, "Using Gemini generator");
            GeminiGenerator::new(config)
                .map(PresentationPipeline::new)
                .map_err(|e| e.to_string())
        }
        None => {
            tracing::info!("No API key configured; generation will use the fallback deck");
            Ok(PresentationPipeline::new(OfflineGenerator))
        }
    }
}

/// Read a saved presentation through the validator.
fn load_presentation(path: &Path) -> Result<Presentation, (ExitCode, String)> {
    let text = fs::read_to_string(path)
        .map_err(|e| (ExitCode::FAILURE, format!("Failed to read {}: {}", path.display(), e)))?;
    let value: Value = serde_json::from_str(&text)
        .map_err(|e| (ExitCode::FAILURE, format!("Invalid JSON in {}: {}", path.display(), e)))?;
    Validator::new()
        .validate(&value)
        .map_err(|e| (ExitCode::from(2), e.to_string()))
}

fn describe_file(file: &ExportedFile, location: Value) -> Value {
    json!({
        "filename": file.filename,
        "media_type": file.media_type,
        "bytes": file.bytes.len(),
        "sha256": file.sha256(),
        "location": location,
    })
}

/// Export through `session` in each format, either to `out_dir` or inline.
fn run_exports(
    session: &Session,
    formats: &[ExportFormat],
    out_dir: &Path,
    inline: bool,
) -> Result<Vec<Value>, String> {
    let mut described = Vec::with_capacity(formats.len());
    for &format in formats {
        let mut memory = MemorySink::new();
        session.export(format, &mut memory).map_err(|e| e.to_string())?;
        for file in memory.files {
            if inline {
                let data = STANDARD.encode(&file.bytes);
                described.push(describe_file(&file, json!({ "data": data })));
            } else {
                let mut sink = DirectorySink::new(out_dir);
                let mut summary = describe_file(&file, Value::Null);
                sink.deliver(file).map_err(|e| e.to_string())?;
                let path = sink.written().first().map(|p| p.display().to_string());
                summary["location"] = json!({ "path": path });
                described.push(summary);
            }
        }
    }
    Ok(described)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let catalog = match &cli.themes_dir {
        Some(dir) => match ThemeCatalog::load_from_dir(dir) {
            Ok(c) => c,
            Err(e) => return failure(format!("Failed to load themes: {}", e)),
        },
        None => ThemeCatalog::new(),
    };

    match &cli.command {
        Commands::Themes => {
            let themes: Vec<_> = catalog
                .list()
                .iter()
                .map(|t| {
                    json!({
                        "name": t.name,
                        "primary_color": t.primary_color,
                        "secondary_color": t.secondary_color,
                        "accent_color": t.accent_color,
                        "font_family": t.font_family,
                    })
                })
                .collect();
            emit(&json!(themes))
        }

        Commands::Generate {
            topic,
            theme,
            export,
            inline,
        } => {
            let topic = topic.trim();
            if topic.is_empty() {
                return failure("Topic must not be blank".to_string());
            }
            let pipeline = match build_pipeline(&cli) {
                Ok(p) => p,
                Err(e) => return failure(e),
            };
            let mut session = Session::new(catalog);
            if let Err(e) = session.generate(&pipeline, topic).await {
                return failure(e.to_string());
            }
            if let Some(name) = theme {
                if let Err(e) = session.change_theme(name) {
                    return failure(e.to_string());
                }
            }

            let formats: Vec<ExportFormat> = export.iter().map(|&f| f.into()).collect();
            let exports = match run_exports(&session, &formats, &cli.out_dir, *inline) {
                Ok(e) => e,
                Err(e) => return failure(e),
            };

            let Some(presentation) = session.presentation() else {
                return failure("Generation produced no presentation".to_string());
            };
            let fingerprint = match presentation_fingerprint(presentation) {
                Ok(f) => f,
                Err(e) => return failure(e.to_string()),
            };
            emit(&json!({
                "success": true,
                "presentation": presentation.as_ref(),
                "advisory": session.advisory(),
                "fingerprint": fingerprint,
                "exports": exports,
            }))
        }

        Commands::Validate { payload } => {
            let candidate: Value = match serde_json::from_str(payload) {
                Ok(v) => v,
                Err(e) => {
                    println!("{}", json!({ "valid": false, "error": format!("Invalid payload: {}", e) }));
                    return ExitCode::FAILURE;
                }
            };

            let report = Validator::new().check(&candidate);
            let code = if report.valid {
                ExitCode::SUCCESS
            } else {
                ExitCode::from(2) // Validation failure
            };
            emit_with(&json!(report), code)
        }

        Commands::Export {
            input,
            format,
            inline,
        } => {
            let presentation = match load_presentation(input) {
                Ok(p) => p,
                Err((code, message)) => return failure_with(message, code),
            };
            let mut session = Session::new(catalog);
            session.load(presentation);
            match run_exports(&session, &[(*format).into()], &cli.out_dir, *inline) {
                Ok(exports) => emit(&json!({ "success": true, "exports": exports })),
                Err(e) => failure(e),
            }
        }

        Commands::Render { input, slide } => {
            let presentation = match load_presentation(input) {
                Ok(p) => p,
                Err((code, message)) => return failure_with(message, code),
            };
            let mut session = Session::new(catalog);
            session.load(presentation);
            match session.render_at(*slide) {
                Ok(rendered) => emit(&json!({
                    "slide": slide,
                    "rendered": rendered,
                    "text": rendered.plain_text(),
                })),
                Err(e) => failure(e.to_string()),
            }
        }

        Commands::Fallback { topic } => emit(&json!(fallback::synthesize(topic))),
    }
}
