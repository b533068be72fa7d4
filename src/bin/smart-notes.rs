//! CLI binary for smart-notes.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `NotesConfig`, runs one action and prints the result.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use smart_notes::{
    render_notes, validate_batch, Action, ImageUpload, NotesClient, NotesConfig, NotesError,
    NotesPipeline, NotesProgressCallback, PageSize, RenderedNotes, Stage,
};
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Spinner that names the running stage and logs one line per finished stage.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Mutex<Option<Instant>>,
}

impl CliProgressCallback {
    fn new() -> Self {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            started: Mutex::new(None),
        }
    }

    fn elapsed(&self) -> String {
        let secs = self
            .started
            .lock()
            .ok()
            .and_then(|mut s| s.take())
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        dim(&format!("{secs:.1}s"))
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl NotesProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        if let Ok(mut s) = self.started.lock() {
            *s = Some(Instant::now());
        }
        self.bar.set_prefix(stage.to_string());
        self.bar.set_message("…");
    }

    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let unit = match stage {
            Stage::Layout => "pages",
            Stage::Ocr | Stage::Notes => "chars",
            Stage::Pdf => "bytes",
        };
        self.bar.println(format!(
            "  {} {:<18} {:<14} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{output_len:>6} {unit}")),
            self.elapsed(),
        ));
    }

    fn on_stage_error(&self, stage: Stage, error: &str) {
        // Truncate very long error messages to keep output tidy.
        let msg: String = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} {:<18} {}  {}",
            red("✗"),
            stage.to_string(),
            red(&msg),
            self.elapsed(),
        ));
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Run the notes API on port 8000
  smart-notes serve

  # Notes from a photo, generated locally, printed as HTML
  smart-notes notes board.jpg --topic "Cell Biology"

  # Same, through a running API, then preview the PDF
  smart-notes notes board.jpg --topic "Cell Biology" --api http://localhost:8000 --preview

  # Render saved HTML notes to a PDF (no API key needed)
  smart-notes preview notes.html --topic "Cell Biology" -o cell-biology.pdf

  # Dump the laid-out pages as JSON
  smart-notes preview notes.html --topic "Cell Biology" --json

  # Download the server-rendered PDF into ./out
  smart-notes download board.jpg --topic "Cell Biology" --out-dir out

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider, gemini-2.0-flash)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  SMART_NOTES_API_URL     Notes API base URL for `download` and `notes --api`
  RUST_LOG                Log filter, e.g. smart_notes=debug

A `.env` file in the working directory is loaded on startup.
"#;

/// Turn photographed notes into formatted study-note PDFs.
#[derive(Parser, Debug)]
#[command(
    name = "smart-notes",
    version,
    about = "Turn photographed notes into formatted study-note PDFs",
    long_about = "Extract text from an image with a vision LLM, turn it into structured study \
notes on a topic, and lay the notes out as a paginated PDF. Runs locally, as an HTTP API, or as \
a client of that API.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM model ID (e.g. gemini-2.0-flash, gpt-4.1-mini).
    #[arg(long, global = true, env = "EDGEQUAKE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "EDGEQUAKE_LLM_PROVIDER")]
    provider: Option<String>,

    /// Page size for rendered PDFs.
    #[arg(long, global = true, env = "SMART_NOTES_PAGE_SIZE", value_enum, default_value = "a4")]
    page_size: PageSizeArg,

    /// Per-file upload ceiling in bytes.
    #[arg(long, global = true, env = "SMART_NOTES_MAX_UPLOAD", default_value_t = smart_notes::config::DEFAULT_MAX_UPLOAD_BYTES)]
    max_upload: usize,

    /// Timeout for calls to the notes API, in seconds. Default: none.
    #[arg(long, global = true, env = "SMART_NOTES_TIMEOUT")]
    timeout: Option<u64>,

    /// Max LLM output tokens for the notes.
    #[arg(long, global = true, env = "SMART_NOTES_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// LLM temperature for note generation (0.0–2.0).
    #[arg(long, global = true, env = "SMART_NOTES_TEMPERATURE", default_value_t = 0.3)]
    temperature: f32,

    /// Path to a text file with a custom note-generation system prompt.
    #[arg(long, global = true, env = "SMART_NOTES_PROMPT")]
    notes_prompt: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "SMART_NOTES_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "SMART_NOTES_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the notes HTTP API.
    Serve {
        /// Address to listen on.
        #[arg(long, env = "SMART_NOTES_BIND", default_value = "0.0.0.0:8000")]
        bind: SocketAddr,
    },

    /// Generate HTML notes from images.
    Notes {
        /// Image files (JPEG or PNG). The first valid one is used.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Topic of the notes.
        #[arg(short, long)]
        topic: String,

        /// Use a running notes API instead of calling the LLM directly.
        #[arg(long, env = "SMART_NOTES_API_URL")]
        api: Option<String>,

        /// Write the HTML to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Open a PDF preview of the notes.
        #[arg(long)]
        preview: bool,
    },

    /// Render HTML notes to a PDF locally.
    Preview {
        /// HTML notes file.
        notes: PathBuf,

        /// Topic of the notes.
        #[arg(short, long)]
        topic: String,

        /// Save the PDF here instead of opening a preview.
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the laid-out PageDocument as JSON instead.
        #[arg(long)]
        json: bool,
    },

    /// Download the server-rendered PDF for images.
    Download {
        /// Image files (JPEG or PNG). The first valid one is submitted.
        #[arg(required = true)]
        images: Vec<PathBuf>,

        /// Topic of the notes.
        #[arg(short, long)]
        topic: String,

        /// Notes API base URL.
        #[arg(long, env = "SMART_NOTES_API_URL", default_value = smart_notes::config::DEFAULT_API_BASE_URL)]
        api: String,

        /// Directory to save `<topic>-notes.pdf` in.
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum PageSizeArg {
    A4,
    Letter,
}

impl From<PageSizeArg> for PageSize {
    fn from(v: PageSizeArg) -> Self {
        match v {
            PageSizeArg::A4 => PageSize::A4,
            PageSizeArg::Letter => PageSize::Letter,
        }
    }
}

/// Attach the short user-facing message for `action` on top of the error.
fn user_facing(action: Action) -> impl FnOnce(NotesError) -> anyhow::Error {
    move |e| {
        let msg = e.user_message(action);
        anyhow::Error::new(e).context(msg)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.global.verbose {
        "debug"
    } else if cli.global.quiet {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match cli.command {
        Command::Serve { bind } => {
            let config = build_config(&cli.global, None).await?;
            serve(bind, config).await
        }
        Command::Notes {
            ref images,
            ref topic,
            ref api,
            ref output,
            preview,
        } => {
            let config = build_config(&cli.global, api.clone()).await?;
            let uploads = read_images(images).await?;
            let html = if api.is_some() {
                let client = NotesClient::new(&config).context("Invalid client configuration")?;
                client
                    .generate_notes(&uploads, topic)
                    .await
                    .map_err(user_facing(Action::GenerateNotes))?
            } else {
                generate_locally(&cli.global, config.clone(), &uploads, topic).await?
            };

            match output {
                Some(path) => {
                    tokio::fs::write(path, &html)
                        .await
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    if !cli.global.quiet {
                        eprintln!("{} notes  →  {}", green("✔"), bold(&path.display().to_string()));
                    }
                }
                None => {
                    let stdout = io::stdout();
                    let mut handle = stdout.lock();
                    handle
                        .write_all(html.as_bytes())
                        .context("Failed to write to stdout")?;
                    if !html.ends_with('\n') {
                        handle.write_all(b"\n").ok();
                    }
                }
            }

            if preview {
                let rendered = render_today(&html, topic, &config)?;
                open_preview(&rendered)?;
            }
            Ok(())
        }
        Command::Preview {
            ref notes,
            ref topic,
            ref output,
            json,
        } => {
            let config = build_config(&cli.global, None).await?;
            let html = tokio::fs::read_to_string(notes)
                .await
                .with_context(|| format!("Failed to read {}", notes.display()))?;
            let rendered = render_today(&html, topic, &config)?;

            if json {
                let out = serde_json::to_string_pretty(&rendered.document)
                    .context("Failed to serialise page document")?;
                println!("{out}");
            } else if let Some(path) = output {
                rendered.save(path).await.map_err(user_facing(Action::Preview))?;
                if !cli.global.quiet {
                    eprintln!(
                        "{} {} pages  →  {}",
                        green("✔"),
                        rendered.page_count(),
                        bold(&path.display().to_string())
                    );
                }
            } else {
                open_preview(&rendered)?;
            }
            Ok(())
        }
        Command::Download {
            ref images,
            ref topic,
            ref api,
            ref out_dir,
        } => {
            let config = build_config(&cli.global, Some(api.clone())).await?;
            let uploads = read_images(images).await?;
            let client = NotesClient::new(&config).context("Invalid client configuration")?;

            let spinner = (!cli.global.quiet).then(CliProgressCallback::new);
            if let Some(ref s) = spinner {
                s.bar.set_prefix("Downloading");
                s.bar.set_message(client.base_url().to_string());
            }
            let result = client.download_pdf(&uploads, topic, out_dir).await;
            if let Some(ref s) = spinner {
                s.finish();
            }

            let path = result.map_err(user_facing(Action::Download))?;
            if !cli.global.quiet {
                eprintln!("{} saved  →  {}", green("✔"), bold(&path.display().to_string()));
            }
            Ok(())
        }
    }
}

#[cfg(feature = "server")]
async fn serve(bind: SocketAddr, config: NotesConfig) -> Result<()> {
    let pipeline = NotesPipeline::from_config(config).context("Failed to configure LLM provider")?;
    smart_notes::server::serve(bind, smart_notes::server::AppState::new(pipeline))
        .await
        .context("Server failed")
}

#[cfg(not(feature = "server"))]
async fn serve(_bind: SocketAddr, _config: NotesConfig) -> Result<()> {
    anyhow::bail!("this binary was built without the `server` feature")
}

/// OCR + notes in-process, with a spinner unless `--quiet`.
async fn generate_locally(
    global: &GlobalArgs,
    config: NotesConfig,
    uploads: &[ImageUpload],
    topic: &str,
) -> Result<String> {
    let max = config.max_upload_bytes;
    let batch = validate_batch(uploads.iter().cloned(), max);
    for rejected in &batch.rejected {
        eprintln!("  {} {}", red("✗"), rejected);
    }
    let Some(upload) = batch.accepted.first() else {
        anyhow::bail!("No valid image to submit (JPEG or PNG, at most {max} bytes)");
    };
    if batch.accepted.len() > 1 && !global.quiet {
        eprintln!(
            "  {}",
            dim(&format!(
                "{} images accepted; using the first ({})",
                batch.accepted.len(),
                upload.name
            ))
        );
    }

    let pipeline = NotesPipeline::from_config(config).context("Failed to configure LLM provider")?;
    let result = if global.quiet {
        pipeline
            .notes(upload, topic, &smart_notes::NoopProgressCallback)
            .await
    } else {
        let cb = CliProgressCallback::new();
        let r = pipeline.notes(upload, topic, &cb).await;
        cb.finish();
        r
    };
    result.map_err(user_facing(Action::GenerateNotes))
}

/// Lay out `html` with today's date on the configured page.
fn render_today(html: &str, topic: &str, config: &NotesConfig) -> Result<RenderedNotes> {
    let today = Local::now().date_naive();
    render_notes(html, topic, today, &config.geometry).map_err(user_facing(Action::Preview))
}

/// Open in the viewer and keep the file until the user is done.
fn open_preview(rendered: &RenderedNotes) -> Result<()> {
    let handle = rendered.preview().map_err(user_facing(Action::Preview))?;
    handle.open().map_err(user_facing(Action::Preview))?;

    eprintln!(
        "{} preview {}  {}",
        green("◆"),
        bold(&handle.path().display().to_string()),
        dim("(press Enter to close)")
    );
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    // `handle` drops here and the preview file goes with it.
    Ok(())
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageUpload>> {
    let mut uploads = Vec::with_capacity(paths.len());
    for path in paths {
        uploads.push(read_image(path).await?);
    }
    Ok(uploads)
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    ImageUpload::from_path(path)
        .await
        .with_context(|| format!("Failed to read image {}", path.display()))
}

/// Map CLI args to `NotesConfig`.
async fn build_config(global: &GlobalArgs, api: Option<String>) -> Result<NotesConfig> {
    let mut builder = NotesConfig::builder()
        .page_size(global.page_size.into())
        .max_upload_bytes(global.max_upload)
        .max_tokens(global.max_tokens)
        .temperature(global.temperature);

    if let Some(ref model) = global.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = global.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(secs) = global.timeout {
        builder = builder.request_timeout_secs(secs);
    }
    if let Some(url) = api {
        builder = builder.api_base_url(url);
    }
    if let Some(ref path) = global.notes_prompt {
        let prompt = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read notes prompt from {:?}", path))?;
        builder = builder.notes_prompt(prompt);
    }

    builder.build().context("Invalid configuration")
}
