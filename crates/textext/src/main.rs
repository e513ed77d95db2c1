//! textext CLI - Main entry point
//!
//! Reads an SVG document, typesets LaTeX into it (or re-typesets a selected
//! object made earlier), and writes the result. The argument names follow
//! the Inkscape effect protocol, so the binary can be used as an extension.

use std::io::{Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use textext_core::{Backend, NoPrompt, Session, SessionOptions, SessionOutcome, ToolPaths};
use textext_system_runtime::{NativeRuntime, SystemRuntime};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod prompt;

use prompt::TerminalPrompt;

#[derive(Parser, Debug)]
#[command(name = "textext")]
#[command(version = textext_util::cli_version())]
#[command(about = "Typeset LaTeX into an SVG document, re-editably", long_about = None)]
struct Cli {
    /// SVG document to edit (reads stdin when omitted)
    file: Option<PathBuf>,

    /// Id of a selected object; a selected textext object is re-edited
    #[arg(long = "id", value_name = "ID")]
    ids: Vec<String>,

    /// LaTeX to typeset (asks interactively when omitted)
    #[arg(short = 't', long)]
    text: Option<String>,

    /// File whose contents go into the LaTeX preamble
    #[arg(short = 'p', long, default_value = "header.inc")]
    preamble_file: String,

    /// Scale of the typeset result
    #[arg(short = 's', long, default_value_t = 1.0, value_parser = parse_scale_factor)]
    scale_factor: f64,

    /// Write the document to FILE instead of stdout
    #[arg(short = 'o', long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Converter to try, in order (pdf2svg, pstoedit-plot-svg, skconvert)
    #[arg(long = "backend", value_name = "NAME")]
    backends: Vec<Backend>,
}

fn parse_scale_factor(value: &str) -> Result<f64, String> {
    let factor: f64 = value
        .parse()
        .map_err(|_| format!("'{}' is not a number", value))?;
    if !factor.is_finite() || factor <= 0.0 {
        return Err(format!("scale factor must be positive, got {}", value));
    }
    Ok(factor)
}

impl Cli {
    fn session_options(&self) -> SessionOptions {
        SessionOptions {
            ids: self.ids.clone(),
            text: self.text.clone(),
            preamble_file: self.preamble_file.clone(),
            scale_factor: self.scale_factor,
        }
    }

    fn backends(&self) -> Vec<Backend> {
        if self.backends.is_empty() {
            Backend::DEFAULT_ORDER.to_vec()
        } else {
            self.backends.clone()
        }
    }
}

fn read_document(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut source = String::new();
            std::io::stdin()
                .read_to_string(&mut source)
                .context("Failed to read SVG document from stdin")?;
            Ok(source)
        }
    }
}

fn write_document(output: Option<&PathBuf>, contents: &str) -> Result<()> {
    match output {
        Some(path) => std::fs::write(path, contents)
            .with_context(|| format!("Failed to write {}", path.display())),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(contents.as_bytes())
                .and_then(|()| stdout.flush())
                .context("Failed to write SVG document to stdout")
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    tracing::debug!("{}", textext_util::banner());

    let source = read_document(cli.file.as_ref())?;
    let mut doc = textext_xml::parse(&source).context("Failed to parse SVG document")?;

    let runtime: Arc<dyn SystemRuntime> = Arc::new(NativeRuntime::new());
    let tools = ToolPaths::discover(runtime.as_ref());
    let session = Session::new(runtime, cli.backends(), tools);
    let options = cli.session_options();

    let outcome = if cli.file.is_some() {
        session.run(&mut doc, &options, &mut TerminalPrompt::stdio())
    } else {
        if options.text.is_none() {
            tracing::warn!("Document read from stdin and no --text given; nothing to do");
        }
        session.run(&mut doc, &options, &mut NoPrompt)
    }
    .context("Conversion failed")?;

    match &outcome {
        SessionOutcome::EmptyText => tracing::info!("Empty LaTeX, document left unchanged"),
        SessionOutcome::NoFragment => tracing::warn!("Converter output was empty"),
        _ => {}
    }

    write_document(cli.output.as_ref(), &doc.to_xml_string())
}

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries the document
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "textext=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    run(&cli)
}
