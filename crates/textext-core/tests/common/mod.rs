//! Scripted external toolchain for session tests.
//!
//! `FakeRuntime` does real file and temp-directory work through
//! `NativeRuntime` but answers process launches itself, imitating
//! pdflatex, pdf2svg, pstoedit and skconvert closely enough for the
//! pipeline: probes get the exit codes the real tools give, conversions
//! write their output files into the scratch directory.

#![allow(dead_code)]

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use textext_core::{Backend, Session, ToolPaths};
use textext_system_runtime::{
    CommandOutput, ExecOptions, NativeRuntime, PathKind, RuntimeError, RuntimeResult,
    SystemRuntime, TempDir,
};

/// SVG as written by pdf2svg for a one-glyph formula.
pub const PDF2SVG_OUTPUT: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="12pt" height="9pt" viewBox="0 0 12 9" version="1.1">
<defs>
<g>
<symbol overflow="visible" id="glyph0-0">
<path style="stroke:none;" d=""/>
</symbol>
<symbol overflow="visible" id="glyph0-1">
<path style="stroke:none;" d="M 4.5 -4 L 1 -4 Z "/>
</symbol>
</g>
<clipPath id="clip1">
  <path d="M 0 0 L 12 0 L 12 9 L 0 9 Z "/>
</clipPath>
</defs>
<g id="surface1" clip-path="url(#clip1)">
<g style="fill:rgb(0%,0%,0%);fill-opacity:1;">
  <use xlink:href="#glyph0-1" x="1" y="7"/>
</g>
</g>
</svg>
"##;

/// Namespace-less SVG as written by pstoedit's plot-svg driver.
pub const PLOT_SVG_OUTPUT: &str = r#"<?xml version="1.0" standalone="no"?>
<svg width="600" height="800">
<g transform="translate(0,0)">
<path d="M 10 10 L 20 20" style="fill:none;stroke:black"/>
</g>
</svg>
"#;

/// SVG as written by skconvert.
pub const SKCONVERT_OUTPUT: &str = r#"<?xml version="1.0" encoding="ISO-8859-1"?>
<svg xmlns="http://www.w3.org/2000/svg">
<g style="fill:#000000">
<path d="M 1 1 L 2 2 z"/>
</g>
</svg>
"#;

/// Which tools exist and how they behave.
#[derive(Debug, Clone)]
pub struct ToolScript {
    pub pdflatex: bool,
    pub pdf2svg: bool,
    pub pstoedit: bool,
    /// pstoedit lists the plot-svg driver in `-help`.
    pub plot_svg_driver: bool,
    pub skconvert: bool,
    /// Program that exits with status 1 when asked to convert.
    pub failing: Option<&'static str>,
    /// Program that exits cleanly without writing its output.
    pub silent: Option<&'static str>,
    pub pdf2svg_output: String,
    pub plot_svg_output: String,
    pub skconvert_output: String,
}

impl Default for ToolScript {
    fn default() -> Self {
        Self {
            pdflatex: true,
            pdf2svg: true,
            pstoedit: true,
            plot_svg_driver: true,
            skconvert: true,
            failing: None,
            silent: None,
            pdf2svg_output: PDF2SVG_OUTPUT.to_string(),
            plot_svg_output: PLOT_SVG_OUTPUT.to_string(),
            skconvert_output: SKCONVERT_OUTPUT.to_string(),
        }
    }
}

/// One recorded process launch.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl Call {
    pub fn is_probe(&self) -> bool {
        self.args.is_empty() || self.args == ["-help"]
    }
}

pub struct FakeRuntime {
    native: NativeRuntime,
    script: ToolScript,
    calls: Mutex<Vec<Call>>,
    temp_dirs: Mutex<Vec<PathBuf>>,
    tex_sources: Mutex<Vec<String>>,
}

impl FakeRuntime {
    pub fn new(script: ToolScript) -> Arc<Self> {
        Arc::new(Self {
            native: NativeRuntime::new(),
            script,
            calls: Mutex::new(Vec::new()),
            temp_dirs: Mutex::new(Vec::new()),
            tex_sources: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Launches other than backend probes.
    pub fn conversion_calls(&self) -> Vec<Call> {
        self.calls().into_iter().filter(|c| !c.is_probe()).collect()
    }

    pub fn temp_dirs(&self) -> Vec<PathBuf> {
        self.temp_dirs.lock().unwrap().clone()
    }

    /// Contents of every `tmp.tex` pdflatex was run on.
    pub fn tex_sources(&self) -> Vec<String> {
        self.tex_sources.lock().unwrap().clone()
    }

    fn output(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
        CommandOutput {
            code,
            stdout: stdout.as_bytes().to_vec(),
            stderr: stderr.as_bytes().to_vec(),
        }
    }

    fn not_found(command: &str) -> RuntimeError {
        RuntimeError::Launch {
            command: command.to_string(),
            source: io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        }
    }

    /// Run a conversion: fail, stay silent, or write `contents` to `target`.
    fn convert(&self, program: &str, target: &Path, contents: &str) -> RuntimeResult<CommandOutput> {
        if self.script.failing == Some(program) {
            return Ok(Self::output(1, "", &format!("{}: conversion failed\n", program)));
        }
        if self.script.silent != Some(program) {
            std::fs::write(target, contents)?;
        }
        Ok(Self::output(0, "", ""))
    }

    fn pdflatex(&self, args: &[&str], options: &ExecOptions) -> RuntimeResult<CommandOutput> {
        let cwd = options.cwd.clone().unwrap_or_default();
        let tex = std::fs::read_to_string(cwd.join(args[0]))?;
        self.tex_sources.lock().unwrap().push(tex);
        if self.script.failing == Some("pdflatex") {
            return Ok(Self::output(
                1,
                "! Undefined control sequence.\nl.6 \\foo\n",
                "",
            ));
        }
        if self.script.silent != Some("pdflatex") {
            std::fs::write(cwd.join("tmp.pdf"), b"%PDF-1.5\n")?;
        }
        Ok(Self::output(0, "Output written on tmp.pdf (1 page).\n", ""))
    }
}

impl SystemRuntime for FakeRuntime {
    fn file_read(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        self.native.file_read(path)
    }

    fn file_write(&self, path: &Path, contents: &[u8]) -> RuntimeResult<()> {
        self.native.file_write(path, contents)
    }

    fn path_exists(&self, path: &Path, kind: Option<PathKind>) -> RuntimeResult<bool> {
        self.native.path_exists(path, kind)
    }

    fn temp_dir(&self, template: &str) -> RuntimeResult<TempDir> {
        let dir = self.native.temp_dir(template)?;
        self.temp_dirs.lock().unwrap().push(dir.path().to_path_buf());
        Ok(dir)
    }

    fn exec_command(
        &self,
        command: &str,
        args: &[&str],
        options: &ExecOptions,
    ) -> RuntimeResult<CommandOutput> {
        self.calls.lock().unwrap().push(Call {
            program: command.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
            cwd: options.cwd.clone(),
            env: options.env.clone(),
        });

        let s = &self.script;
        match command {
            "pdflatex" if s.pdflatex => self.pdflatex(args, options),
            "pdf2svg" if s.pdf2svg => match args {
                [] => Ok(Self::output(254, "Usage: pdf2svg <in file.pdf> <out file.svg> [<page no>]\n", "")),
                [_, svg, ..] => self.convert("pdf2svg", Path::new(svg), &s.pdf2svg_output),
                _ => Ok(Self::output(254, "", "")),
            },
            "pstoedit" if s.pstoedit => match args {
                [] => Ok(Self::output(1, "", "No input file specified\n")),
                ["-help"] => {
                    let drivers = if s.plot_svg_driver {
                        "\tsk:\tSketch format\n\tplot-svg:\tplotutils SVG\n"
                    } else {
                        "\tsk:\tSketch format\n"
                    };
                    Ok(Self::output(1, "", drivers))
                }
                ["-f", "sk", _, sk, ..] => self.convert("pstoedit", Path::new(sk), "##Sketch 1 2\n"),
                ["-f", "plot-svg", _, svg, ..] => {
                    self.convert("pstoedit", Path::new(svg), &s.plot_svg_output)
                }
                _ => Ok(Self::output(1, "", "unknown arguments\n")),
            },
            "skconvert" if s.skconvert => match args {
                [] => Ok(Self::output(1, "usage: skconvert infile outfile\n", "")),
                [_, svg, ..] => self.convert("skconvert", Path::new(svg), &s.skconvert_output),
                _ => Ok(Self::output(1, "", "")),
            },
            _ => Err(Self::not_found(command)),
        }
    }

    fn env_get(&self, name: &str) -> RuntimeResult<Option<String>> {
        self.native.env_get(name)
    }
}

/// A session over `runtime` with bare tool names.
pub fn session(runtime: &Arc<FakeRuntime>, backends: &[Backend]) -> Session {
    Session::new(runtime.clone(), backends.to_vec(), ToolPaths::default())
}

/// Host document used throughout the session tests.
pub const HOST: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<!-- Created with Inkscape (http://www.inkscape.org/) -->
<svg xmlns="http://www.w3.org/2000/svg" xmlns:sodipodi="http://sodipodi.sourceforge.net/DTD/sodipodi-0.dtd" width="210mm" height="297mm" id="svg2">
  <sodipodi:namedview id="base"/>
  <g id="layer1">
    <rect id="rect10" width="5" height="5"/>
  </g>
</svg>
"#;

pub fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}
