//! Locating the external programs.

use textext_system_runtime::SystemRuntime;

/// Program names (or full paths) of the external toolchain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    pub pdflatex: String,
    pub pdf2svg: String,
    pub pstoedit: String,
    pub skconvert: String,
}

impl Default for ToolPaths {
    /// Bare program names, resolved by the OS at launch.
    fn default() -> Self {
        Self {
            pdflatex: "pdflatex".to_string(),
            pdf2svg: "pdf2svg".to_string(),
            pstoedit: "pstoedit".to_string(),
            skconvert: "skconvert".to_string(),
        }
    }
}

impl ToolPaths {
    /// Resolve each tool from its `TEXTEXT_*` override or `PATH`.
    ///
    /// Tools that cannot be found keep their bare name, so using them fails
    /// with a launch error naming the program.
    pub fn discover(runtime: &dyn SystemRuntime) -> Self {
        let resolve = |name: &str, env_var: &str| {
            let found = runtime.find_binary(name, env_var);
            tracing::debug!(tool = name, path = ?found, "Resolved tool");
            found
                .map(|path| path.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.to_string())
        };

        Self {
            pdflatex: resolve("pdflatex", "TEXTEXT_PDFLATEX"),
            pdf2svg: resolve("pdf2svg", "TEXTEXT_PDF2SVG"),
            pstoedit: resolve("pstoedit", "TEXTEXT_PSTOEDIT"),
            skconvert: resolve("skconvert", "TEXTEXT_SKCONVERT"),
        }
    }
}
