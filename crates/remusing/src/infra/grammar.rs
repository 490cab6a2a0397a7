//! C++ grammar loading: the bundled `tree-sitter-cpp` build or a grammar compiled from source.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use libloading::{Library, Symbol};
use thiserror::Error;
use tree_sitter::{Language, Parser};
use tree_sitter_language::LanguageFn;

const LIBRARY_STEM: &str = "ts_cpp_language";
const LANGUAGE_SYMBOL: &[u8] = b"tree_sitter_cpp\0";

/// Errors raised while building or loading a grammar.
#[derive(Debug, Error)]
pub enum GrammarError {
    #[error("no parser.c found in {0}")]
    NoParserSource(PathBuf),
    #[error("grammar compilation failed: {0}")]
    Compilation(String),
    #[error("failed to load grammar library {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("grammar at {path} is incompatible with this tree-sitter runtime: {source}")]
    Incompatible {
        path: PathBuf,
        #[source]
        source: tree_sitter::LanguageError,
    },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, GrammarError>;

/// Where the grammar comes from and where a compiled copy is cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrammarOptions {
    /// Grammar checkout (or its `src/` directory). `None` selects the bundled grammar.
    pub source: Option<PathBuf>,
    /// Path of the compiled shared library.
    pub library: PathBuf,
}

impl Default for GrammarOptions {
    fn default() -> Self {
        Self {
            source: None,
            library: default_library_path(),
        }
    }
}

/// Where a loaded grammar came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrammarOrigin {
    Bundled,
    Compiled(PathBuf),
}

/// Outcome of [`build_grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    AlreadyBuilt,
    Built,
}

/// A loaded C++ grammar.
pub struct Grammar {
    // Declared before `_library` so the language is dropped before the code backing it.
    language: Language,
    origin: GrammarOrigin,
    _library: Option<Library>,
}

impl std::fmt::Debug for Grammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grammar")
            .field("origin", &self.origin)
            .field("abi_version", &self.language.version())
            .finish()
    }
}

impl Grammar {
    /// The grammar compiled into this binary.
    pub fn bundled() -> Self {
        Self {
            language: tree_sitter_cpp::LANGUAGE.into(),
            origin: GrammarOrigin::Bundled,
            _library: None,
        }
    }

    /// Resolve `options` to a grammar, compiling the source checkout if its library is stale.
    pub fn load(options: &GrammarOptions) -> Result<Self> {
        match &options.source {
            None => Ok(Self::bundled()),
            Some(source) => {
                build_grammar(source, &options.library, false)?;
                Self::from_library(&options.library)
            }
        }
    }

    /// Load a compiled grammar library exporting `tree_sitter_cpp`.
    pub fn from_library(path: &Path) -> Result<Self> {
        let load_error = |source| GrammarError::Load {
            path: path.to_path_buf(),
            source,
        };

        // SAFETY: the library is a tree-sitter grammar; loading runs no initialisers beyond
        // what a C grammar object defines.
        let library = unsafe { Library::new(path) }.map_err(load_error)?;
        // SAFETY: `tree_sitter_cpp` has the signature every generated tree-sitter parser exports.
        let language: Language = unsafe {
            let constructor: Symbol<unsafe extern "C" fn() -> *const ()> =
                library.get(LANGUAGE_SYMBOL).map_err(load_error)?;
            LanguageFn::from_raw(*constructor).into()
        };

        Parser::new()
            .set_language(&language)
            .map_err(|source| GrammarError::Incompatible {
                path: path.to_path_buf(),
                source,
            })?;

        tracing::debug!(path = %path.display(), abi = language.version(), "loaded grammar library");
        Ok(Self {
            language,
            origin: GrammarOrigin::Compiled(path.to_path_buf()),
            _library: Some(library),
        })
    }

    pub fn language(&self) -> &Language {
        &self.language
    }

    pub fn origin(&self) -> &GrammarOrigin {
        &self.origin
    }
}

/// Platform file extension for shared libraries.
pub fn library_extension() -> &'static str {
    if cfg!(target_os = "windows") {
        "dll"
    } else if cfg!(target_os = "macos") {
        "dylib"
    } else {
        "so"
    }
}

/// `<tmp>/ts_cpp_language.<ext>`.
pub fn default_library_path() -> PathBuf {
    std::env::temp_dir().join(format!("{LIBRARY_STEM}.{}", library_extension()))
}

/// Directory holding `parser.c`: either `source/src` or `source` itself.
pub fn grammar_src_dir(source: &Path) -> PathBuf {
    let nested = source.join("src");
    if nested.join("parser.c").exists() {
        nested
    } else {
        source.to_path_buf()
    }
}

/// Compile the grammar at `source` into a shared library at `library`.
///
/// Skips the build when the library is newer than every grammar source unless `force` is set.
///
/// # Errors
///
/// * [`GrammarError::NoParserSource`] if `parser.c` cannot be found.
/// * [`GrammarError::Compilation`] if no compiler is available or compiling/linking fails.
pub fn build_grammar(source: &Path, library: &Path, force: bool) -> Result<BuildStatus> {
    let src_dir = grammar_src_dir(source);
    if !src_dir.join("parser.c").exists() {
        return Err(GrammarError::NoParserSource(src_dir));
    }

    if !force && !needs_recompile(&src_dir, library) {
        tracing::debug!(library = %library.display(), "grammar library is up to date");
        return Ok(BuildStatus::AlreadyBuilt);
    }

    if let Some(parent) = library.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    tracing::info!(source = %src_dir.display(), library = %library.display(), "compiling grammar");
    let needs_cxx = src_dir.join("scanner.cc").exists();
    link_shared_library(&src_dir, library, needs_cxx)?;

    if !library.exists() {
        return Err(GrammarError::Compilation(format!(
            "compiler succeeded but {} was not produced",
            library.display()
        )));
    }
    Ok(BuildStatus::Built)
}

/// True when the library is missing or any grammar source is newer than it.
fn needs_recompile(src_dir: &Path, library: &Path) -> bool {
    let Ok(lib_mtime) = fs::metadata(library).and_then(|m| m.modified()) else {
        return true;
    };

    ["parser.c", "scanner.c", "scanner.cc"].iter().any(|file| {
        fs::metadata(src_dir.join(file))
            .and_then(|m| m.modified())
            .is_ok_and(|src_mtime| src_mtime > lib_mtime)
    })
}

fn host_target() -> String {
    std::env::var("TARGET").unwrap_or_else(|_| {
        let arch = std::env::consts::ARCH;
        if cfg!(target_os = "windows") {
            format!("{arch}-pc-windows-msvc")
        } else if cfg!(target_os = "macos") {
            format!("{arch}-apple-darwin")
        } else {
            format!("{arch}-unknown-linux-gnu")
        }
    })
}

/// Compile and link the grammar sources in one compiler invocation.
fn link_shared_library(src_dir: &Path, library: &Path, needs_cxx: bool) -> Result<()> {
    let target = host_target();
    let compiler = cc::Build::new()
        .cpp(needs_cxx)
        .cargo_metadata(false)
        .warnings(false)
        .opt_level(2)
        .host(&target)
        .target(&target)
        .try_get_compiler()
        .map_err(|err| GrammarError::Compilation(err.to_string()))?;

    let scanner_cc = src_dir.join("scanner.cc");
    let scanner_c = src_dir.join("scanner.c");
    let mut cmd = compiler.to_command();

    if compiler.is_like_msvc() {
        cmd.args(["/nologo", "/LD", "/utf-8"])
            .arg(format!("/I{}", src_dir.display()))
            .arg(format!("/Fe:{}", library.display()));
    } else {
        cmd.args(["-shared", "-fPIC", "-fno-exceptions"])
            .arg("-I")
            .arg(src_dir)
            .arg("-o")
            .arg(library);
    }
    cmd.arg(src_dir.join("parser.c"));

    if needs_cxx {
        cmd.arg(&scanner_cc);
        if !compiler.is_like_msvc() {
            cmd.arg("-lstdc++");
        }
    } else if scanner_c.exists() {
        cmd.arg(&scanner_c);
    }

    run_compiler(cmd)
}

fn run_compiler(mut cmd: Command) -> Result<()> {
    tracing::debug!(command = ?cmd, "running compiler");
    let output = cmd
        .output()
        .map_err(|err| GrammarError::Compilation(err.to_string()))?;

    if output.status.success() {
        Ok(())
    } else {
        Err(GrammarError::Compilation(
            String::from_utf8_lossy(&output.stderr).into(),
        ))
    }
}
