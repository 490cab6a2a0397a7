//! Reading sources and writing rewritten output.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::NamedTempFile;

/// Where source bytes come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Stdin,
    File(PathBuf),
}

/// Where rewritten bytes go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    Stdout,
    File(PathBuf),
    /// Replace the input file.
    InPlace(PathBuf),
}

impl Input {
    /// Read the whole input as raw bytes.
    pub fn read(&self) -> Result<Vec<u8>> {
        match self {
            Input::Stdin => {
                let mut buf = Vec::new();
                io::stdin()
                    .lock()
                    .read_to_end(&mut buf)
                    .context("failed to read standard input")?;
                Ok(buf)
            }
            Input::File(path) => fs::read(path)
                .with_context(|| format!("failed to read input file {}", path.display())),
        }
    }
}

impl Output {
    /// Write `bytes` in full. In-place writes replace the file atomically.
    pub fn write(&self, bytes: &[u8]) -> Result<()> {
        match self {
            Output::Stdout => {
                let mut stdout = io::stdout().lock();
                stdout
                    .write_all(bytes)
                    .and_then(|()| stdout.flush())
                    .context("failed to write standard output")
            }
            Output::File(path) => fs::write(path, bytes)
                .with_context(|| format!("failed to write output file {}", path.display())),
            Output::InPlace(path) => replace_file(path, bytes),
        }
    }
}

/// Write to a sibling temporary file, then rename it over `path`.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let permissions = fs::metadata(path).map(|meta| meta.permissions()).ok();

    let mut temp = NamedTempFile::new_in(dir)
        .with_context(|| format!("failed to create temporary file in {}", dir.display()))?;
    temp.write_all(bytes)
        .context("failed to write temporary output")?;
    if let Some(permissions) = permissions {
        fs::set_permissions(temp.path(), permissions)
            .context("failed to copy permissions to temporary output")?;
    }
    temp.persist(path)
        .with_context(|| format!("failed to replace {}", path.display()))?;
    Ok(())
}
