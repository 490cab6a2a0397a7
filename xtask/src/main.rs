use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use walkdir::WalkDir;

const FIXTURE_DIR: &str = "crates/remusing/tests/data";
const EXPECTED_SUFFIX: &str = ".expected.cpp";

#[derive(Parser)]
#[command(author, version, about = "Project automation commands", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run cargo nextest with default configuration
    Nextest {
        #[arg(long)]
        profile: Option<String>,
        #[arg(long)]
        release: bool,
    },
    /// Rewrite every fixture and diff it against its `.expected.cpp` twin
    Fixtures {
        #[arg(long, default_value = FIXTURE_DIR)]
        dir: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Nextest { profile, release } => run_nextest(profile, release)?,
        Commands::Fixtures { dir } => run_fixtures(&dir)?,
    }
    Ok(())
}

fn run_nextest(profile: Option<String>, release: bool) -> Result<()> {
    let mut cmd = Command::new("cargo");
    cmd.arg("nextest").arg("run");
    if let Some(profile) = profile {
        cmd.arg("--profile").arg(profile);
    }
    if release {
        cmd.arg("--release");
    }
    let status = cmd.status()?;
    if !status.success() {
        anyhow::bail!("cargo nextest run failed");
    }
    Ok(())
}

fn run_fixtures(dir: &Path) -> Result<()> {
    let mut failures = Vec::new();
    let mut checked = 0;

    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let path = entry.path();
        let Some(expected) = expected_path(path) else {
            continue;
        };

        let output = Command::new("cargo")
            .args(["run", "--quiet", "-p", "remusing", "--"])
            .arg(path)
            .output()
            .with_context(|| format!("failed to run remusing on {}", path.display()))?;
        if !output.status.success() {
            anyhow::bail!(
                "remusing failed on {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            );
        }

        let wanted = fs::read(&expected)
            .with_context(|| format!("failed to read {}", expected.display()))?;
        checked += 1;
        if output.stdout != wanted {
            failures.push(path.to_path_buf());
        }
    }

    for path in &failures {
        eprintln!("mismatch: {}", path.display());
    }
    println!("{checked} fixture(s) checked, {} mismatch(es)", failures.len());
    if !failures.is_empty() {
        anyhow::bail!("fixture output differs from expectations");
    }
    Ok(())
}

/// `foo.cpp` -> `foo.expected.cpp`, skipping the expectation files themselves.
fn expected_path(path: &Path) -> Option<PathBuf> {
    let name = path.file_name()?.to_str()?;
    if name.ends_with(EXPECTED_SUFFIX) {
        return None;
    }
    let stem = name.strip_suffix(".cpp")?;
    let expected = path.with_file_name(format!("{stem}{EXPECTED_SUFFIX}"));
    expected.exists().then_some(expected)
}
