use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn data(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(name)
}

/// Scratch home and working directory, so no user or workspace configuration is loaded.
struct Sandbox {
    dir: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("remusing").expect("binary exists");
        cmd.current_dir(self.path())
            .env("HOME", self.path())
            .env("XDG_CONFIG_HOME", self.path().join(".config"))
            .env_remove("REMUSING_TS_SOURCE")
            .env_remove("REMUSING_TS_OUT");
        cmd
    }
}

#[test]
fn help_displays_usage() {
    Sandbox::new()
        .command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--in-place"));
}

#[test]
fn rewrites_file_to_stdout() {
    let expected = fs::read_to_string(data("test.expected.cpp")).expect("fixture");
    Sandbox::new()
        .command()
        .arg(data("test.cpp"))
        .assert()
        .success()
        .stdout(expected);
}

#[test]
fn reads_standard_input() {
    Sandbox::new()
        .command()
        .write_stdin("using std::foo;\nfoo f;\n")
        .assert()
        .success()
        .stdout("std::foo f;\n");
}

#[test]
fn writes_named_output_file() {
    let sandbox = Sandbox::new();
    let out = sandbox.path().join("out.cpp");

    sandbox
        .command()
        .arg(data("streams.cpp"))
        .arg(&out)
        .assert()
        .success()
        .stdout("");

    let expected = fs::read_to_string(data("streams.expected.cpp")).expect("fixture");
    assert_eq!(fs::read_to_string(out).expect("output written"), expected);
}

#[test]
fn in_place_overwrites_input() {
    let sandbox = Sandbox::new();
    let file = sandbox.path().join("main.cpp");
    fs::write(&file, "using namespace std;\nvector<int> v;\n").expect("write input");

    sandbox
        .command()
        .arg("-i")
        .arg(&file)
        .assert()
        .success()
        .stdout("");

    assert_eq!(
        fs::read_to_string(&file).expect("read back"),
        "std::vector<int> v;\n"
    );
}

#[test]
fn in_place_with_output_file_exits_with_one() {
    Sandbox::new()
        .command()
        .args(["-i", "a.cpp", "b.cpp"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--in-place"));
}

#[test]
fn missing_input_file_exits_with_one() {
    Sandbox::new()
        .command()
        .arg("does/not/exist.cpp")
        .assert()
        .code(1)
        .stdout("")
        .stderr(predicate::str::contains("failed to read input file"));
}

#[test]
fn plan_prints_json_edits() {
    Sandbox::new()
        .command()
        .arg("--plan")
        .write_stdin("using namespace std;\ncustom c;\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("\"action\": \"delete\""))
        .stdout(predicate::str::contains("\"text\": \"custom\""));
}

#[test]
fn workspace_config_extends_fallback() {
    let sandbox = Sandbox::new();
    fs::create_dir_all(sandbox.path().join(".remusing")).expect("config dir");
    fs::write(
        sandbox.path().join(".remusing/config.toml"),
        "[symbols.namespaces]\ncustom = \"mine\"\n",
    )
    .expect("write config");

    sandbox
        .command()
        .write_stdin("custom c;\nstring s;\n")
        .assert()
        .success()
        .stdout("mine::custom c;\nstd::string s;\n");
}

#[test]
#[cfg(target_os = "linux")]
fn user_config_can_disable_builtin_table() {
    let sandbox = Sandbox::new();
    let config_dir = sandbox.path().join(".config/remusing");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(config_dir.join("config.toml"), "[symbols]\nbuiltin = false\n")
        .expect("write config");

    sandbox
        .command()
        .write_stdin("string s;\n")
        .assert()
        .success()
        .stdout("string s;\n");
}

#[test]
fn init_without_source_uses_bundled_grammar() {
    Sandbox::new()
        .command()
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("bundled tree-sitter-cpp"));
}

#[test]
fn init_with_empty_source_dir_fails() {
    let sandbox = Sandbox::new();
    let source = sandbox.path().join("grammar");
    fs::create_dir_all(&source).expect("source dir");

    sandbox
        .command()
        .arg("--init")
        .arg("--ts-source")
        .arg(&source)
        .arg("--ts-out")
        .arg(sandbox.path().join("cpp.so"))
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no parser.c"));
}
