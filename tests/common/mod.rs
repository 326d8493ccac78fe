use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

use tempfile::TempDir;

pub fn run_lektion(args: &[&str]) -> Output {
    TestEnv::new().run(args)
}

/// Isolated HOME and XDG directories so tests never read a real config.
pub struct TestEnv {
    home: TempDir,
    config: TempDir,
}

impl TestEnv {
    pub fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("create temporary HOME dir"),
            config: tempfile::tempdir().expect("create temporary XDG config dir"),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(env!("CARGO_BIN_EXE_lektion"));
        command
            .args(args)
            .env("HOME", self.home.path())
            .env("XDG_CONFIG_HOME", self.config.path())
            .env_remove("LEKTION_HOST")
            .env_remove("LEKTION_MODEL")
            .env_remove("RUST_LOG");
        command
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("failed to execute lektion binary")
    }

    /// Run with `input` piped to stdin.
    #[allow(dead_code)]
    pub fn run_with_stdin(&self, args: &[&str], input: &str) -> Output {
        let mut child = self
            .command(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("failed to spawn lektion binary");

        child
            .stdin
            .take()
            .expect("stdin is piped")
            .write_all(input.as_bytes())
            .expect("write stdin");

        child.wait_with_output().expect("wait for lektion binary")
    }

    #[allow(dead_code)]
    pub fn home(&self) -> &Path {
        self.home.path()
    }

    #[allow(dead_code)]
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.home.path().join(name);
        std::fs::write(&path, contents).expect("write test file");
        path
    }
}

#[allow(dead_code)]
pub fn fixture(name: &str) -> String {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
        .display()
        .to_string()
}
