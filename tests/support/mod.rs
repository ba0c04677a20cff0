#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use serde_json::Value;
use tempfile::TempDir;

/// Throwaway data directory for one test
pub struct TestDir {
    dir: TempDir,
}

impl TestDir {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// `todo` invocation bound to this data directory
    pub fn todo(&self) -> Command {
        let mut cmd = Command::cargo_bin("todo").expect("binary");
        cmd.env_remove("TODO_DIR")
            .env_remove("RUST_LOG")
            .arg("--dir")
            .arg(self.dir.path());
        cmd
    }

    /// Run `todo --json <args>` and return the parsed envelope
    pub fn todo_json(&self, args: &[&str]) -> Value {
        let output = self
            .todo()
            .arg("--json")
            .args(args)
            .output()
            .expect("run todo");
        serde_json::from_slice(&output.stdout).expect("json envelope")
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> PathBuf {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create parent");
        }
        fs::write(&path, contents).expect("write file");
        path
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.dir.path().join("todos.json")
    }

    pub fn read_tasks(&self) -> Value {
        let contents = fs::read_to_string(self.tasks_path()).expect("read todos.json");
        serde_json::from_str(&contents).expect("parse todos.json")
    }
}
