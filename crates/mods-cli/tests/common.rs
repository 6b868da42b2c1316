//! Shared fixture for CLI integration tests.
#![cfg(test)]
#![allow(dead_code)]

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use mods_index::StoreDump;
use mods_testing::{CallBuilder, PROJECT_ID, obj_version};
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub struct TestFixture {
    _temp_dir: TempDir,
    data_dir: PathBuf,
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

impl TestFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let data_dir = temp_dir.path().join(".mods");
        fs::create_dir_all(&data_dir).expect("Failed to create data dir");

        Self {
            _temp_dir: temp_dir,
            data_dir,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// `mods` scoped to this fixture's data dir and the test project.
    pub fn command(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("mods");
        cmd.env_remove("RUST_LOG")
            .env_remove("MODS_PATH")
            .arg("--data-dir")
            .arg(&self.data_dir)
            .arg("--project")
            .arg(PROJECT_ID);
        cmd
    }

    pub fn write_config(&self, toml: &str) {
        fs::write(self.data_dir.join("config.toml"), toml).expect("Failed to write config");
    }

    pub fn write_dump(&self, dump: &StoreDump) -> PathBuf {
        let path = self._temp_dir.path().join("dump.json");
        let text = serde_json::to_string_pretty(dump).expect("Failed to serialize dump");
        fs::write(&path, text).expect("Failed to write dump");
        path
    }

    /// Import [`sample_dump`] and return the fixture.
    pub fn seeded() -> Self {
        let fixture = Self::new();
        let path = fixture.write_dump(&sample_dump());
        fixture.command().arg("import").arg(&path).assert().success();
        fixture
    }
}

/// Two versions of `predict`, one `score` op, one dataset, and four calls:
/// two root calls on predict v0, one on v1, and a child score call.
pub fn sample_dump() -> StoreDump {
    let mut dataset = obj_version("eval_set", 0, false);
    dataset.base_object_class = Some("Dataset".to_string());
    dataset.val = json!({"name": "eval_set", "rows": 3});

    StoreDump {
        calls: vec![
            CallBuilder::new("c0")
                .op("predict", "predictv0")
                .minute(0)
                .usage("gpt-4o", 10, 5)
                .build(),
            CallBuilder::new("c1")
                .op("predict", "predictv0")
                .minute(1)
                .build(),
            CallBuilder::new("c2")
                .op("predict", "predictv1")
                .minute(2)
                .build(),
            CallBuilder::new("c3")
                .op("score", "scorev0")
                .trace("trace-c2")
                .parent("c2")
                .minute(3)
                .build(),
        ],
        objects: vec![
            obj_version("predict", 0, true),
            obj_version("predict", 1, true),
            obj_version("score", 0, true),
            dataset,
        ],
    }
}
