//! Test-only scripted collaborators and config-tree builders.

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::core::outcome::{EngineError, EngineReply};
use crate::io::engine::TaskEngine;

/// Engine returning predetermined replies in order.
///
/// Panics if invoked more times than scripted; test bugs should be loud.
pub struct ScriptedEngine {
    replies: Mutex<VecDeque<Result<EngineReply, EngineError>>>,
}

impl ScriptedEngine {
    pub fn new(replies: Vec<Result<EngineReply, EngineError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
        }
    }

    /// Shorthand for a successful scripted reply.
    pub fn reply(code: i32, message: &str) -> Result<EngineReply, EngineError> {
        Ok(EngineReply {
            code,
            message: message.to_string(),
        })
    }
}

impl TaskEngine for ScriptedEngine {
    fn run(&self, _config: &Path) -> Result<EngineReply, EngineError> {
        self.replies
            .lock()
            .expect("scripted replies lock")
            .pop_front()
            .expect("scripted engine invoked more times than scripted")
    }
}

/// Write a minimal config file `name` under `dir`, creating parent
/// directories as needed.
pub fn write_config_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create config parent dir");
    }
    fs::write(&path, "account: {}\n").expect("write config file");
    path
}

/// Temp directory holding a config tree, for discovery and CLI tests.
pub struct TestConfigTree {
    temp: tempfile::TempDir,
}

impl TestConfigTree {
    pub fn new() -> Self {
        Self {
            temp: tempfile::tempdir().expect("tempdir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Add a config file by relative name, e.g. `"nested/a.yml"`.
    pub fn add(&self, name: &str) -> PathBuf {
        write_config_file(self.temp.path(), name)
    }
}

impl Default for TestConfigTree {
    fn default() -> Self {
        Self::new()
    }
}
