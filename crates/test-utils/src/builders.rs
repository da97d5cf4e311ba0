#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;

use sitedag::config::{CommentPolicy, ConfigFile, RawConfigFile};
use sitedag::fs::FileSystem;
use sitedag::tasks::TaskContext;
use tempfile::TempDir;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile::default(),
        }
    }

    pub fn src(mut self, dir: &str) -> Self {
        self.config.dirs.src = dir.to_string();
        self
    }

    pub fn dev(mut self, dir: &str) -> Self {
        self.config.dirs.dev = dir.to_string();
        self
    }

    pub fn dist(mut self, dir: &str) -> Self {
        self.config.dirs.dist = dir.to_string();
        self
    }

    pub fn assets(mut self, dir: &str) -> Self {
        self.config.dirs.assets = dir.to_string();
        self
    }

    pub fn project_root(mut self, dir: &str) -> Self {
        self.config.dirs.project_root = dir.to_string();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    pub fn browser(mut self, name: &str, version: &str) -> Self {
        self.config
            .css
            .browsers
            .insert(name.to_string(), version.to_string());
        self
    }

    pub fn preserve_comments(mut self, policy: CommentPolicy) -> Self {
        self.config.js.preserve_comments = policy;
        self
    }

    pub fn template_var(mut self, key: &str, value: &str) -> Self {
        self.config
            .template
            .data
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A site working root in a temporary directory.
pub struct SiteFixture {
    dir: TempDir,
}

impl SiteFixture {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("create temp dir"),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write `contents` at `rel`, creating parent directories.
    pub fn write(&self, rel: &str, contents: impl AsRef<[u8]>) -> &Self {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, contents).expect("write fixture file");
        self
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        self.path(rel).exists()
    }

    /// Every file below `rel`, relative to it, with forward slashes, sorted.
    pub fn files_under(&self, rel: &str) -> Vec<String> {
        let base = self.path(rel);
        let mut out = Vec::new();
        let mut stack = vec![base.clone()];
        while let Some(dir) = stack.pop() {
            let Ok(entries) = std::fs::read_dir(&dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if let Ok(rel) = path.strip_prefix(&base) {
                    out.push(rel.to_string_lossy().replace('\\', "/"));
                }
            }
        }
        out.sort();
        out
    }

    pub fn context(&self, config: ConfigFile) -> TaskContext {
        TaskContext::new(self.root(), config)
    }
}

impl Default for SiteFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Task context over an in-memory filesystem rooted at `""`.
pub fn mock_context(config: ConfigFile, fs: Arc<dyn FileSystem>) -> TaskContext {
    TaskContext::with_fs("", config, fs)
}
