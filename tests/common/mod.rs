//! Common test utilities for nekorar integration tests
//!
//! Fake extraction tools are small shell scripts written into a bundle
//! directory, so the real process runner is exercised without unrar or 7za
//! being installed.

#![allow(dead_code)]

use nekorar::Config;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Scratch layout for one test: bundle dir with fake tools, downloads, output
pub struct Workspace {
    pub root: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        let root = TempDir::new().expect("Failed to create temp dir");
        std::fs::create_dir(root.path().join("bundle")).expect("Failed to create bundle dir");
        std::fs::create_dir(root.path().join("downloads"))
            .expect("Failed to create downloads dir");
        Self { root }
    }

    pub fn bundle(&self) -> PathBuf {
        self.root.path().join("bundle")
    }

    pub fn downloads(&self) -> PathBuf {
        self.root.path().join("downloads")
    }

    pub fn output(&self) -> PathBuf {
        self.root.path().join("out")
    }

    /// Create an empty archive file in the downloads folder
    pub fn archive(&self, name: &str) -> PathBuf {
        let path = self.downloads().join(name);
        std::fs::write(&path, b"").expect("Failed to create archive");
        path
    }

    /// Install an executable shell script as bundled tool `name`
    pub fn fake_tool(&self, name: &str, body: &str) -> PathBuf {
        write_script(&self.bundle().join(name), body)
    }

    /// Config using only the bundle dir (tar from `tar_path`)
    ///
    /// Every bundled tool slot is filled with a failing script unless a test
    /// installs its own.
    pub fn config(&self) -> Config {
        for tool in ["unrar", "7za", "unar", "tar"] {
            let path = self.bundle().join(tool);
            if !path.exists() {
                write_script(&path, "echo 'fake tool not scripted' >&2; exit 99");
            }
        }

        let mut config = Config::default();
        config.tools.bundle_dir = Some(self.bundle());
        config.tools.tar_path = Some(self.bundle().join("tar"));
        config.tools.search_path = false;
        config.state.path = Some(self.root.path().join("state.json"));
        config
    }
}

/// Write `body` as an executable `/bin/sh` script at `path`
pub fn write_script(path: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    path.to_path_buf()
}
