//! Shared test utilities for the CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_file("base/a.txt", "a");
//!     fixture.command().arg("merge").arg("-l").arg("base").assert().success();
//! }
//! ```

use assert_fs::prelude::*;
use std::path::{Path, PathBuf};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    pub use assert_cmd::cargo::cargo_bin_cmd;
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use assert_fs::TempDir;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::layers;
    pub use super::TestFixture;
}

/// Layer documents used across tests.
#[allow(dead_code)]
pub mod layers {
    /// Properties with the required image template.
    pub const PROPERTIES: &str = r#"{
  "imageTemplate": { "location": "westeurope", "vmProfile": { "vmSize": "Standard_D2s_v3" } }
}"#;

    /// A later layer overriding the VM size and adding a placeholder.
    pub const PROPERTIES_PATCH: &str = r#"{
  imageTemplate: { vmProfile: { vmSize: "Standard_D4s_v3" } },
  placeholderProperties: { tenant: "" },
}"#;

    /// One step per bucket.
    pub const BUILD_STEPS: &str = r#"{
  pre: [ { type: "PowerShell", name: "prepare" } ],
  default: [ { type: "PowerShell", name: "install" } ],
  post: [ { type: "WindowsUpdate", name: "update" } ],
}"#;
}

/// A temporary directory to build layers in.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Add a file with the given path and content.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Add an empty directory.
    #[allow(dead_code)]
    pub fn with_dir(self, path: &str) -> Self {
        self.temp_dir
            .child(path)
            .create_dir_all()
            .expect("Failed to create directory");
        self
    }

    /// Add a `.layer-stack.yaml` stack file with the given content.
    #[allow(dead_code)]
    pub fn with_stack_file(self, content: &str) -> Self {
        self.with_file(".layer-stack.yaml", content)
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of `relative` inside the fixture.
    #[allow(dead_code)]
    pub fn join(&self, relative: &str) -> PathBuf {
        self.temp_dir.path().join(relative)
    }

    /// Create a child path in the temp directory.
    #[allow(dead_code)]
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Create a command configured to run in this fixture's directory.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("layer-stack");
        cmd.current_dir(self.path())
            .env_remove("LAYER_STACK_CONFIG")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never");
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
