//! Locating coefficient files used by tests.
//!
//! Small excerpts live in `crates/shm-parser/testdata/`. Full models are
//! too large to commit; point `TEST_DATA_DIR` at a directory holding them.

use std::path::{Path, PathBuf};

/// Workspace directory, two levels above this crate.
pub fn workspace_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// First existing `name` under `TEST_DATA_DIR`, the committed testdata
/// directory or the workspace-level `testdata/`.
pub fn find_test_file(name: &str) -> Option<PathBuf> {
    let root = workspace_root();
    std::env::var_os("TEST_DATA_DIR")
        .map(PathBuf::from)
        .into_iter()
        .chain([root.join("crates/shm-parser/testdata"), root.join("testdata")])
        .map(|dir| dir.join(name))
        .find(|path| path.is_file())
}
