//! Helpers shared by module tests. Compiled only for `cfg(test)`.

#[cfg(unix)]
use std::path::{Path, PathBuf};

/// Write an executable stub tool into `dir` and return its path.
///
/// Tests point `ToolsConfig` at these stubs so pipeline runs never need
/// real encoders or downloaders installed.
#[cfg(unix)]
pub(crate) fn write_fake_tool(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, script).unwrap();

    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();

    path
}
