//! Test-only helpers for stubbing the external tools.

use std::fs;
use std::path::{Path, PathBuf};

/// Write an executable shell script named `name` under `dir` and return its
/// path. Tests point `make_bin`/`kubectl_bin` at these stubs to observe what
/// the plugin hands the real tools.
pub fn write_stub_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    let script = format!("#!/bin/sh\n{}", body);
    fs::write(&path, script).expect("write stub script");

    let mut permissions = fs::metadata(&path).expect("stub metadata").permissions();
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        permissions.set_mode(0o755);
    }
    fs::set_permissions(&path, permissions).expect("make stub executable");

    path
}
