//! Atomic file writes shared by the adapters

use std::fs;
use std::path::Path;

/// Write content by writing a sibling temp file first, then renaming it over
/// the target. Permissions of an existing target are carried over.
pub(crate) fn write_atomic(path: &Path, content: &str) -> anyhow::Result<()> {
    write_via_sibling(path, content, false)
}

/// [`write_atomic`] for files holding secrets: the result is owner-only
/// (`0o600`) on unix whatever the previous mode was.
pub(crate) fn write_private(path: &Path, content: &str) -> anyhow::Result<()> {
    write_via_sibling(path, content, true)
}

fn write_via_sibling(path: &Path, content: &str, private: bool) -> anyhow::Result<()> {
    let tmp_path = tmp_sibling(path);
    fs::write(&tmp_path, content)?;

    if private {
        restrict_to_owner(&tmp_path);
    } else if let Ok(meta) = fs::metadata(path) {
        let _ = fs::set_permissions(&tmp_path, meta.permissions());
    }

    #[cfg(windows)]
    {
        if path.exists() {
            let _ = fs::remove_file(path);
        }
    }

    if let Err(err) = fs::rename(&tmp_path, path) {
        let _ = fs::remove_file(&tmp_path);
        return Err(err.into());
    }
    Ok(())
}

#[cfg(unix)]
fn restrict_to_owner(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::debug!(error = %e, path = %path.display(), "failed to restrict file permissions");
    }
}

#[cfg(not(unix))]
fn restrict_to_owner(_path: &Path) {}

fn tmp_sibling(path: &Path) -> std::path::PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{}.splice-tmp", name))
}
