//! Best-effort archiving of finished working directories.

use std::path::Path;

use tracing::warn;

/// Moves `work_dir` to `<archive_base>/<repo_name>/<sha>`, replacing any
/// previous archive of the same commit. A plain rename is tried first; when
/// that fails (cross-device moves), the tree is copied and the original
/// removed.
///
/// Failures are logged and swallowed: a run that pushed its branch is done,
/// archiving exists only for post-hoc inspection.
pub(crate) fn archive_work_dir(work_dir: &Path, archive_base: &Path, repo_name: &str, sha: &str) {
    let dest = archive_base.join(repo_name).join(sha);

    let result = (|| -> std::io::Result<()> {
        if dest.exists() {
            std::fs::remove_dir_all(&dest)?;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        if std::fs::rename(work_dir, &dest).is_err() {
            copy_dir(work_dir, &dest)?;
            std::fs::remove_dir_all(work_dir)?;
        }
        Ok(())
    })();

    if let Err(e) = result {
        warn!(
            work_dir = %work_dir.display(),
            dest = %dest.display(),
            error = %e,
            "failed to archive working directory"
        );
    }
}

fn copy_dir(from: &Path, to: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(to)?;
    for entry in std::fs::read_dir(from)? {
        let entry = entry?;
        let dest = to.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
