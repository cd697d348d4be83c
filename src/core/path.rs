use std::path::{Path, PathBuf};

use crate::error::MirrorError;

/// Map a path under `source_root` to the same relative location under `destination_root`.
///
/// Only the leading prefix is replaced, component-wise, so a directory name
/// that happens to repeat the source root string deeper in the tree is left alone.
pub fn translate(
    path: &Path,
    source_root: &Path,
    destination_root: &Path,
) -> Result<PathBuf, MirrorError> {
    let relative = path
        .strip_prefix(source_root)
        .map_err(|_| MirrorError::OutsideSource(path.to_path_buf()))?;

    if relative.as_os_str().is_empty() {
        return Ok(destination_root.to_path_buf());
    }
    Ok(destination_root.join(relative))
}
