use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::config::settings::Settings;
use crate::error::ScanError;
use crate::models::scan_result::{ScanResult, ScanWarning, ScanWarningKind};

/// Enumerates every directory and file under a root.
pub struct TreeScanner {
    semaphore: Arc<Semaphore>,
    follow_symlinks: bool,
}

/// State shared by all directory tasks of one scan.
struct ScanContext {
    semaphore: Arc<Semaphore>,
    follow_symlinks: bool,
    warnings: Mutex<Vec<ScanWarning>>,
}

impl ScanContext {
    fn warn(&self, path: PathBuf, kind: ScanWarningKind, message: String) {
        tracing::warn!(path = %path.display(), ?kind, "{}", message);
        if let Ok(mut warnings) = self.warnings.lock() {
            warnings.push(ScanWarning {
                path,
                kind,
                message,
            });
        }
    }
}

/// Canonical paths of the directories between the root and the current one.
/// Only tracked when following symlinks.
type Ancestors = Arc<Vec<PathBuf>>;

/// Directories and files found below one directory, recursively.
#[derive(Default)]
struct Listing {
    directories: Vec<PathBuf>,
    files: Vec<PathBuf>,
}

impl Listing {
    fn absorb(&mut self, other: Listing) {
        self.directories.extend(other.directories);
        self.files.extend(other.files);
    }
}

impl TreeScanner {
    pub fn new(settings: &Settings) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(settings.max_concurrent_io.max(1))),
            follow_symlinks: settings.follow_symlinks,
        }
    }

    /// Scan `root`. Fails only when the root itself is missing, not a
    /// directory, or unreadable; nested read failures become warnings.
    pub async fn scan(&self, root: PathBuf) -> Result<ScanResult, ScanError> {
        let started = Instant::now();

        let metadata = tokio::fs::metadata(&root)
            .await
            .map_err(|e| ScanError::from_io(root.clone(), e))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory(root));
        }

        let ctx = Arc::new(ScanContext {
            semaphore: Arc::clone(&self.semaphore),
            follow_symlinks: self.follow_symlinks,
            warnings: Mutex::new(Vec::new()),
        });
        let mut ancestors = Vec::new();
        if ctx.follow_symlinks {
            if let Ok(canonical) = std::fs::canonicalize(&root) {
                ancestors.push(canonical);
            }
        }

        // The root is read here so that its failure is fatal rather than a warning.
        let entries = read_entries(&ctx, root.clone()).await?;
        let listing =
            expand_entries(root.clone(), entries, Arc::new(ancestors), Arc::clone(&ctx)).await;

        let mut directory_paths = listing.directories;
        sort_shallow_first(&mut directory_paths);

        let warnings = ctx
            .warnings
            .lock()
            .map(|mut w| std::mem::take(&mut *w))
            .unwrap_or_default();

        let result = ScanResult {
            root,
            directory_paths,
            file_paths: listing.files,
            warnings,
            scan_duration: started.elapsed(),
        };

        tracing::debug!(
            directories = result.directory_count(),
            files = result.file_count(),
            warnings = result.warnings.len(),
            elapsed_ms = result.scan_duration.as_millis() as u64,
            "scan finished"
        );

        Ok(result)
    }
}

/// Order directories by path length so every parent precedes its children.
/// Ties are broken lexically to keep the order deterministic.
pub fn sort_shallow_first(paths: &mut [PathBuf]) {
    paths.sort_by(|a, b| {
        a.as_os_str()
            .len()
            .cmp(&b.as_os_str().len())
            .then_with(|| a.cmp(b))
    });
}

/// Collected directory entry from batch I/O.
struct EntryData {
    path: PathBuf,
    kind: EntryKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryKind {
    Directory,
    File,
    /// Symlink pointing at a directory, only produced when following symlinks.
    LinkedDirectory,
}

/// Read all entries of a directory in one blocking call.
/// Returns (entries, entry_errors) or an error if the directory itself can't be read.
fn read_dir_batch(
    dir_path: &Path,
    follow_symlinks: bool,
) -> std::io::Result<(Vec<EntryData>, Vec<(PathBuf, std::io::Error)>)> {
    let mut entries = Vec::new();
    let mut errors = Vec::new();

    for entry_result in std::fs::read_dir(dir_path)? {
        let entry = match entry_result {
            Ok(entry) => entry,
            Err(e) => {
                errors.push((dir_path.to_path_buf(), e));
                continue;
            }
        };
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(e) => {
                errors.push((path, e));
                continue;
            }
        };

        let kind = if file_type.is_dir() {
            EntryKind::Directory
        } else if file_type.is_symlink() && follow_symlinks {
            // Broken links still get a placeholder
            match std::fs::metadata(&path) {
                Ok(target) if target.is_dir() => EntryKind::LinkedDirectory,
                _ => EntryKind::File,
            }
        } else {
            EntryKind::File
        };
        entries.push(EntryData { path, kind });
    }

    Ok((entries, errors))
}

async fn read_entries(ctx: &ScanContext, path: PathBuf) -> Result<Vec<EntryData>, ScanError> {
    // Permit is held only during I/O
    let _permit = ctx.semaphore.acquire().await.map_err(|e| ScanError::Io {
        path: path.clone(),
        source: std::io::Error::other(e),
    })?;

    let follow = ctx.follow_symlinks;
    let dir = path.clone();
    let (entries, entry_errors) = tokio::task::spawn_blocking(move || read_dir_batch(&dir, follow))
        .await
        .map_err(|e| ScanError::Io {
            path: path.clone(),
            source: std::io::Error::other(e),
        })?
        .map_err(|e| ScanError::from_io(path.clone(), e))?;

    for (err_path, e) in entry_errors {
        ctx.warn(err_path, ScanWarningKind::from_io(&e), e.to_string());
    }
    Ok(entries)
}

/// Record the entries of one directory and spawn a task per subdirectory.
///
/// A directory that resolves to one of its own ancestors is still listed, so
/// the mirror gets an empty directory under that name, but it is not descended.
async fn expand_entries(
    dir: PathBuf,
    entries: Vec<EntryData>,
    ancestors: Ancestors,
    ctx: Arc<ScanContext>,
) -> Listing {
    let mut listing = Listing::default();
    let mut handles = Vec::new();

    for entry in entries {
        match entry.kind {
            EntryKind::File => listing.files.push(entry.path),
            EntryKind::Directory | EntryKind::LinkedDirectory => {
                let chain = if ctx.follow_symlinks {
                    match std::fs::canonicalize(&entry.path) {
                        Ok(canonical) if ancestors.contains(&canonical) => {
                            ctx.warn(
                                entry.path.clone(),
                                ScanWarningKind::SymlinkCycle,
                                format!("links back to ancestor {}", canonical.display()),
                            );
                            listing.directories.push(entry.path);
                            continue;
                        }
                        Ok(canonical) => {
                            let mut next = Vec::with_capacity(ancestors.len() + 1);
                            next.extend(ancestors.iter().cloned());
                            next.push(canonical);
                            Arc::new(next)
                        }
                        Err(_) => Arc::clone(&ancestors),
                    }
                } else {
                    Arc::clone(&ancestors)
                };
                listing.directories.push(entry.path.clone());
                handles.push((
                    entry.path.clone(),
                    tokio::spawn(scan_directory(entry.path, chain, Arc::clone(&ctx))),
                ));
            }
        }
    }

    for (path, handle) in handles {
        match handle.await {
            Ok(child) => listing.absorb(child),
            Err(e) => ctx.warn(
                path,
                ScanWarningKind::IoError,
                format!("Task join error: {}", e),
            ),
        }
    }

    tracing::trace!(dir = %dir.display(), files = listing.files.len(), "directory expanded");
    listing
}

fn scan_directory(
    path: PathBuf,
    ancestors: Ancestors,
    ctx: Arc<ScanContext>,
) -> Pin<Box<dyn Future<Output = Listing> + Send>> {
    Box::pin(async move {
        match read_entries(&ctx, path.clone()).await {
            Ok(entries) => expand_entries(path, entries, ancestors, ctx).await,
            Err(e) => {
                let kind = match &e {
                    ScanError::PermissionDenied(_) => ScanWarningKind::PermissionDenied,
                    ScanError::NotFound(_) => ScanWarningKind::NotFound,
                    _ => ScanWarningKind::IoError,
                };
                ctx.warn(path, kind, e.to_string());
                Listing::default()
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parents_sort_before_children() {
        let mut paths = vec![
            PathBuf::from("/s/b/c/d"),
            PathBuf::from("/s/b"),
            PathBuf::from("/s/a"),
            PathBuf::from("/s/b/c"),
            PathBuf::from("/s/longer_name"),
        ];
        sort_shallow_first(&mut paths);
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/s/a"),
                PathBuf::from("/s/b"),
                PathBuf::from("/s/b/c"),
                PathBuf::from("/s/b/c/d"),
                PathBuf::from("/s/longer_name"),
            ]
        );
    }
}
