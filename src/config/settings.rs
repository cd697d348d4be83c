use serde::{Deserialize, Serialize};

/// Files created concurrently per batch before joining.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Directories created between cooperative yields.
pub const DEFAULT_YIELD_EVERY: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub batch_size: usize,
    pub max_concurrent_io: usize,
    pub follow_symlinks: bool,
    pub yield_every: usize,
    pub log_skipped_files: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let max_concurrent_io = match detect_storage_type() {
            StorageType::SSD => 128,
            StorageType::HDD => 32,
            StorageType::Unknown => 64,
        };

        // Every unit in a batch holds one fd while it creates its file
        let max_concurrent_io = cap_by_fd_limit(max_concurrent_io);
        let batch_size = cap_by_fd_limit(DEFAULT_BATCH_SIZE);

        Self {
            batch_size,
            max_concurrent_io,
            follow_symlinks: false,
            yield_every: DEFAULT_YIELD_EVERY,
            log_skipped_files: false,
        }
    }
}

impl Settings {
    /// Apply CLI overrides. Zero values are ignored.
    pub fn with_overrides(
        mut self,
        batch_size: Option<usize>,
        concurrency: Option<usize>,
        follow_symlinks: bool,
        log_skipped_files: bool,
    ) -> Self {
        if let Some(n) = batch_size.filter(|&n| n > 0) {
            self.batch_size = cap_by_fd_limit(n);
        }
        if let Some(n) = concurrency.filter(|&n| n > 0) {
            self.max_concurrent_io = n;
        }
        self.follow_symlinks = follow_symlinks;
        self.log_skipped_files = log_skipped_files;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    SSD,
    HDD,
    Unknown,
}

pub fn detect_storage_type() -> StorageType {
    #[cfg(target_os = "macos")]
    {
        detect_storage_type_macos()
    }
    #[cfg(target_os = "linux")]
    {
        detect_storage_type_linux()
    }
    #[cfg(not(any(target_os = "macos", target_os = "linux")))]
    {
        StorageType::Unknown
    }
}

#[cfg(target_os = "macos")]
fn detect_storage_type_macos() -> StorageType {
    use std::process::Command;

    let output = Command::new("system_profiler")
        .arg("SPStorageDataType")
        .output();

    match output {
        Ok(out) => {
            let text = String::from_utf8_lossy(&out.stdout).to_lowercase();
            if text.contains("solid state") || text.contains("ssd") || text.contains("nvme") {
                StorageType::SSD
            } else if text.contains("rotational") || text.contains("hdd") {
                StorageType::HDD
            } else {
                StorageType::Unknown
            }
        }
        Err(_) => StorageType::Unknown,
    }
}

#[cfg(target_os = "linux")]
fn detect_storage_type_linux() -> StorageType {
    use std::fs;

    let Ok(entries) = fs::read_dir("/sys/block") else {
        return StorageType::Unknown;
    };

    for entry in entries.flatten() {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        if !name_str.starts_with("sd") && !name_str.starts_with("nvme") {
            continue;
        }

        let rotational_path = format!("/sys/block/{}/queue/rotational", name_str);
        if let Ok(val) = fs::read_to_string(&rotational_path) {
            return match val.trim() {
                "0" => StorageType::SSD,
                "1" => StorageType::HDD,
                _ => StorageType::Unknown,
            };
        }
    }

    StorageType::Unknown
}

/// Cap a concurrency figure by the file descriptor soft limit.
/// A quarter of the fds stay reserved for stdio, channels and the runtime.
pub fn cap_by_fd_limit(requested: usize) -> usize {
    #[cfg(unix)]
    {
        let mut rlim = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let ret = unsafe { libc::getrlimit(libc::RLIMIT_NOFILE, &mut rlim) };
        if ret == 0 && rlim.rlim_cur != libc::RLIM_INFINITY {
            let usable = rlim.rlim_cur as usize * 3 / 4;
            return requested.min(usable.max(16));
        }
    }
    requested
}
