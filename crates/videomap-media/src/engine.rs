//! Native decoder library discovery
//!
//! The native decoder is located once per process. The result is cached and handed out as an [`EngineStatus`] capability record; callers
//! decide which [`DecoderEngine`](crate::DecoderEngine) to build from it.

use crate::{MediaError, Result};
use once_cell::sync::OnceCell;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable that points at the decoder library directory
pub const DECODER_PATH_ENV: &str = "VIDEOMAP_DECODER_PATH";

static STATUS: OnceCell<EngineStatus> = OnceCell::new();

/// Outcome of decoder discovery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineStatus {
    /// Directory containing the decoder library, when found
    pub library_dir: Option<PathBuf>,
    /// Human readable summary
    pub message: String,
}

impl EngineStatus {
    /// True when a native decoder library was found
    pub fn is_available(&self) -> bool {
        self.library_dir.is_some()
    }

    /// The library directory, or [`MediaError::EngineUnavailable`] carrying
    /// the discovery message
    pub fn require(&self) -> Result<&Path> {
        self.library_dir
            .as_deref()
            .ok_or_else(|| MediaError::EngineUnavailable(self.message.clone()))
    }
}

/// Search for the decoder library once per process.
///
/// `explicit` (typically from configuration) is only honoured by the first
/// call; later calls return the cached status.
pub fn discover(explicit: Option<&Path>) -> &'static EngineStatus {
    STATUS.get_or_init(|| {
        let status = locate(explicit, std::env::var_os(DECODER_PATH_ENV));
        match &status.library_dir {
            Some(dir) => info!("Decoder library found in {}", dir.display()),
            None => warn!("{}", status.message),
        }
        status
    })
}

/// Search `explicit`, then `env_dir`, then the platform default locations
pub fn locate(explicit: Option<&Path>, env_dir: Option<OsString>) -> EngineStatus {
    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = explicit {
        candidates.push(dir.to_path_buf());
    }
    if let Some(dir) = env_dir.filter(|d| !d.is_empty()) {
        candidates.push(PathBuf::from(dir));
    }
    candidates.extend(platform_dirs());

    match candidates.into_iter().find(|dir| has_decoder_library(dir)) {
        Some(dir) => EngineStatus {
            message: format!("Decoder library found in {}", dir.display()),
            library_dir: Some(dir),
        },
        None => EngineStatus {
            library_dir: None,
            message: format!(
                "Decoder library ({}) not found; set {} or install VLC",
                library_file_name(),
                DECODER_PATH_ENV
            ),
        },
    }
}

/// True if `dir` contains the platform's decoder library file
pub fn has_decoder_library(dir: &Path) -> bool {
    dir.is_dir() && dir.join(library_file_name()).is_file()
}

/// File name of the native decoder library on this platform
pub fn library_file_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "libvlc.dll"
    } else if cfg!(target_os = "macos") {
        "libvlc.dylib"
    } else {
        "libvlc.so"
    }
}

fn platform_dirs() -> Vec<PathBuf> {
    let mut candidates = Vec::new();
    if cfg!(target_os = "macos") {
        candidates.push(PathBuf::from("/Applications/VLC.app/Contents/MacOS/lib"));
        if let Some(home) = dirs::home_dir() {
            candidates.push(home.join("Applications/VLC.app/Contents/MacOS/lib"));
        }
    } else if cfg!(target_os = "windows") {
        for var in ["ProgramFiles", "ProgramFiles(x86)"] {
            if let Some(root) = std::env::var_os(var) {
                candidates.push(PathBuf::from(root).join("VideoLAN").join("VLC"));
            }
        }
    } else {
        candidates.push(PathBuf::from("/usr/lib/vlc"));
        candidates.push(PathBuf::from("/usr/lib/x86_64-linux-gnu/vlc"));
        candidates.push(PathBuf::from("/usr/lib"));
        candidates.push(PathBuf::from("/usr/lib/x86_64-linux-gnu"));
    }
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_dir_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(library_file_name()), b"").unwrap();

        let status = locate(Some(dir.path()), None);
        assert!(status.is_available());
        assert_eq!(status.library_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_env_dir_used() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(library_file_name()), b"").unwrap();
        let empty = tempfile::tempdir().unwrap();

        let status = locate(Some(empty.path()), Some(dir.path().as_os_str().to_owned()));
        assert_eq!(status.library_dir.as_deref(), Some(dir.path()));
    }

    #[test]
    fn test_require_reports_unavailable_engine() {
        let empty = tempfile::tempdir().unwrap();
        let status = EngineStatus {
            library_dir: None,
            message: "Decoder library not found".into(),
        };
        match status.require() {
            Err(MediaError::EngineUnavailable(message)) => {
                assert_eq!(message, "Decoder library not found")
            }
            other => panic!("expected EngineUnavailable, got {:?}", other),
        }

        let found = EngineStatus {
            library_dir: Some(empty.path().to_path_buf()),
            message: String::new(),
        };
        assert_eq!(found.require().unwrap(), empty.path());
    }

    #[test]
    fn test_directory_without_library() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!has_decoder_library(dir.path()));
        assert!(!has_decoder_library(&dir.path().join("missing")));
    }
}
