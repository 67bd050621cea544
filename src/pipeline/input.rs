//! Input validation: make sure a user-supplied path is a readable PDF.
//!
//! pdfium reports every kind of open failure the same way, so the cheap
//! checks happen here first: existence, read permission and the `%PDF` magic
//! bytes. Callers get a precise error instead of a generic "corrupt PDF".

use crate::error::SlidesError;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate `path` and return it as an owned path.
pub fn resolve_input(path: impl AsRef<Path>) -> Result<PathBuf, SlidesError> {
    let path = path.as_ref().to_path_buf();

    if !path.exists() {
        return Err(SlidesError::FileNotFound { path });
    }

    let mut file = match std::fs::File::open(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SlidesError::PermissionDenied { path });
        }
        Err(_) => return Err(SlidesError::FileNotFound { path }),
    };

    let mut magic = [0u8; 4];
    let mut read = 0;
    while read < magic.len() {
        match file.read(&mut magic[read..]) {
            Ok(0) => break,
            Ok(n) => read += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    if &magic != b"%PDF" {
        return Err(SlidesError::NotAPdf { path, magic });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}
