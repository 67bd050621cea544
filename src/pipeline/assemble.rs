//! Deck assembly and file output.

use crate::config::Settings;
use crate::error::SlidesError;
use crate::output::{Deck, SlideContent};
use crate::pptx::PptxWriter;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// Concatenate per-group slide lists in the order given.
///
/// Callers pass groups already sorted by index; sub-slide order within a
/// group is preserved.
pub fn assemble(groups: Vec<Vec<SlideContent>>) -> Deck {
    Deck {
        slides: groups.into_iter().flatten().collect(),
    }
}

impl Deck {
    /// Serialise as PPTX and write it to `path` atomically.
    ///
    /// The bytes go to a temporary file next to `path`, which is renamed over
    /// the target only once fully written. On any failure the temporary file
    /// is removed and `path` is left untouched.
    pub fn write_to(&self, path: impl AsRef<Path>, settings: &Settings) -> Result<(), SlidesError> {
        let path = path.as_ref();
        let title = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = PptxWriter::new(settings).title(title).write(self)?;

        let write_err = |source| SlidesError::OutputWriteFailed {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(dir).map_err(write_err)?;

        let mut tmp = tempfile::Builder::new()
            .prefix(".pdf2pptx-")
            .suffix(".pptx.tmp")
            .tempfile_in(dir)
            .map_err(write_err)?;
        tmp.write_all(&bytes).map_err(write_err)?;
        tmp.as_file().sync_all().map_err(write_err)?;
        tmp.persist(path).map_err(|e| write_err(e.error))?;

        info!(
            "Wrote {} slides ({} bytes) to {}",
            self.len(),
            bytes.len(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pptx::count_slides;

    fn slide(group_index: usize, title: &str) -> SlideContent {
        SlideContent {
            group_index,
            title: title.into(),
            bullets: vec!["x".into()],
            image: None,
            continuation: false,
        }
    }

    #[test]
    fn assemble_keeps_group_then_sub_slide_order() {
        let deck = assemble(vec![
            vec![slide(0, "a"), slide(0, "a (cont.)")],
            vec![slide(1, "b")],
            vec![],
            vec![slide(3, "d")],
        ]);
        let titles: Vec<&str> = deck.slides.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, ["a", "a (cont.)", "b", "d"]);
    }

    #[test]
    fn write_to_creates_file_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("deck.pptx");
        let deck = assemble(vec![vec![slide(0, "a")], vec![slide(1, "b")]]);

        deck.write_to(&out, &Settings::default()).unwrap();

        let bytes = std::fs::read(&out).unwrap();
        assert_eq!(count_slides(&bytes).unwrap(), 2);
        let leftovers: Vec<_> = std::fs::read_dir(out.parent().unwrap())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn write_to_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("deck.pptx");
        std::fs::write(&out, b"old").unwrap();

        assemble(vec![vec![slide(0, "a")]])
            .write_to(&out, &Settings::default())
            .unwrap();
        assert_ne!(std::fs::read(&out).unwrap(), b"old");
    }

    #[test]
    fn write_to_unwritable_target_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the file should go.
        let out = dir.path().join("taken");
        std::fs::create_dir(&out).unwrap();

        let err = assemble(vec![vec![slide(0, "a")]])
            .write_to(&out, &Settings::default())
            .unwrap_err();
        assert!(matches!(err, SlidesError::OutputWriteFailed { .. }));
        let entries = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }
}
