//! Page extraction: text and embedded images of every page via pdfium.
//!
//! The whole document is read in one scoped pass (open → read all pages →
//! close). Grouping needs the full page set anyway, and holding the pdfium
//! handle only inside [`extract_pages_blocking`] guarantees it is released on
//! every exit path, including the error returns.
//!
//! pdfium wraps a C++ library with thread-local state, so the async entry
//! point moves the work onto the blocking thread pool.

use crate::error::SlidesError;
use crate::output::Page;
use crate::pipeline::encode::encode_png;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info, warn};

/// Extract every page of the PDF at `pdf_path`.
pub async fn extract_pages(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<Page>, SlidesError> {
    let path = pdf_path.to_path_buf();
    let password = password.map(str::to_string);

    tokio::task::spawn_blocking(move || extract_pages_blocking(&path, password.as_deref()))
        .await
        .map_err(|e| SlidesError::Internal(format!("Extraction task panicked: {}", e)))?
}

/// Bind to `PDFIUM_LIB_PATH` when set, else a library in the working
/// directory, else the system library.
pub fn bind_pdfium() -> Result<Pdfium, SlidesError> {
    let bindings = match std::env::var("PDFIUM_LIB_PATH") {
        Ok(path) if !path.is_empty() => Pdfium::bind_to_library(&path),
        _ => Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
            .or_else(|_| Pdfium::bind_to_system_library()),
    }
    .map_err(|e| SlidesError::PdfiumUnavailable(format!("{:?}", e)))?;
    Ok(Pdfium::new(bindings))
}

/// Blocking implementation of page extraction.
pub fn extract_pages_blocking(
    pdf_path: &Path,
    password: Option<&str>,
) -> Result<Vec<Page>, SlidesError> {
    let pdfium = bind_pdfium()?;

    let document = pdfium
        .load_pdf_from_file(pdf_path, password)
        .map_err(|e| open_error(pdf_path, password, e))?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    info!("PDF loaded: {} pages", total_pages);

    let mut result = Vec::with_capacity(total_pages);

    for (idx, page) in pages.iter().enumerate() {
        let number = idx + 1;

        let text = page
            .text()
            .map_err(|e| SlidesError::PageExtractionFailed {
                page: number,
                detail: format!("{:?}", e),
            })?
            .all();

        let mut images = Vec::new();
        for object in page.objects().iter() {
            let Some(image_object) = object.as_image_object() else {
                continue;
            };
            match image_object
                .get_raw_image()
                .map_err(|e| format!("{:?}", e))
                .and_then(|raw| encode_png(&raw).map_err(|e| e.to_string()))
            {
                Ok(image) => images.push(image),
                Err(detail) => warn!("Page {}: skipping unreadable image: {}", number, detail),
            }
        }

        debug!(
            "Extracted page {}: {} chars, {} images",
            number,
            text.len(),
            images.len()
        );

        result.push(Page {
            number: number as u32,
            text,
            images,
        });
    }

    Ok(result)
}

/// Map a pdfium open failure onto the most specific fatal error.
fn open_error(pdf_path: &Path, password: Option<&str>, e: PdfiumError) -> SlidesError {
    let err_str = format!("{:?}", e);
    if err_str.contains("Password") || err_str.contains("password") {
        if password.is_some() {
            SlidesError::WrongPassword {
                path: pdf_path.to_path_buf(),
            }
        } else {
            SlidesError::PasswordRequired {
                path: pdf_path.to_path_buf(),
            }
        }
    } else {
        SlidesError::CorruptPdf {
            path: pdf_path.to_path_buf(),
            detail: err_str,
        }
    }
}

/// Total number of images across `pages`.
pub fn count_images(pages: &[Page]) -> usize {
    pages.iter().map(|p| p.images.len()).sum()
}
