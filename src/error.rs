//! Error types for the edgequake-pdf2pptx library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`SlidesError`] — **Fatal**: the conversion cannot proceed at all
//!   (unreadable PDF, provider not configured, output not writable).
//!   Returned as `Err(SlidesError)` from the top-level `convert*` functions.
//!
//! * [`ServiceError`] — **Non-fatal**: a single generative-service call
//!   failed. It never leaves the enrichment stage; the
//!   [`crate::pipeline::enrich`] mappings turn it into an empty title, an
//!   empty bullet list or a zero score for that one field.
//!
//! Language detection has no error value at all: an unusable sample simply
//! yields the default code.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the edgequake-pdf2pptx library.
#[derive(Debug, Error)]
pub enum SlidesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// Input file was not found at the given path.
    #[error("PDF file not found: '{path}'\nCheck the path exists and is readable.")]
    FileNotFound { path: PathBuf },

    /// Process does not have read permission on the file.
    #[error("Permission denied reading '{path}'\nTry: chmod +r {path:?}")]
    PermissionDenied { path: PathBuf },

    /// The file exists and was read, but is not a PDF.
    #[error("File is not a valid PDF: '{path}'\nFirst bytes: {magic:?}")]
    NotAPdf { path: PathBuf, magic: [u8; 4] },

    // ── Extraction errors ─────────────────────────────────────────────────
    /// PDF header/trailer/xref is corrupt and cannot be parsed.
    #[error("PDF '{path}' is corrupt: {detail}\nTry repairing with: qpdf --decrypt input.pdf output.pdf")]
    CorruptPdf { path: PathBuf, detail: String },

    /// PDF requires a password but none was provided.
    #[error("PDF '{path}' is encrypted and requires a password.\nProvide it with --password <PASSWORD>.")]
    PasswordRequired { path: PathBuf },

    /// A password was provided but it is wrong.
    #[error("Wrong password for PDF '{path}'")]
    WrongPassword { path: PathBuf },

    /// The text layer of a page could not be read.
    #[error("Extraction failed for page {page}: {detail}")]
    PageExtractionFailed { page: usize, detail: String },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// The settings file exists but could not be read or parsed.
    #[error("Invalid settings file '{path}': {detail}")]
    SettingsInvalid { path: PathBuf, detail: String },

    /// Builder or settings validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Output errors ─────────────────────────────────────────────────────
    /// The deck could not be encoded as a PPTX archive.
    #[error("Failed to serialise slide deck: {0}")]
    SerializationFailed(String),

    /// Could not create or write the output PPTX file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// The pdfium shared library could not be loaded.
    #[error("PDFium library unavailable: {0}\nSet PDFIUM_LIB_PATH to the libpdfium file.")]
    PdfiumUnavailable(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal failure of a single generative-service call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    /// The provider rejected the request or the transport failed.
    #[error("service call failed: {detail}")]
    Api { detail: String },

    /// The call did not complete within the configured timeout.
    #[error("service call timed out after {secs}s")]
    Timeout { secs: u64 },
}
