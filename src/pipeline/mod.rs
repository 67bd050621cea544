//! Pipeline stages for PDF-to-PPTX conversion.
//!
//! Each submodule implements exactly one transformation step, so each is
//! independently testable and the generative service can be swapped for a
//! scripted one without touching anything else.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ extract ──▶ group ──▶ enrich ──▶ select ──▶ paginate ──▶ assemble
//! (path)    (pdfium)     │       (service)  (best img)  (≤5 bullets)  (pptx)
//!               └──▶ language (one-shot sample)
//! ```
//!
//! 1. [`input`]    — validate the user-supplied path (exists, readable, `%PDF`)
//! 2. [`extract`]  — read every page's text and images in one scoped pass;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`language`] — classify a ~1000 character sample; never fails
//! 4. [`group`]    — partition pages into fixed-size contiguous groups
//! 5. [`enrich`]   — title, bullets and image scores via [`service`], each
//!    call degrading to a default on failure; images travel through
//!    [`encode`]
//! 6. [`select`]   — keep the single best image if it clears the threshold
//! 7. [`paginate`] — split bullets into slides of at most five
//! 8. [`assemble`] — concatenate slides in group order and write the PPTX

pub mod assemble;
pub mod encode;
pub mod enrich;
pub mod extract;
pub mod group;
pub mod input;
pub mod language;
pub mod paginate;
pub mod select;
pub mod service;
