//! Data model shared by the pipeline stages, plus the conversion output.
//!
//! Values flow one way: [`Page`]s come out of extraction, are moved into
//! [`Group`]s, and each group is reduced to one or more [`SlideContent`]s
//! collected into the [`Deck`]. Only the selected image of a group is cloned
//! forward; everything else dies with its group.

use serde::Serialize;

/// One page of the source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// 1-indexed physical page number.
    pub number: u32,
    /// Text in reading order.
    pub text: String,
    /// Embedded raster images in the document's internal order.
    pub images: Vec<PageImage>,
}

/// An embedded raster image.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageImage {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    /// Lowercase format extension, e.g. `"png"` or `"jpeg"`.
    pub format: String,
}

impl PageImage {
    pub fn new(bytes: Vec<u8>, format: impl Into<String>) -> Self {
        Self {
            bytes,
            format: format.into().to_ascii_lowercase(),
        }
    }

    /// MIME type used for transport and for the PPTX content-type table.
    pub fn mime_type(&self) -> String {
        match self.format.as_str() {
            "jpg" | "jpeg" => "image/jpeg".to_string(),
            other => format!("image/{other}"),
        }
    }

    /// File extension used inside the PPTX archive.
    pub fn extension(&self) -> &str {
        match self.format.as_str() {
            "jpg" => "jpeg",
            other => other,
        }
    }
}

/// A contiguous run of pages enriched as one unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    /// 0-based position of the group in the document.
    pub index: usize,
    /// Non-empty, in page order.
    pub pages: Vec<Page>,
    /// Page texts joined with `'\n'`.
    pub combined_text: String,
}

impl Group {
    /// All images of the group: page order, then intra-page order.
    pub fn images(&self) -> impl Iterator<Item = &PageImage> {
        self.pages.iter().flat_map(|p| p.images.iter())
    }

    pub fn image_count(&self) -> usize {
        self.pages.iter().map(|p| p.images.len()).sum()
    }
}

/// An image paired with its relevance score for the group text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredImage<'a> {
    pub image: &'a PageImage,
    pub score: f32,
}

/// What the enrichment stage produced for one group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupSummary {
    pub title: String,
    pub bullets: Vec<String>,
    /// One score per image, aligned with [`Group::images`].
    pub scores: Vec<f32>,
    /// Service calls that degraded to a default value.
    pub failed_calls: usize,
}

/// Content of a single slide.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SlideContent {
    /// Index of the group this slide was derived from.
    pub group_index: usize,
    pub title: String,
    /// At most [`crate::pipeline::paginate::MAX_BULLETS_PER_SLIDE`] entries.
    pub bullets: Vec<String>,
    /// Only ever set on the first slide of a group.
    pub image: Option<PageImage>,
    /// `true` for the overflow slides of a group.
    pub continuation: bool,
}

/// The complete ordered output: group order, then sub-slide order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Deck {
    pub slides: Vec<SlideContent>,
}

impl Deck {
    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn slides_with_images(&self) -> usize {
        self.slides.iter().filter(|s| s.image.is_some()).count()
    }
}

/// Counters gathered while building the deck.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeckStats {
    pub total_groups: usize,
    pub total_slides: usize,
    pub slides_with_images: usize,
    pub failed_calls: usize,
}

/// Summary statistics for a whole conversion.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversionStats {
    pub total_pages: usize,
    pub total_groups: usize,
    pub total_slides: usize,
    pub slides_with_images: usize,
    /// Service calls that failed and were replaced by defaults.
    pub failed_calls: usize,
    /// Language the prompts were parametrised with, if any.
    pub language: Option<String>,
    /// Language detected from the document sample.
    pub detected_language: String,
    pub extract_duration_ms: u64,
    pub enrich_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of [`crate::convert::convert`].
#[derive(Debug, Clone, Serialize)]
pub struct ConversionOutput {
    pub deck: Deck,
    pub stats: ConversionStats,
}
