//! Image selection: at most one image per group.

use crate::output::{PageImage, ScoredImage};

/// Pick the highest-scoring image and admit it if it reaches `min_score`.
///
/// Comparison is strictly greater-than, so on an exact tie the image that
/// comes first in group order wins. `images` and `scores` are paired by
/// position; extra entries on either side are ignored.
pub fn select_image<'a, I>(images: I, scores: &[f32], min_score: f32) -> Option<ScoredImage<'a>>
where
    I: IntoIterator<Item = &'a PageImage>,
{
    let mut best: Option<ScoredImage<'a>> = None;

    for (image, &score) in images.into_iter().zip(scores) {
        if best.is_none_or(|b| score > b.score) {
            best = Some(ScoredImage { image, score });
        }
    }

    best.filter(|b| b.score >= min_score)
}
