//! Pagination: split one group's bullets over as many slides as needed.

use crate::output::{PageImage, SlideContent};

/// Capacity of one slide's body.
pub const MAX_BULLETS_PER_SLIDE: usize = 5;

/// Appended to the title of every slide after the first in a group.
pub const CONTINUATION_SUFFIX: &str = " (cont.)";

/// Lay out a group as slides of at most [`MAX_BULLETS_PER_SLIDE`] bullets.
///
/// The first slide gets `title` and `image`; later slides get the title with
/// [`CONTINUATION_SUFFIX`] and no image. An empty bullet list still yields
/// one slide so every group shows up in the deck.
pub fn paginate(
    group_index: usize,
    title: &str,
    bullets: Vec<String>,
    image: Option<PageImage>,
) -> Vec<SlideContent> {
    if bullets.is_empty() {
        return vec![SlideContent {
            group_index,
            title: title.to_string(),
            bullets,
            image,
            continuation: false,
        }];
    }

    let mut image = image;
    bullets
        .chunks(MAX_BULLETS_PER_SLIDE)
        .enumerate()
        .map(|(i, chunk)| {
            let first = i == 0;
            SlideContent {
                group_index,
                title: if first {
                    title.to_string()
                } else {
                    format!("{title}{CONTINUATION_SUFFIX}")
                },
                bullets: chunk.to_vec(),
                image: if first { image.take() } else { None },
                continuation: !first,
            }
        })
        .collect()
}
