//! Grouping: partition the ordered pages into fixed-size contiguous runs.

use crate::output::{Group, Page};

/// Split `pages` into `ceil(len / pages_per_slide)` groups of
/// `pages_per_slide` consecutive pages; the last group holds the remainder.
///
/// # Panics
/// If `pages_per_slide` is zero. [`crate::config::Settings::validate`]
/// rejects that value before the pipeline runs.
pub fn group_pages(pages: Vec<Page>, pages_per_slide: usize) -> Vec<Group> {
    assert!(pages_per_slide > 0, "pages_per_slide must be positive");

    let mut groups = Vec::with_capacity(pages.len().div_ceil(pages_per_slide));
    let mut pages = pages.into_iter().peekable();

    while pages.peek().is_some() {
        let chunk: Vec<Page> = pages.by_ref().take(pages_per_slide).collect();
        let combined_text = chunk
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n");
        groups.push(Group {
            index: groups.len(),
            pages: chunk,
            combined_text,
        });
    }

    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::PageImage;

    fn pages(n: u32) -> Vec<Page> {
        (1..=n)
            .map(|number| Page {
                number,
                text: format!("text {number}"),
                images: vec![PageImage::new(vec![number as u8], "png")],
            })
            .collect()
    }

    fn sizes(groups: &[Group]) -> Vec<usize> {
        groups.iter().map(|g| g.pages.len()).collect()
    }

    #[test]
    fn seven_pages_in_threes() {
        let groups = group_pages(pages(7), 3);
        assert_eq!(sizes(&groups), vec![3, 3, 1]);
        assert_eq!(groups[2].pages[0].number, 7);
        assert_eq!(groups[1].index, 1);
    }

    #[test]
    fn one_page_per_group_by_default() {
        let groups = group_pages(pages(4), 1);
        assert_eq!(sizes(&groups), vec![1, 1, 1, 1]);
    }

    #[test]
    fn partition_is_exact_and_ordered() {
        for n in 0..12u32 {
            for k in 1..6usize {
                let groups = group_pages(pages(n), k);
                assert_eq!(groups.len(), (n as usize).div_ceil(k));
                let numbers: Vec<u32> = groups
                    .iter()
                    .flat_map(|g| g.pages.iter().map(|p| p.number))
                    .collect();
                assert_eq!(numbers, (1..=n).collect::<Vec<_>>());
                assert!(groups.iter().all(|g| !g.pages.is_empty() && g.pages.len() <= k));
            }
        }
    }

    #[test]
    fn combined_text_and_images_follow_page_order() {
        let groups = group_pages(pages(3), 2);
        assert_eq!(groups[0].combined_text, "text 1\ntext 2");
        assert_eq!(groups[1].combined_text, "text 3");
        let bytes: Vec<u8> = groups[0].images().map(|i| i.bytes[0]).collect();
        assert_eq!(bytes, vec![1, 2]);
    }

    #[test]
    fn empty_document_has_no_groups() {
        assert!(group_pages(Vec::new(), 2).is_empty());
    }

    #[test]
    #[should_panic(expected = "pages_per_slide")]
    fn zero_group_size_panics() {
        group_pages(pages(2), 0);
    }
}
