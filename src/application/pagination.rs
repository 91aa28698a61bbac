//! Offset pagination over already-fetched records.

use std::num::NonZeroUsize;

/// Number of pages needed for `len` items; never less than one.
pub fn total_pages(len: usize, page_size: NonZeroUsize) -> usize {
    len.div_ceil(page_size.get()).max(1)
}

/// Items on the 1-based `page`. Page 0 is treated as page 1; pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, page_size: NonZeroUsize) -> &[T] {
    let page = page.max(1);
    let size = page_size.get();
    let start = (page - 1).saturating_mul(size).min(items.len());
    let end = page.saturating_mul(size).min(items.len());
    &items[start..end]
}

/// Page to display once the page count is known: out-of-range pages fall back to 1.
pub fn effective_page(requested: usize, total_pages: usize) -> usize {
    if requested == 0 || requested > total_pages {
        1
    } else {
        requested
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn size(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).expect("non-zero page size")
    }

    #[test]
    fn total_pages_is_at_least_one() {
        assert_eq!(total_pages(0, size(10)), 1);
        assert_eq!(total_pages(10, size(10)), 1);
        assert_eq!(total_pages(11, size(10)), 2);
        assert_eq!(total_pages(25, size(10)), 3);
    }

    #[test]
    fn twenty_five_items_split_ten_ten_five() {
        let items: Vec<u32> = (0..25).collect();
        assert_eq!(paginate(&items, 1, size(10)).len(), 10);
        assert_eq!(paginate(&items, 2, size(10)).len(), 10);
        assert_eq!(paginate(&items, 3, size(10)), &[20, 21, 22, 23, 24]);
        assert!(paginate(&items, 4, size(10)).is_empty());
    }

    #[test]
    fn pages_reconstruct_the_input_exactly_once() {
        for len in 1..40usize {
            for page_size in 1..12usize {
                let items: Vec<usize> = (0..len).collect();
                let pages = total_pages(len, size(page_size));
                let rebuilt: Vec<usize> = (1..=pages)
                    .flat_map(|page| paginate(&items, page, size(page_size)).iter().copied())
                    .collect();
                assert_eq!(rebuilt, items, "len={len} page_size={page_size}");
            }
        }
    }

    #[test]
    fn out_of_range_pages_reset_to_first() {
        assert_eq!(effective_page(3, 3), 3);
        assert_eq!(effective_page(4, 3), 1);
        assert_eq!(effective_page(0, 3), 1);
        assert_eq!(paginate(&[1, 2, 3], 0, size(2)), &[1, 2]);
    }
}
