//! Fixed-size pages over an ordered list

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// One window into an ordered list, with navigation flags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<'a, T> {
    /// Records visible on this page
    pub items: &'a [T],
    /// Zero-based page index
    pub index: usize,
    /// A previous page exists
    pub has_prev: bool,
    /// A next page exists
    pub has_next: bool,
}

impl<T> Page<'_, T> {
    /// True when the requested page lies past the end of the list
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Slice `items` into page `page` of `page_size` records.
///
/// Out-of-range pages yield an empty slice with both flags cleared.
/// A page size of zero is treated as one.
pub fn paginate<T>(items: &[T], page: usize, page_size: usize) -> Page<'_, T> {
    let size = page_size.max(1);
    let start = page.saturating_mul(size);

    if start >= items.len() {
        return Page {
            items: &[],
            index: page,
            has_prev: false,
            has_next: false,
        };
    }

    let end = start.saturating_add(size).min(items.len());

    Page {
        items: &items[start..end],
        index: page,
        has_prev: start > 0,
        has_next: end < items.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, 0, false, false)]
    #[case(3, 0, false, false)]
    #[case(5, 0, false, false)]
    #[case(6, 0, false, true)]
    #[case(6, 1, true, false)]
    #[case(12, 1, true, true)]
    #[case(12, 2, true, false)]
    fn test_nav_flags(
        #[case] len: usize,
        #[case] page: usize,
        #[case] has_prev: bool,
        #[case] has_next: bool,
    ) {
        let items: Vec<usize> = (0..len).collect();
        let p = paginate(&items, page, 5);
        assert_eq!(p.has_prev, has_prev);
        assert_eq!(p.has_next, has_next);
    }

    #[test]
    fn test_flags_match_formula_in_range() {
        for len in 0..23usize {
            let items: Vec<usize> = (0..len).collect();
            for page in 0..len.div_ceil(5) {
                let p = paginate(&items, page, 5);
                assert_eq!(p.has_prev, page * 5 > 0);
                assert_eq!(p.has_next, (page + 1) * 5 < len);
            }
        }
    }

    #[test]
    fn test_pages_reconstruct_list() {
        for len in 0..23usize {
            let items: Vec<usize> = (0..len).collect();
            let rebuilt: Vec<usize> = (0..len.div_ceil(5))
                .flat_map(|page| paginate(&items, page, 5).items.to_vec())
                .collect();
            assert_eq!(rebuilt, items);
        }
    }

    #[test]
    fn test_out_of_range_page() {
        let items = vec!["a", "b", "c"];
        let p = paginate(&items, 4, 5);
        assert!(p.is_empty());
        assert!(!p.has_prev);
        assert!(!p.has_next);

        let p = paginate(&items, usize::MAX, 5);
        assert!(p.is_empty());
    }

    #[test]
    fn test_last_partial_page() {
        let items: Vec<u8> = (0..7).collect();
        let p = paginate(&items, 1, 5);
        assert_eq!(p.items, &[5, 6]);
    }

    #[test]
    fn test_zero_page_size() {
        let items = vec![1, 2];
        let p = paginate(&items, 1, 0);
        assert_eq!(p.items, &[2]);
        assert!(!p.has_next);
    }
}
