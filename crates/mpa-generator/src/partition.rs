//! Page partitioning for split builds.
//!
//! Splits the discovery-ordered page list into contiguous, balanced groups,
//! one per parallel build process.

/// Default number of parallel groups.
pub const DEFAULT_GROUPS: usize = 4;

/// Size of each group when splitting `total` items into `groups` groups.
///
/// `ceil(total / groups)`, with a group count of zero treated as one.
#[must_use]
pub fn chunk_size(total: usize, groups: usize) -> usize {
    total.div_ceil(groups.max(1))
}

/// Partition `items` into contiguous groups of `ceil(len / groups)` items.
///
/// Order is preserved and every item lands in exactly one group; the last
/// group may be shorter. Empty input yields no groups.
#[must_use]
pub fn partition<T: Clone>(items: &[T], groups: usize) -> Vec<Vec<T>> {
    if items.is_empty() {
        return Vec::new();
    }

    let size = chunk_size(items.len(), groups);
    items.chunks(size).map(<[T]>::to_vec).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("page{i}")).collect()
    }

    #[test]
    fn test_chunk_size() {
        assert_eq!(chunk_size(10, 4), 3);
        assert_eq!(chunk_size(8, 4), 2);
        assert_eq!(chunk_size(1, 4), 1);
        assert_eq!(chunk_size(0, 4), 0);
        assert_eq!(chunk_size(5, 0), 5);
    }

    #[test]
    fn test_ten_pages_four_groups() {
        let pages = ids(10);
        let groups = partition(&pages, DEFAULT_GROUPS);

        let lengths: Vec<_> = groups.iter().map(Vec::len).collect();
        assert_eq!(lengths, vec![3, 3, 3, 1]);

        let flattened: Vec<_> = groups.into_iter().flatten().collect();
        assert_eq!(flattened, pages);
    }

    #[test]
    fn test_empty_input_yields_no_groups() {
        let groups = partition::<String>(&[], DEFAULT_GROUPS);
        assert!(groups.is_empty());
    }

    #[test]
    fn test_fewer_pages_than_groups() {
        let pages = ids(2);
        let groups = partition(&pages, DEFAULT_GROUPS);
        assert_eq!(groups, vec![vec!["page0".to_string()], vec!["page1".to_string()]]);
    }

    #[test]
    fn test_coverage_for_many_sizes() {
        for n in 1..=40 {
            let pages = ids(n);
            let groups = partition(&pages, DEFAULT_GROUPS);
            let size = n.div_ceil(DEFAULT_GROUPS);

            assert_eq!(groups.len(), n.div_ceil(size), "group count for n={n}");
            assert!(groups.iter().all(|g| !g.is_empty()), "no empty group for n={n}");
            assert!(
                groups[..groups.len() - 1].iter().all(|g| g.len() == size),
                "full groups for n={n}"
            );

            let flattened: Vec<_> = groups.concat();
            assert_eq!(flattened, pages, "order and coverage for n={n}");
        }
    }

    #[test]
    fn test_deterministic() {
        let pages = ids(13);
        assert_eq!(partition(&pages, 4), partition(&pages, 4));
    }
}
