//! Shared pagination envelope.
//!
//! Every listing endpoint responds with `{items..., "pagination": {...}}`
//! using the same page/limit/total/pages shape.

use serde::{Deserialize, Serialize};

/// Default page size for listings.
pub const DEFAULT_LIMIT: u32 = 10;

/// Pagination metadata returned alongside listing results.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u64,
}

/// Slice `items` down to the requested page.
///
/// Pages are 1-based; `page` and `limit` are clamped to at least 1. The
/// `pages` count is `ceil(total / limit)`.
pub fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> (Vec<T>, Pagination) {
    let page = page.max(1);
    let limit = limit.max(1);
    let total = items.len() as u64;
    let pages = total.div_ceil(u64::from(limit));

    let start = (page - 1).saturating_mul(limit) as usize;
    let slice = items
        .iter()
        .skip(start)
        .take(limit as usize)
        .cloned()
        .collect();

    (
        slice,
        Pagination {
            page,
            limit,
            total,
            pages,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_slices() {
        let items: Vec<i32> = (1..=25).collect();
        let (page1, meta) = paginate(&items, 1, 10);
        assert_eq!(page1, (1..=10).collect::<Vec<_>>());
        assert_eq!(
            meta,
            Pagination {
                page: 1,
                limit: 10,
                total: 25,
                pages: 3
            }
        );

        let (page3, meta) = paginate(&items, 3, 10);
        assert_eq!(page3, vec![21, 22, 23, 24, 25]);
        assert_eq!(meta.pages, 3);
    }

    #[test]
    fn test_paginate_past_end_is_empty() {
        let items = vec![1, 2, 3];
        let (slice, meta) = paginate(&items, 5, 10);
        assert!(slice.is_empty());
        assert_eq!(meta.total, 3);
        assert_eq!(meta.pages, 1);
    }

    #[test]
    fn test_paginate_clamps_zero_inputs() {
        let items = vec![1, 2, 3];
        let (slice, meta) = paginate(&items, 0, 0);
        assert_eq!(slice, vec![1]);
        assert_eq!(meta.page, 1);
        assert_eq!(meta.limit, 1);
    }
}
