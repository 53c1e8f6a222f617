//! Page window and paged results

use serde::Serialize;
use sqlx::{Postgres, QueryBuilder};
use utoipa::ToSchema;

pub const DEFAULT_PAGE_NUMBER: i64 = 1;
pub const DEFAULT_PAGE_SIZE: i64 = 5;

/// Effective page window. Always holds positive values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paging {
    pub page_number: i64,
    pub page_size: i64,
}

impl Paging {
    /// If either value is absent or not positive, both fall back to the defaults.
    pub fn from_request(page_number: Option<i64>, page_size: Option<i64>) -> Self {
        match (page_number, page_size) {
            (Some(page_number), Some(page_size)) if page_number > 0 && page_size > 0 => Self {
                page_number,
                page_size,
            },
            _ => Self::default(),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        self.page_size
    }

    pub fn push_limit(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(" LIMIT ");
        qb.push_bind(self.limit());
        qb.push(" OFFSET ");
        qb.push_bind(self.offset());
    }
}

impl Default for Paging {
    fn default() -> Self {
        Self {
            page_number: DEFAULT_PAGE_NUMBER,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of projected rows plus the size of the filtered set.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub current_page: i64,
    pub page_size: i64,
    pub total_item_count: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, paging: Paging, total_item_count: i64) -> Self {
        Self {
            items,
            current_page: paging.page_number,
            page_size: paging.page_size,
            total_item_count,
        }
    }

    pub fn total_pages(&self) -> i64 {
        if self.page_size <= 0 {
            return 0;
        }
        (self.total_item_count + self.page_size - 1) / self.page_size
    }

    pub fn metadata(&self) -> PaginationMetadata {
        PaginationMetadata {
            current_page: self.current_page,
            page_size: self.page_size,
            total_item_count: self.total_item_count,
            total_pages: self.total_pages(),
        }
    }
}

/// Serialized into the `X-Pagination` response header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaginationMetadata {
    pub current_page: i64,
    pub page_size: i64,
    pub total_item_count: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_or_non_positive_values_reset_both() {
        let defaults = Paging {
            page_number: 1,
            page_size: 5,
        };
        assert_eq!(Paging::from_request(None, None), defaults);
        assert_eq!(Paging::from_request(Some(4), None), defaults);
        assert_eq!(Paging::from_request(None, Some(20)), defaults);
        assert_eq!(Paging::from_request(Some(0), Some(20)), defaults);
        assert_eq!(Paging::from_request(Some(3), Some(-1)), defaults);
    }

    #[test]
    fn valid_values_are_kept() {
        let paging = Paging::from_request(Some(3), Some(20));
        assert_eq!(paging.page_number, 3);
        assert_eq!(paging.page_size, 20);
        assert_eq!(paging.offset(), 40);
        assert_eq!(paging.limit(), 20);
    }

    #[test]
    fn total_pages_rounds_up() {
        let paging = Paging::from_request(Some(1), Some(5));
        assert_eq!(Page::<()>::new(vec![], paging, 0).total_pages(), 0);
        assert_eq!(Page::<()>::new(vec![], paging, 5).total_pages(), 1);
        assert_eq!(Page::<()>::new(vec![], paging, 11).total_pages(), 3);
    }

    #[test]
    fn metadata_serializes_camel_case() {
        let page = Page::new(vec![1, 2], Paging::from_request(Some(2), Some(2)), 7);
        let json = serde_json::to_value(page.metadata()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "currentPage": 2,
                "pageSize": 2,
                "totalItemCount": 7,
                "totalPages": 4
            })
        );
    }
}
