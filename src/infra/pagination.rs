use serde::{Deserialize, Serialize};
use utoipa::IntoParams;
use validator::Validate;

/// Pagination parameters.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, IntoParams, Validate)]
pub struct PaginationParams {
    /// The 1-indexed page to fetch.
    #[validate(range(min = 1))]
    page: Option<i64>,
    /// The number of elements per page.
    #[validate(range(min = 1))]
    limit: Option<i64>,
}

impl PaginationParams {
    pub fn new(page: i64, limit: i64) -> Self {
        Self {
            page: Some(page),
            limit: Some(limit),
        }
    }

    pub fn page(&self) -> i64 {
        self.page.unwrap_or(1)
    }

    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(10)
    }

    pub fn offset(&self) -> i64 {
        self.page().saturating_sub(1).saturating_mul(self.limit())
    }

    /// The number of pages needed to hold `total` elements.
    pub fn total_pages(&self, total: i64) -> i64 {
        if total == 0 {
            0
        } else {
            (total - 1) / self.limit() + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PaginationParams;
    use crate::infra::validation::Valid;

    #[test]
    fn defaults_to_first_page_of_ten() {
        let params = PaginationParams::default();
        assert_eq!(1, params.page());
        assert_eq!(10, params.limit());
        assert_eq!(0, params.offset());
    }

    #[test]
    fn offset_skips_previous_pages() {
        let params = PaginationParams::new(3, 10);
        assert_eq!(20, params.offset());
    }

    #[test]
    fn total_pages_rounds_up() {
        let params = PaginationParams::new(1, 10);
        assert_eq!(0, params.total_pages(0));
        assert_eq!(1, params.total_pages(1));
        assert_eq!(1, params.total_pages(10));
        assert_eq!(2, params.total_pages(11));
    }

    #[test]
    fn zeroth_page_is_rejected() {
        assert!(Valid::new(PaginationParams::new(0, 10)).is_err());
        assert!(Valid::new(PaginationParams::new(1, 0)).is_err());
        assert!(Valid::new(PaginationParams::new(1, 10)).is_ok());
    }

    #[test]
    fn extreme_pages_do_not_overflow() {
        let params = Valid::new(PaginationParams::new(i64::MAX, 10))
            .unwrap()
            .into_inner();
        assert_eq!(i64::MAX, params.offset());

        let params = PaginationParams::new(1, i64::MAX);
        assert_eq!(0, params.offset());
        assert_eq!(1, params.total_pages(2));

        let params = PaginationParams::new(1, 10);
        assert_eq!(i64::MAX / 10 + 1, params.total_pages(i64::MAX));
    }
}
