use serde::{Deserialize, Serialize};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub offset: i64,
}

impl Pagination {
    pub const DEFAULT_LIMIT: i64 = 10;
    pub const MAX_LIMIT: i64 = 100;

    /// Page below 1 becomes 1; limit below 1 falls back to the default,
    /// above the maximum is clamped.
    pub fn resolve(query: &PageQuery) -> Self {
        let page = query.page.unwrap_or(1).max(1);
        let limit = match query.limit {
            Some(l) if l < 1 => Self::DEFAULT_LIMIT,
            Some(l) => l.min(Self::MAX_LIMIT),
            None => Self::DEFAULT_LIMIT,
        };
        Self {
            page,
            limit,
            offset: (page - 1).saturating_mul(limit),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl<T> Paginated<T> {
    pub fn new(data: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let total_pages = (total + pagination.limit - 1) / pagination.limit;
        Self {
            data,
            page: pagination.page,
            limit: pagination.limit,
            total,
            total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_page_and_limit() {
        let p = Pagination::resolve(&PageQuery { page: Some(0), limit: Some(500) });
        assert_eq!(p, Pagination { page: 1, limit: 100, offset: 0 });

        let p = Pagination::resolve(&PageQuery { page: Some(3), limit: Some(-1) });
        assert_eq!(p, Pagination { page: 3, limit: 10, offset: 20 });
    }

    #[test]
    fn huge_page_saturates_the_offset() {
        let p = Pagination::resolve(&PageQuery { page: Some(i64::MAX), limit: Some(10) });
        assert_eq!(p.page, i64::MAX);
        assert_eq!(p.offset, i64::MAX);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::resolve(&PageQuery { page: None, limit: Some(10) });
        assert_eq!(Paginated::new(Vec::<()>::new(), 21, p).total_pages, 3);
        assert_eq!(Paginated::new(Vec::<()>::new(), 0, p).total_pages, 0);
    }
}
