use serde::Serialize;

use crate::{
    constants::MAX_COUNT_PER_PAGE,
    error::{Error, HtmlError},
    form::QueryParams,
};

/// Page/limit pair read from the `page` and `limit` query parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Unparsable or out-of-range values fall back to the first page and the
    /// default page size.
    pub fn from_query(params: &QueryParams, default_limit: i64) -> Self {
        let page = params
            .get("page")
            .and_then(|page| page.parse::<i64>().ok())
            .filter(|page| *page >= 1)
            .unwrap_or(1);
        let limit = params
            .get("limit")
            .and_then(|limit| limit.parse::<i64>().ok())
            .filter(|limit| *limit >= 1)
            .map(|limit| limit.min(MAX_COUNT_PER_PAGE))
            .unwrap_or(default_limit);

        Self { page, limit }
    }

    /// Saturates for pages far past the end; those come back empty and are
    /// rejected by [`PageContext::from_rows`].
    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Serialize, Debug)]
pub struct PageContext<T> {
    pub count: i64,
    pub next: Option<i64>,
    pub previous: Option<i64>,
    pub results: Vec<T>,
}

impl<T> PageContext<T> {
    /// `total_rows` comes from a `COUNT(*) OVER()` column, which is only seen
    /// when the page has rows. An empty page other than the first is out of
    /// range and answers 404.
    pub fn from_rows(rows: Vec<T>, total_rows: i64, request: PageRequest) -> Result<Self, Error> {
        if rows.is_empty() && request.page > 1 {
            return Err(HtmlError::NotFound.new("Invalid page."));
        }

        let next = if request.offset().saturating_add(rows.len() as i64) < total_rows {
            Some(request.page + 1)
        } else {
            None
        };
        let previous = if request.page > 1 {
            Some(request.page - 1)
        } else {
            None
        };

        Ok(Self {
            count: total_rows,
            next,
            previous,
            results: rows,
        })
    }

    pub fn with_results<U>(self, results: Vec<U>) -> PageContext<U> {
        PageContext {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn defaults_apply_to_missing_or_bad_values() {
        assert_eq!(
            PageRequest::from_query(&params(&[]), 6),
            PageRequest { page: 1, limit: 6 }
        );
        assert_eq!(
            PageRequest::from_query(&params(&[("page", "0"), ("limit", "abc")]), 6),
            PageRequest { page: 1, limit: 6 }
        );
        assert_eq!(
            PageRequest::from_query(&params(&[("page", "3"), ("limit", "1000")]), 6),
            PageRequest {
                page: 3,
                limit: MAX_COUNT_PER_PAGE
            }
        );
    }

    #[test]
    fn middle_page_links_both_ways() {
        let request = PageRequest { page: 2, limit: 2 };
        let page = PageContext::from_rows(vec![3, 4], 5, request).unwrap();

        assert_eq!(request.offset(), 2);
        assert_eq!(page.next, Some(3));
        assert_eq!(page.previous, Some(1));
        assert_eq!(page.count, 5);
    }

    #[test]
    fn edge_pages_stop_linking() {
        let first =
            PageContext::from_rows(vec![1, 2], 2, PageRequest { page: 1, limit: 2 }).unwrap();
        assert_eq!(first.next, None);
        assert_eq!(first.previous, None);

        let last = PageContext::from_rows(vec![5], 5, PageRequest { page: 3, limit: 2 }).unwrap();
        assert_eq!(last.next, None);
        assert_eq!(last.previous, Some(2));
    }

    #[test]
    fn huge_page_numbers_do_not_overflow() {
        let request = PageRequest::from_query(&params(&[("page", "9223372036854775807")]), 6);

        assert_eq!(request.page, i64::MAX);
        assert_eq!(request.offset(), i64::MAX);
    }

    #[test]
    fn empty_pages_past_the_first_are_not_found() {
        let error = PageContext::<i32>::from_rows(vec![], 0, PageRequest { page: 5, limit: 6 })
            .unwrap_err();
        assert_eq!(error.code, 404);
        assert_eq!(error.info.as_deref(), Some("Invalid page."));

        let empty = PageContext::<i32>::from_rows(vec![], 0, PageRequest { page: 1, limit: 6 })
            .unwrap();
        assert_eq!(empty.count, 0);
        assert_eq!(empty.next, None);
        assert_eq!(empty.previous, None);
    }
}
