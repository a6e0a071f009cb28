/// Page-number pagination shared by every list endpoint
use actix_web::HttpRequest;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::{AppError, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page (max 100)
    pub page_size: Option<u32>,
}

/// A resolved page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: u32,
    pub size: u32,
}

impl Page {
    pub fn limit(&self) -> i64 {
        i64::from(self.size)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.number - 1) * i64::from(self.size)
    }
}

impl From<PageParams> for Page {
    fn from(params: PageParams) -> Self {
        Self {
            number: params.page.unwrap_or(1).max(1),
            size: params
                .page_size
                .unwrap_or(DEFAULT_PAGE_SIZE)
                .clamp(1, MAX_PAGE_SIZE),
        }
    }
}

/// `{count, next, previous, results}` envelope.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Paginated<T> {
    pub count: i64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T> Paginated<T> {
    /// Build the envelope. `base` is the request path plus any query
    /// parameters other than paging, e.g. `/api/v1/users/search?search_query=ann`.
    /// A page past the end is a 404, except page 1 of an empty collection.
    pub fn new(results: Vec<T>, count: i64, page: Page, base: &str) -> Result<Self> {
        if page.number > 1 && page.offset() >= count {
            return Err(AppError::NotFound("Invalid page.".to_string()));
        }

        let link = |number: u32| {
            let sep = if base.contains('?') { '&' } else { '?' };
            format!("{base}{sep}page={number}&page_size={}", page.size)
        };

        let next = (page.offset() + (results.len() as i64) < count).then(|| link(page.number + 1));
        let previous = (page.number > 1).then(|| link(page.number - 1));

        Ok(Self {
            count,
            next,
            previous,
            results,
        })
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Paginated<U> {
        Paginated {
            count: self.count,
            next: self.next,
            previous: self.previous,
            results: self.results.into_iter().map(f).collect(),
        }
    }
}

/// Request path plus its non-paging query parameters, as the base for
/// `next`/`previous` links.
pub fn base_url(req: &HttpRequest) -> String {
    let kept: Vec<&str> = req
        .query_string()
        .split('&')
        .filter(|pair| {
            !pair.is_empty() && !pair.starts_with("page=") && !pair.starts_with("page_size=")
        })
        .collect();

    if kept.is_empty() {
        req.path().to_string()
    } else {
        format!("{}?{}", req.path(), kept.join("&"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn base_url_drops_paging_params() {
        let req = TestRequest::get()
            .uri("/api/v1/users/search?page=2&search_query=ann&page_size=5")
            .to_http_request();
        assert_eq!(base_url(&req), "/api/v1/users/search?search_query=ann");

        let req = TestRequest::get().uri("/api/v1/posts?page=3").to_http_request();
        assert_eq!(base_url(&req), "/api/v1/posts");
    }

    #[test]
    fn defaults_and_clamping() {
        let page = Page::from(PageParams::default());
        assert_eq!(page, Page { number: 1, size: 10 });

        let page = Page::from(PageParams {
            page: Some(0),
            page_size: Some(1000),
        });
        assert_eq!(page, Page { number: 1, size: 100 });
        assert_eq!(page.offset(), 0);
    }

    #[test]
    fn links_on_middle_page() {
        let page = Page { number: 2, size: 2 };
        let paged = Paginated::new(vec![3, 4], 5, page, "/api/v1/users").unwrap();

        assert_eq!(paged.count, 5);
        assert_eq!(paged.next.as_deref(), Some("/api/v1/users?page=3&page_size=2"));
        assert_eq!(paged.previous.as_deref(), Some("/api/v1/users?page=1&page_size=2"));
    }

    #[test]
    fn last_page_has_no_next_and_keeps_query() {
        let page = Page { number: 3, size: 2 };
        let paged =
            Paginated::new(vec![5], 5, page, "/api/v1/users/search?search_query=a").unwrap();

        assert!(paged.next.is_none());
        assert_eq!(
            paged.previous.as_deref(),
            Some("/api/v1/users/search?search_query=a&page=2&page_size=2")
        );
    }

    #[test]
    fn page_past_end_is_not_found() {
        let page = Page { number: 4, size: 2 };
        assert!(matches!(
            Paginated::<i32>::new(vec![], 5, page, "/x"),
            Err(AppError::NotFound(_))
        ));

        let empty = Paginated::<i32>::new(vec![], 0, Page::from(PageParams::default()), "/x").unwrap();
        assert_eq!(empty.count, 0);
        assert!(empty.next.is_none() && empty.previous.is_none());
    }
}
