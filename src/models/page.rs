use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
/// Hard cap on pageSize; callers asking for more get this.
pub const MAX_PAGE_SIZE: i64 = 100;

/// Query parameters shared by every paginated listing.
///
/// Invalid values are never an error: out-of-range numbers, unknown sort
/// fields and unknown directions are silently normalized to the defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageQuery {
    pub page_number: Option<i64>,
    pub page_size: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_direction: Option<String>,
    /// Blogs only: case-insensitive substring filter on the blog name.
    pub search_name_term: Option<String>,
}

impl PageQuery {
    pub fn page(&self) -> i64 {
        self.page_number.unwrap_or(1).max(1)
    }

    pub fn size(&self) -> i64 {
        self.page_size
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        (self.page() - 1) * self.size()
    }

    /// 'asc' in any casing sorts ascending; everything else is DESC.
    pub fn direction(&self) -> &'static str {
        match self.sort_direction.as_deref() {
            Some(d) if d.eq_ignore_ascii_case("asc") => "ASC",
            _ => "DESC",
        }
    }

    /// Resolves the external sortBy name against an entity's allow-list of
    /// (external name, column identifier) pairs. Unknown names fall back to
    /// created_at, so caller input never reaches the SQL string.
    pub fn sort_column(&self, allowed: &[(&str, &'static str)]) -> &'static str {
        self.sort_by
            .as_deref()
            .and_then(|name| {
                allowed
                    .iter()
                    .find(|(external, _)| *external == name)
                    .map(|(_, column)| *column)
            })
            .unwrap_or("created_at")
    }
}

/// Pagination envelope shared by every listing response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub pages_count: i64,
    pub page: i64,
    pub page_size: i64,
    pub total_count: i64,
    pub items: Vec<T>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total_count: i64, query: &PageQuery) -> Self {
        let page_size = query.size();
        Self {
            pages_count: (total_count + page_size - 1) / page_size,
            page: query.page(),
            page_size,
            total_count,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, size: Option<i64>) -> PageQuery {
        PageQuery {
            page_number: page,
            page_size: size,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_apply_when_params_missing() {
        let q = PageQuery::default();
        assert_eq!(q.page(), 1);
        assert_eq!(q.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(q.offset(), 0);
        assert_eq!(q.direction(), "DESC");
    }

    #[test]
    fn out_of_range_values_are_normalized() {
        let q = query(Some(0), Some(-5));
        assert_eq!(q.page(), 1);
        assert_eq!(q.size(), 1);

        let q = query(Some(-3), Some(100_000));
        assert_eq!(q.page(), 1);
        assert_eq!(q.size(), MAX_PAGE_SIZE);
    }

    #[test]
    fn offset_is_page_minus_one_times_size() {
        let q = query(Some(3), Some(10));
        assert_eq!(q.offset(), 20);
    }

    #[test]
    fn direction_is_case_insensitive_with_desc_fallback() {
        let mut q = PageQuery::default();
        q.sort_direction = Some("ASC".into());
        assert_eq!(q.direction(), "ASC");
        q.sort_direction = Some("aSc".into());
        assert_eq!(q.direction(), "ASC");
        q.sort_direction = Some("descending".into());
        assert_eq!(q.direction(), "DESC");
    }

    #[test]
    fn unknown_sort_field_falls_back_to_created_at() {
        let allowed = &[("title", "title"), ("createdAt", "created_at")];
        let mut q = PageQuery::default();
        q.sort_by = Some("foo".into());
        assert_eq!(q.sort_column(allowed), "created_at");
        q.sort_by = Some("title".into());
        assert_eq!(q.sort_column(allowed), "title");
        q.sort_by = None;
        assert_eq!(q.sort_column(allowed), "created_at");
    }

    #[test]
    fn pages_count_is_ceiling_of_total_over_size() {
        let q = query(Some(2), Some(10));
        let page = Page::new(vec![(); 5], 15, &q);
        assert_eq!(page.pages_count, 2);
        assert_eq!(page.page, 2);
        assert_eq!(page.page_size, 10);
        assert_eq!(page.total_count, 15);

        let empty: Page<()> = Page::new(vec![], 0, &q);
        assert_eq!(empty.pages_count, 0);

        let exact: Page<()> = Page::new(vec![(); 10], 20, &q);
        assert_eq!(exact.pages_count, 2);
    }
}
