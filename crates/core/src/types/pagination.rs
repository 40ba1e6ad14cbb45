//! Page-number pagination for list views.

/// Resolves a requested page against a total row count.
///
/// Pages are 1-based. A missing or unparsable page number resolves to the
/// first page and one past the end resolves to the last page, so a list view
/// never renders an error for a stale link. An empty result still has one
/// (empty) page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    page: i64,
    per_page: i64,
    total: i64,
}

impl Paginator {
    /// Resolve `requested` (raw query-string value) for `total` rows.
    #[must_use]
    pub fn new(requested: Option<&str>, per_page: i64, total: i64) -> Self {
        let per_page = per_page.max(1);
        let total = total.max(0);
        let num_pages = Self::pages_for(total, per_page);
        let page = requested
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .filter(|&p| p >= 1)
            .map_or(1, |p| p.min(num_pages));

        Self {
            page,
            per_page,
            total,
        }
    }

    const fn pages_for(total: i64, per_page: i64) -> i64 {
        if total == 0 {
            1
        } else {
            (total + per_page - 1) / per_page
        }
    }

    #[must_use]
    pub const fn page(&self) -> i64 {
        self.page
    }

    #[must_use]
    pub const fn per_page(&self) -> i64 {
        self.per_page
    }

    #[must_use]
    pub const fn total(&self) -> i64 {
        self.total
    }

    #[must_use]
    pub const fn num_pages(&self) -> i64 {
        Self::pages_for(self.total, self.per_page)
    }

    /// SQL `OFFSET` for the resolved page.
    #[must_use]
    pub const fn offset(&self) -> i64 {
        (self.page - 1) * self.per_page
    }

    /// SQL `LIMIT`.
    #[must_use]
    pub const fn limit(&self) -> i64 {
        self.per_page
    }

    #[must_use]
    pub const fn has_previous(&self) -> bool {
        self.page > 1
    }

    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.num_pages()
    }

    /// 1-based index of the first row on this page (0 when empty).
    #[must_use]
    pub const fn start_index(&self) -> i64 {
        if self.total == 0 { 0 } else { self.offset() + 1 }
    }

    /// 1-based index of the last row on this page.
    #[must_use]
    pub fn end_index(&self) -> i64 {
        (self.offset() + self.per_page).min(self.total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_and_garbage_page_is_first() {
        assert_eq!(Paginator::new(None, 25, 100).page(), 1);
        assert_eq!(Paginator::new(Some("abc"), 25, 100).page(), 1);
        assert_eq!(Paginator::new(Some("0"), 25, 100).page(), 1);
        assert_eq!(Paginator::new(Some("-3"), 25, 100).page(), 1);
    }

    #[test]
    fn test_out_of_range_is_last() {
        let p = Paginator::new(Some("99"), 25, 101);
        assert_eq!(p.num_pages(), 5);
        assert_eq!(p.page(), 5);
        assert_eq!(p.offset(), 100);
        assert!(!p.has_next());
        assert!(p.has_previous());
        assert_eq!(p.start_index(), 101);
        assert_eq!(p.end_index(), 101);
    }

    #[test]
    fn test_empty_has_one_page() {
        let p = Paginator::new(Some("4"), 50, 0);
        assert_eq!(p.num_pages(), 1);
        assert_eq!(p.page(), 1);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.start_index(), 0);
        assert!(!p.has_next());
        assert!(!p.has_previous());
    }

    #[test]
    fn test_exact_multiple() {
        let p = Paginator::new(Some("2"), 24, 48);
        assert_eq!(p.num_pages(), 2);
        assert_eq!(p.offset(), 24);
        assert_eq!(p.end_index(), 48);
    }
}
