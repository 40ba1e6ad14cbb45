//! Category listing type.

use shopfront_core::{CategoryId, category_slug};

/// A top-level product category.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    /// URL slug used by `/products?category=`.
    pub slug: String,
}

impl Category {
    #[must_use]
    pub fn new(id: CategoryId, name: String) -> Self {
        let slug = category_slug(&name);
        Self { id, name, slug }
    }
}

/// Find the category whose slug matches `slug` (case-insensitive).
#[must_use]
pub fn find_by_slug<'a>(categories: &'a [Category], slug: &str) -> Option<&'a Category> {
    let wanted = category_slug(slug);
    categories.iter().find(|c| c.slug == wanted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories() -> Vec<Category> {
        vec![
            Category::new(CategoryId::new(1), "Beauty & Personal Care".to_string()),
            Category::new(CategoryId::new(2), "Books".to_string()),
        ]
    }

    #[test]
    fn test_find_by_slug() {
        let categories = categories();
        let found = find_by_slug(&categories, "beauty-personal-care");
        assert_eq!(found.map(|c| c.id), Some(CategoryId::new(1)));
    }

    #[test]
    fn test_find_by_slug_ignores_case_and_spacing() {
        let categories = categories();
        assert!(find_by_slug(&categories, "BOOKS").is_some());
        assert!(find_by_slug(&categories, "beauty personal care").is_some());
        assert!(find_by_slug(&categories, "garden").is_none());
    }
}
