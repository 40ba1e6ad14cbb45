//! URL slugs for category names.

/// Turn a category name into its URL slug.
///
/// Keeps letters and digits (lowercased) and collapses every other run of
/// characters into a single `-`.
///
/// ```
/// use shopfront_core::category_slug;
///
/// assert_eq!(category_slug("Beauty & Personal Care"), "beauty-personal-care");
/// assert_eq!(category_slug("Fashion - Men"), "fashion-men");
/// ```
#[must_use]
pub fn category_slug(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.extend(c.to_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_trims_separators() {
        assert_eq!(category_slug("  Toys & Games!! "), "toys-games");
    }

    #[test]
    fn test_slug_is_stable() {
        let once = category_slug("Home & Kitchen");
        assert_eq!(category_slug(&once), once);
    }

    #[test]
    fn test_slug_empty() {
        assert_eq!(category_slug("&&"), "");
    }
}
