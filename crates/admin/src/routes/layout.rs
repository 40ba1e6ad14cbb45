//! Shared page context, query parsing and pagination links.

use askama::Template;
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use tower_sessions::Session;

use shopfront_core::{Paginator, Permission};

use crate::error::Result;
use crate::middleware::take_flash;
use crate::models::CurrentStaff;

/// Admin sections, in navigation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Dashboard,
    Catalogue,
    Inventory,
    Customers,
    Staff,
}

impl Section {
    const ALL: [Self; 5] = [
        Self::Dashboard,
        Self::Catalogue,
        Self::Inventory,
        Self::Customers,
        Self::Staff,
    ];

    const fn label(self) -> &'static str {
        match self {
            Self::Dashboard => "Dashboard",
            Self::Catalogue => "Catalogue",
            Self::Inventory => "Inventory",
            Self::Customers => "Customers",
            Self::Staff => "Staff",
        }
    }

    const fn url(self) -> &'static str {
        match self {
            Self::Dashboard => "/",
            Self::Catalogue => "/catalogue",
            Self::Inventory => "/inventory",
            Self::Customers => "/customers",
            Self::Staff => "/staff",
        }
    }

    /// Permission needed to open the section; the dashboard needs none.
    const fn permission(self) -> Option<Permission> {
        match self {
            Self::Dashboard => None,
            Self::Catalogue => Some(Permission::Catalogue),
            Self::Inventory => Some(Permission::Inventory),
            Self::Customers => Some(Permission::Customers),
            Self::Staff => Some(Permission::Staff),
        }
    }
}

/// Navigation entry.
#[derive(Debug, Clone)]
pub struct NavLink {
    pub label: &'static str,
    pub url: &'static str,
    pub active: bool,
}

/// Flash message ready for the template.
#[derive(Debug, Clone)]
pub struct FlashView {
    pub css_class: &'static str,
    pub text: String,
}

/// Context shared by every signed-in page.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub staff_name: String,
    pub role_label: &'static str,
    /// Only the sections the role may open.
    pub nav: Vec<NavLink>,
    pub flash: Vec<FlashView>,
}

/// Sections `staff` may open.
#[must_use]
pub fn nav_links(staff: &CurrentStaff, current: Section) -> Vec<NavLink> {
    Section::ALL
        .into_iter()
        .filter(|s| s.permission().is_none_or(|p| staff.can(p)))
        .map(|s| NavLink {
            label: s.label(),
            url: s.url(),
            active: s == current,
        })
        .collect()
}

impl PageContext {
    /// Build the context, consuming pending flash messages.
    pub async fn load(session: &Session, staff: &CurrentStaff, current: Section) -> Self {
        let flash = take_flash(session)
            .await
            .into_iter()
            .map(|m| FlashView {
                css_class: m.level.css_class(),
                text: m.text,
            })
            .collect();

        Self {
            staff_name: staff.display_name.clone(),
            role_label: staff.role.label(),
            nav: nav_links(staff, current),
            flash,
        }
    }
}

/// Render a template to an HTML response.
///
/// # Errors
///
/// Returns `AppError::Template` if rendering fails.
pub fn render<T: Template>(template: &T) -> Result<Response> {
    Ok(Html(template.render()?).into_response())
}

/// A CSV download.
#[must_use]
pub fn csv_download(filename: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response()
}

/// Path segment for a SKU.
#[must_use]
pub fn sku_path(prefix: &str, sku: &str, suffix: &str) -> String {
    format!("{prefix}/{}{suffix}", urlencoding::encode(sku))
}

/// Decoded query-string pairs, keeping repeats.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    /// Parse a raw query string.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        Self(
            raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
                .unwrap_or_default(),
        )
    }

    /// First value for `key`, trimmed; `None` when absent or blank.
    #[must_use]
    pub fn first(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Every non-blank value for `key`, trimmed.
    #[must_use]
    pub fn all(&self, key: &str) -> Vec<String> {
        self.0
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }

    /// Every value for `key` that parses as `T`; others are ignored.
    #[must_use]
    pub fn parsed<T: std::str::FromStr>(&self, key: &str) -> Vec<T> {
        self.all(key).iter().filter_map(|v| v.parse().ok()).collect()
    }

    /// Whether `key` has `value` among its values.
    #[must_use]
    pub fn has(&self, key: &str, value: &str) -> bool {
        self.0.iter().any(|(k, v)| k == key && v.trim() == value)
    }

    /// The query string without `page`, for pagination and export links.
    #[must_use]
    pub fn without_page(&self) -> String {
        let mut out = url::form_urlencoded::Serializer::new(String::new());
        for (k, v) in &self.0 {
            if k != "page" && !v.trim().is_empty() {
                out.append_pair(k, v.trim());
            }
        }
        out.finish()
    }
}

/// Pagination controls.
#[derive(Debug, Clone)]
pub struct PageLinks {
    pub page: i64,
    pub num_pages: i64,
    pub total: i64,
    pub previous_url: Option<String>,
    pub next_url: Option<String>,
}

impl PageLinks {
    /// Links for `paginator` on `path`, carrying `query` (without `page`).
    #[must_use]
    pub fn new(path: &str, query: &str, paginator: &Paginator) -> Self {
        let url = |page: i64| {
            if query.is_empty() {
                format!("{path}?page={page}")
            } else {
                format!("{path}?{query}&page={page}")
            }
        };
        Self {
            page: paginator.page(),
            num_pages: paginator.num_pages(),
            total: paginator.total(),
            previous_url: paginator.has_previous().then(|| url(paginator.page() - 1)),
            next_url: paginator.has_next().then(|| url(paginator.page() + 1)),
        }
    }
}

/// A `<select>`/checkbox option.
#[derive(Debug, Clone)]
pub struct Choice {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

impl Choice {
    pub fn new(value: impl Into<String>, label: impl Into<String>, selected: bool) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            selected,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use shopfront_core::{StaffRole, StaffUserId};

    use super::*;

    fn staff(role: StaffRole) -> CurrentStaff {
        CurrentStaff {
            id: StaffUserId::new(1),
            username: "sam".to_string(),
            display_name: "Sam".to_string(),
            role,
        }
    }

    #[test]
    fn test_nav_shows_only_permitted_sections() {
        let labels: Vec<&str> = nav_links(&staff(StaffRole::Support), Section::Customers)
            .iter()
            .map(|l| l.label)
            .collect();
        assert_eq!(labels, vec!["Dashboard", "Customers"]);

        let admin = nav_links(&staff(StaffRole::Admin), Section::Staff);
        assert_eq!(admin.len(), 5);
        assert!(admin.iter().find(|l| l.label == "Staff").unwrap().active);
    }

    #[test]
    fn test_query_params_repeats() {
        let params = QueryParams::parse(Some("category=1&category=2&q=+lamp+&page=3&household_size=x"));
        assert_eq!(params.all("category"), vec!["1", "2"]);
        assert_eq!(params.first("q"), Some("lamp"));
        assert!(params.parsed::<i32>("household_size").is_empty());
        assert!(params.has("category", "2"));
        assert_eq!(params.without_page(), "category=1&category=2&q=lamp&household_size=x");
    }

    #[test]
    fn test_sku_path_encodes() {
        assert_eq!(sku_path("/inventory", "A B/1", ""), "/inventory/A%20B%2F1");
        assert_eq!(
            sku_path("/catalogue/products", "T-1", "/edit"),
            "/catalogue/products/T-1/edit"
        );
    }

    #[test]
    fn test_page_links_keep_filters() {
        let paginator = Paginator::new(Some("2"), 25, 60);
        let links = PageLinks::new("/catalogue", "q=tea", &paginator);
        assert_eq!(links.previous_url.as_deref(), Some("/catalogue?q=tea&page=1"));
        assert_eq!(links.next_url.as_deref(), Some("/catalogue?q=tea&page=3"));

        let first = PageLinks::new("/staff", "", &Paginator::new(None, 25, 30));
        assert_eq!(first.previous_url, None);
        assert_eq!(first.next_url.as_deref(), Some("/staff?page=2"));
    }
}
