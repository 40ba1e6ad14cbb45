//! Dashboard route handler.

use askama::Template;
use axum::{
    extract::{Query, State},
    response::Response,
};
use chrono::{Duration, NaiveDate, Utc};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::CategoryId;

use crate::db::dashboard::DateRange;
use crate::db::{CategoryRepository, DashboardRepository};
use crate::error::Result;
use crate::filters;
use crate::middleware::RequireStaff;
use crate::models::{InventoryKpis, LowStockItem, SalesKpis, TopProduct};
use crate::routes::layout::{Choice, PageContext, Section, render};
use crate::state::AppState;

/// Days covered by the default date range.
const DEFAULT_RANGE_DAYS: i64 = 30;

/// Dashboard query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct DashboardQuery {
    pub category: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Dashboard template.
#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub categories: Vec<Choice>,
    pub start: String,
    pub end: String,
    pub inventory: InventoryKpis,
    pub sales: SalesKpis,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<LowStockItem>,
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw?.trim(), "%Y-%m-%d").ok()
}

/// Resolve the requested range against `today`; bad or missing dates fall
/// back to the last 30 days.
#[must_use]
pub fn resolve_range(start: Option<&str>, end: Option<&str>, today: NaiveDate) -> DateRange {
    let start = parse_date(start).unwrap_or(today - Duration::days(DEFAULT_RANGE_DAYS));
    let end = parse_date(end).unwrap_or(today);
    DateRange::new(start, end)
}

/// Stock and sales KPIs with category and date filters.
///
/// GET /
#[instrument(skip(state, session, staff))]
pub async fn index(
    RequireStaff(staff): RequireStaff,
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<DashboardQuery>,
) -> Result<Response> {
    let category = query
        .category
        .as_deref()
        .and_then(|c| c.trim().parse::<CategoryId>().ok());
    let range = resolve_range(
        query.start.as_deref(),
        query.end.as_deref(),
        Utc::now().date_naive(),
    );

    let dashboard = DashboardRepository::new(state.pool());
    let inventory = dashboard.inventory_kpis(category).await?;
    let sales = dashboard.sales_kpis(category, range).await?;
    let top_products = dashboard.top_products(category, range).await?;
    let low_stock = dashboard.low_stock(category).await?;

    let categories = CategoryRepository::new(state.pool())
        .list_with_counts()
        .await?
        .into_iter()
        .map(|c| Choice::new(c.id.to_string(), c.name, Some(c.id) == category))
        .collect();

    render(&DashboardTemplate {
        page: PageContext::load(&session, &staff, Section::Dashboard).await,
        categories,
        start: range.start.format("%Y-%m-%d").to_string(),
        end: range.end.format("%Y-%m-%d").to_string(),
        inventory,
        sales,
        top_products,
        low_stock,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_default_range_is_last_30_days() {
        let range = resolve_range(None, None, date("2026-04-30"));
        assert_eq!(range.start, date("2026-03-31"));
        assert_eq!(range.end, date("2026-04-30"));
    }

    #[test]
    fn test_invalid_dates_fall_back() {
        let range = resolve_range(Some("yesterday"), Some("2026-02-30"), date("2026-04-30"));
        assert_eq!(range.start, date("2026-03-31"));
        assert_eq!(range.end, date("2026-04-30"));
    }

    #[test]
    fn test_reversed_dates_swap() {
        let range = resolve_range(Some("2026-04-10"), Some("2026-04-01"), date("2026-04-30"));
        assert_eq!(range.start, date("2026-04-01"));
        assert_eq!(range.end, date("2026-04-10"));
    }
}
