//! Customer directory with demographic filters and order history.

use askama::Template;
use axum::{
    extract::{Path, RawQuery, State},
    response::Response,
};
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{CustomerId, Paginator};

use crate::db::CustomerRepository;
use crate::db::customers::{
    AGE_BUCKETS, CustomerFilter, CustomerFilterOptions, INCOME_BUCKETS, RangeBucket,
    parse_buckets,
};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{CanManageCustomers, RequirePermission};
use crate::models::{CustomerOrder, CustomerRecord, CustomerTotals};
use crate::routes::layout::{Choice, PageContext, PageLinks, QueryParams, Section, render};
use crate::state::AppState;

const CUSTOMERS_PER_PAGE: i64 = 50;
const ORDERS_PER_PAGE: i64 = 25;

type CustomerStaff = RequirePermission<CanManageCustomers>;

/// One repeatable checkbox filter.
#[derive(Debug, Clone)]
pub struct FilterGroup {
    /// Query-string key.
    pub key: &'static str,
    pub label: &'static str,
    pub choices: Vec<Choice>,
}

#[derive(Template)]
#[template(path = "customers/list.html")]
pub struct CustomerListTemplate {
    pub page: PageContext,
    pub customers: Vec<CustomerRecord>,
    pub q: String,
    pub groups: Vec<FilterGroup>,
    pub pages: PageLinks,
}

#[derive(Template)]
#[template(path = "customers/detail.html")]
pub struct CustomerDetailTemplate {
    pub page: PageContext,
    pub customer: CustomerRecord,
    pub totals: CustomerTotals,
    pub orders: Vec<CustomerOrder>,
    pub pages: PageLinks,
}

/// Build the list filter from the query string.
#[must_use]
pub fn customer_filter(params: &QueryParams) -> CustomerFilter {
    CustomerFilter {
        search: params.first("q").map(str::to_string),
        genders: params.all("gender"),
        employment_statuses: params.all("employment"),
        occupations: params.all("occupation"),
        educations: params.all("education"),
        preferred_categories: params.all("preferred_category"),
        household_sizes: params.parsed("household_size"),
        has_children: params
            .parsed::<i32>("children")
            .into_iter()
            .filter(|v| matches!(v, 0 | 1))
            .collect(),
        age_buckets: parse_buckets(&params.all("age"), AGE_BUCKETS),
        income_buckets: parse_buckets(&params.all("income"), INCOME_BUCKETS),
    }
}

fn text_group(
    key: &'static str,
    label: &'static str,
    values: Vec<String>,
    params: &QueryParams,
) -> FilterGroup {
    FilterGroup {
        key,
        label,
        choices: values
            .into_iter()
            .map(|v| {
                let selected = params.has(key, &v);
                Choice::new(v.clone(), v, selected)
            })
            .collect(),
    }
}

fn bucket_group(
    key: &'static str,
    label: &'static str,
    table: &[RangeBucket],
    params: &QueryParams,
) -> FilterGroup {
    FilterGroup {
        key,
        label,
        choices: table
            .iter()
            .map(|b| Choice::new(b.key, b.key, params.has(key, b.key)))
            .collect(),
    }
}

/// Filter groups in display order, with the current selections ticked.
#[must_use]
pub fn filter_groups(options: CustomerFilterOptions, params: &QueryParams) -> Vec<FilterGroup> {
    let household = options.household_sizes.iter().map(ToString::to_string).collect();
    vec![
        text_group("gender", "Gender", options.genders, params),
        bucket_group("age", "Age", AGE_BUCKETS, params),
        bucket_group("income", "Monthly income", INCOME_BUCKETS, params),
        text_group("employment", "Employment", options.employment_statuses, params),
        text_group("occupation", "Occupation", options.occupations, params),
        text_group("education", "Education", options.educations, params),
        text_group("household_size", "Household size", household, params),
        FilterGroup {
            key: "children",
            label: "Has children",
            choices: vec![
                Choice::new("1", "Yes", params.has("children", "1")),
                Choice::new("0", "No", params.has("children", "0")),
            ],
        },
        text_group(
            "preferred_category",
            "Preferred category",
            options.preferred_categories,
            params,
        ),
    ]
}

/// GET /customers
#[instrument(skip(state, session, staff, raw))]
pub async fn index(
    RequirePermission(staff, _): CustomerStaff,
    State(state): State<AppState>,
    session: Session,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let filter = customer_filter(&params);

    let repo = CustomerRepository::new(state.pool());
    let total = repo.count(&filter).await?;
    let paginator = Paginator::new(params.first("page"), CUSTOMERS_PER_PAGE, total);
    let customers = repo
        .list(&filter, paginator.limit(), paginator.offset())
        .await?;
    let options = repo.filter_options().await?;

    render(&CustomerListTemplate {
        page: PageContext::load(&session, &staff, Section::Customers).await,
        customers,
        q: filter.search.clone().unwrap_or_default(),
        groups: filter_groups(options, &params),
        pages: PageLinks::new("/customers", &params.without_page(), &paginator),
    })
}

/// GET /customers/{id}
#[instrument(skip(state, session, staff, raw))]
pub async fn detail(
    RequirePermission(staff, _): CustomerStaff,
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<CustomerId>,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let params = QueryParams::parse(raw.as_deref());
    let repo = CustomerRepository::new(state.pool());
    let customer = repo
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("customer {id}")))?;

    let totals = repo.totals(id).await?;
    let paginator = Paginator::new(params.first("page"), ORDERS_PER_PAGE, totals.total_orders);
    let orders = repo
        .orders(id, paginator.limit(), paginator.offset())
        .await?;

    render(&CustomerDetailTemplate {
        page: PageContext::load(&session, &staff, Section::Customers).await,
        pages: PageLinks::new(&format!("/customers/{id}"), "", &paginator),
        customer,
        totals,
        orders,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_from_query() {
        let params = QueryParams::parse(Some(
            "gender=Female&age=20-30&age=60%2B&age=7-9&household_size=3&household_size=big&children=1&children=2",
        ));
        let filter = customer_filter(&params);
        assert_eq!(filter.genders, vec!["Female"]);
        let ages: Vec<&str> = filter.age_buckets.iter().map(|b| b.key).collect();
        assert_eq!(ages, vec!["20-30", "60+"]);
        assert_eq!(filter.household_sizes, vec![3]);
        assert_eq!(filter.has_children, vec![1]);
        assert!(filter.income_buckets.is_empty());
    }

    #[test]
    fn test_groups_tick_selected_values() {
        let options = CustomerFilterOptions {
            genders: vec!["Female".to_string(), "Male".to_string()],
            household_sizes: vec![1, 4],
            ..CustomerFilterOptions::default()
        };
        let params = QueryParams::parse(Some("gender=Male&household_size=4&income=20000%2B"));
        let groups = filter_groups(options, &params);

        let ticked: Vec<(&str, &str)> = groups
            .iter()
            .flat_map(|g| {
                g.choices
                    .iter()
                    .filter(|c| c.selected)
                    .map(move |c| (g.key, c.value.as_str()))
            })
            .collect();
        assert_eq!(
            ticked,
            vec![("gender", "Male"), ("income", "20000+"), ("household_size", "4")]
        );
    }
}
