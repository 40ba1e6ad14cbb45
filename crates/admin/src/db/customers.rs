//! Customer directory repository.

use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

use shopfront_core::{CustomerId, OrderId, OrderStatus, Price};

use super::{RepositoryError, contains_pattern, search_term};
use crate::models::{CustomerOrder, CustomerRecord, CustomerTotals};

const CUSTOMER_SELECT: &str = r"
    SELECT id,
           COALESCE(first_name, '') AS first_name,
           COALESCE(last_name, '') AS last_name,
           COALESCE(email, '') AS email,
           COALESCE(phone, '') AS phone,
           COALESCE(address, '') AS address,
           COALESCE(postal_code, '') AS postal_code,
           age, gender, employment_status, occupation, education,
           household_size, has_children, monthly_income, preferred_category
    FROM shop.customer
    WHERE TRUE
";

#[derive(Debug, FromRow)]
struct CustomerRow {
    id: CustomerId,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    address: String,
    postal_code: String,
    age: i32,
    gender: String,
    employment_status: String,
    occupation: String,
    education: String,
    household_size: i32,
    has_children: i32,
    monthly_income: Decimal,
    preferred_category: String,
}

impl From<CustomerRow> for CustomerRecord {
    fn from(row: CustomerRow) -> Self {
        Self {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            postal_code: row.postal_code,
            age: row.age,
            gender: row.gender,
            employment_status: row.employment_status,
            occupation: row.occupation,
            education: row.education,
            household_size: row.household_size,
            has_children: row.has_children != 0,
            monthly_income: row.monthly_income,
            preferred_category: row.preferred_category,
        }
    }
}

#[derive(Debug, FromRow)]
struct CustomerOrderRow {
    id: OrderId,
    order_date: chrono::NaiveDate,
    status: OrderStatus,
    order_price: Price,
    shipping_fee: Price,
    item_count: i64,
}

impl From<CustomerOrderRow> for CustomerOrder {
    fn from(row: CustomerOrderRow) -> Self {
        Self {
            id: row.id,
            order_date: row.order_date,
            status: row.status,
            order_price: row.order_price,
            shipping_fee: row.shipping_fee,
            item_count: row.item_count,
        }
    }
}

/// A half-open range filter: `lower <= value < upper`, open-ended when
/// `upper` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBucket {
    /// Query-string value, e.g. `20-30` or `60+`.
    pub key: &'static str,
    pub lower: i32,
    pub upper: Option<i32>,
}

/// Age filter buckets.
pub const AGE_BUCKETS: &[RangeBucket] = &[
    RangeBucket { key: "15-20", lower: 15, upper: Some(20) },
    RangeBucket { key: "20-30", lower: 20, upper: Some(30) },
    RangeBucket { key: "30-40", lower: 30, upper: Some(40) },
    RangeBucket { key: "40-50", lower: 40, upper: Some(50) },
    RangeBucket { key: "50-60", lower: 50, upper: Some(60) },
    RangeBucket { key: "60+", lower: 60, upper: None },
];

/// Monthly income filter buckets (SGD).
pub const INCOME_BUCKETS: &[RangeBucket] = &[
    RangeBucket { key: "0-2000", lower: 0, upper: Some(2000) },
    RangeBucket { key: "2000-5000", lower: 2000, upper: Some(5000) },
    RangeBucket { key: "5000-10000", lower: 5000, upper: Some(10000) },
    RangeBucket { key: "10000-20000", lower: 10000, upper: Some(20000) },
    RangeBucket { key: "20000+", lower: 20000, upper: None },
];

/// Resolve query values against a bucket table, dropping unknown keys.
#[must_use]
pub fn parse_buckets(values: &[String], table: &'static [RangeBucket]) -> Vec<RangeBucket> {
    table
        .iter()
        .filter(|bucket| values.iter().any(|v| v.trim() == bucket.key))
        .copied()
        .collect()
}

/// Filters for the customer list. Values within one field are OR-ed; fields
/// are AND-ed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilter {
    pub search: Option<String>,
    pub genders: Vec<String>,
    pub employment_statuses: Vec<String>,
    pub occupations: Vec<String>,
    pub educations: Vec<String>,
    pub preferred_categories: Vec<String>,
    pub household_sizes: Vec<i32>,
    /// `0` and/or `1`.
    pub has_children: Vec<i32>,
    pub age_buckets: Vec<RangeBucket>,
    pub income_buckets: Vec<RangeBucket>,
}

impl CustomerFilter {
    fn push_conditions(&self, qb: &mut QueryBuilder<'_, Postgres>) {
        if let Some(term) = search_term(self.search.as_deref()) {
            let pattern = contains_pattern(term);
            qb.push(" AND (");
            for (i, column) in [
                "first_name",
                "last_name",
                "email",
                "phone",
                "occupation",
                "education",
                "preferred_category",
            ]
            .into_iter()
            .enumerate()
            {
                if i > 0 {
                    qb.push(" OR ");
                }
                qb.push(column).push(" ILIKE ").push_bind(pattern.clone());
            }
            qb.push(")");
        }

        push_any(qb, "gender", &self.genders);
        push_any(qb, "employment_status", &self.employment_statuses);
        push_any(qb, "occupation", &self.occupations);
        push_any(qb, "education", &self.educations);
        push_any(qb, "preferred_category", &self.preferred_categories);

        if !self.household_sizes.is_empty() {
            qb.push(" AND household_size = ANY(")
                .push_bind(self.household_sizes.clone())
                .push(")");
        }
        if !self.has_children.is_empty() {
            qb.push(" AND has_children = ANY(")
                .push_bind(self.has_children.clone())
                .push(")");
        }

        push_buckets(qb, "age", &self.age_buckets, |v| v);
        push_buckets(qb, "monthly_income", &self.income_buckets, Decimal::from);
    }
}

fn push_any(qb: &mut QueryBuilder<'_, Postgres>, column: &'static str, values: &[String]) {
    if values.is_empty() {
        return;
    }
    qb.push(" AND ")
        .push(column)
        .push(" = ANY(")
        .push_bind(values.to_vec())
        .push(")");
}

fn push_buckets<T, F>(
    qb: &mut QueryBuilder<'_, Postgres>,
    column: &'static str,
    buckets: &[RangeBucket],
    to_bind: F,
) where
    T: for<'q> sqlx::Encode<'q, Postgres> + sqlx::Type<Postgres> + Send + 'static,
    F: Fn(i32) -> T,
{
    if buckets.is_empty() {
        return;
    }
    qb.push(" AND (");
    for (i, bucket) in buckets.iter().enumerate() {
        if i > 0 {
            qb.push(" OR ");
        }
        qb.push("(")
            .push(column)
            .push(" >= ")
            .push_bind(to_bind(bucket.lower));
        if let Some(upper) = bucket.upper {
            qb.push(" AND ").push(column).push(" < ").push_bind(to_bind(upper));
        }
        qb.push(")");
    }
    qb.push(")");
}

/// Distinct values present in the table, offered as filter choices.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerFilterOptions {
    pub genders: Vec<String>,
    pub employment_statuses: Vec<String>,
    pub occupations: Vec<String>,
    pub educations: Vec<String>,
    pub preferred_categories: Vec<String>,
    pub household_sizes: Vec<i32>,
}

/// A customer row from the CSV import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCustomer {
    pub age: i32,
    pub gender: String,
    pub employment_status: String,
    pub occupation: String,
    pub education: String,
    pub household_size: i32,
    pub has_children: i32,
    pub monthly_income: Decimal,
    pub preferred_category: String,
}

/// Repository for customer reads and imports.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Count customers matching `filter`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count(&self, filter: &CustomerFilter) -> Result<i64, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM shop.customer WHERE TRUE");
        filter.push_conditions(&mut qb);
        let count = qb.build_query_scalar::<i64>().fetch_one(self.pool).await?;
        Ok(count)
    }

    /// One page of customers, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        filter: &CustomerFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CustomerRecord>, RepositoryError> {
        let mut qb = QueryBuilder::<Postgres>::new(CUSTOMER_SELECT);
        filter.push_conditions(&mut qb);
        qb.push(" ORDER BY id LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);
        let rows = qb.build_query_as::<CustomerRow>().fetch_all(self.pool).await?;
        Ok(rows.into_iter().map(CustomerRecord::from).collect())
    }

    /// Distinct non-empty values for each filterable column.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any query fails.
    pub async fn filter_options(&self) -> Result<CustomerFilterOptions, RepositoryError> {
        let household_sizes = sqlx::query_scalar::<_, i32>(
            "SELECT DISTINCT household_size FROM shop.customer ORDER BY 1",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(CustomerFilterOptions {
            genders: self.distinct_text("gender").await?,
            employment_statuses: self.distinct_text("employment_status").await?,
            occupations: self.distinct_text("occupation").await?,
            educations: self.distinct_text("education").await?,
            preferred_categories: self.distinct_text("preferred_category").await?,
            household_sizes,
        })
    }

    async fn distinct_text(&self, column: &'static str) -> Result<Vec<String>, RepositoryError> {
        let sql = format!(
            "SELECT DISTINCT {column} FROM shop.customer \
             WHERE {column} IS NOT NULL AND btrim({column}) <> '' ORDER BY 1"
        );
        let values = sqlx::query_scalar::<_, String>(&sql)
            .fetch_all(self.pool)
            .await?;
        Ok(values)
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: CustomerId) -> Result<Option<CustomerRecord>, RepositoryError> {
        let sql = format!("{CUSTOMER_SELECT} AND id = $1");
        let row = sqlx::query_as::<_, CustomerRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(CustomerRecord::from))
    }

    /// Order count and lifetime spend.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self, id: CustomerId) -> Result<CustomerTotals, RepositoryError> {
        let (total_orders, total_spent) = sqlx::query_as::<_, (i64, Price)>(
            r#"
            SELECT COUNT(*), COALESCE(SUM(order_price), 0)
            FROM shop."order"
            WHERE customer_id = $1
            "#,
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(CustomerTotals {
            total_orders,
            total_spent,
        })
    }

    /// One page of a customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders(
        &self,
        id: CustomerId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CustomerOrder>, RepositoryError> {
        let rows = sqlx::query_as::<_, CustomerOrderRow>(
            r#"
            SELECT o.id, o.order_date, o.status, o.order_price, o.shipping_fee,
                   (SELECT COALESCE(SUM(i.quantity), 0) FROM shop.order_item i
                     WHERE i.order_id = o.id)::BIGINT AS item_count
            FROM shop."order" o
            WHERE o.customer_id = $1
            ORDER BY o.order_date DESC, o.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool)
        .await?;
        Ok(rows.into_iter().map(CustomerOrder::from).collect())
    }

    /// Insert customers in one transaction, returning how many were created.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if any insert fails; nothing is
    /// written in that case.
    pub async fn insert_many(&self, customers: &[NewCustomer]) -> Result<usize, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        for customer in customers {
            sqlx::query(
                r"
                INSERT INTO shop.customer
                    (age, gender, employment_status, occupation, education,
                     household_size, has_children, monthly_income, preferred_category)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                ",
            )
            .bind(customer.age)
            .bind(&customer.gender)
            .bind(&customer.employment_status)
            .bind(&customer.occupation)
            .bind(&customer.education)
            .bind(customer.household_size)
            .bind(customer.has_children)
            .bind(customer.monthly_income)
            .bind(&customer.preferred_category)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(customers.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_parse_buckets_keeps_table_order_and_drops_unknown() {
        let buckets = parse_buckets(&strings(&["60+", "bogus", "20-30"]), AGE_BUCKETS);
        let keys: Vec<&str> = buckets.iter().map(|b| b.key).collect();
        assert_eq!(keys, vec!["20-30", "60+"]);
        assert_eq!(buckets[1].upper, None);
    }

    #[test]
    fn test_income_buckets_are_contiguous() {
        for pair in INCOME_BUCKETS.windows(2) {
            assert_eq!(pair[0].upper, Some(pair[1].lower));
        }
    }

    #[test]
    fn test_bucket_sql_is_half_open_and_ored() {
        let filter = CustomerFilter {
            age_buckets: parse_buckets(&strings(&["15-20", "60+"]), AGE_BUCKETS),
            ..CustomerFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        filter.push_conditions(&mut qb);
        assert_eq!(
            qb.sql(),
            "SELECT 1 WHERE TRUE AND ((age >= $1 AND age < $2) OR (age >= $3))"
        );
    }

    #[test]
    fn test_search_covers_profile_columns() {
        let filter = CustomerFilter {
            search: Some("nurse".to_string()),
            genders: strings(&["Female"]),
            household_sizes: vec![3],
            has_children: vec![1],
            ..CustomerFilter::default()
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1 WHERE TRUE");
        filter.push_conditions(&mut qb);
        let sql = qb.sql();
        assert!(sql.contains("occupation ILIKE $5"));
        assert!(sql.contains("preferred_category ILIKE $7"));
        assert!(sql.contains("gender = ANY($8)"));
        assert!(sql.contains("household_size = ANY($9)"));
        assert!(sql.contains("has_children = ANY($10)"));
    }
}
