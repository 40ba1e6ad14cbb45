//! Cart operations for guests and signed-in shoppers.
//!
//! Guests keep their cart in the session under `cart`; signed-in shoppers
//! use the database cart. Handlers pick the owner once and call the same
//! operations either way.

use sqlx::PgPool;
use thiserror::Error;
use tower_sessions::Session;
use tracing::instrument;

use shopfront_core::{CustomerId, Sku};

use crate::db::RepositoryError;
use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::models::{CartLine, CartSummary, GuestCart, Product, session_keys};

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// Product is missing or hidden.
    #[error("product not found")]
    ProductNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),
}

/// Whose cart an operation applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartOwner {
    Guest,
    Customer(CustomerId),
}

/// Cart service bound to one request's session.
pub struct CartService<'a> {
    session: &'a Session,
    owner: CartOwner,
    products: ProductRepository<'a>,
    carts: CartRepository<'a>,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, session: &'a Session, owner: CartOwner) -> Self {
        Self {
            session,
            owner,
            products: ProductRepository::new(pool),
            carts: CartRepository::new(pool),
        }
    }

    /// Add `quantity` units of a visible product. Returns the product.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductNotFound` for a missing or hidden SKU.
    #[instrument(skip(self), fields(sku = %sku))]
    pub async fn add(&self, sku: &Sku, quantity: i32) -> Result<Product, CartError> {
        let product = self
            .products
            .get_visible(sku)
            .await?
            .ok_or(CartError::ProductNotFound)?;
        let quantity = quantity.max(1);

        match self.owner {
            CartOwner::Customer(customer_id) => {
                self.carts.add_item(customer_id, sku, quantity).await?;
            }
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                cart.add(sku.clone(), quantity);
                save_guest_cart(self.session, &cart).await?;
            }
        }

        Ok(product)
    }

    /// Apply `(sku, quantity)` updates. Zero or below removes a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn update(&self, updates: &[(Sku, i32)]) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Customer(customer_id) => {
                for (sku, quantity) in updates {
                    self.carts.set_quantity(customer_id, sku, *quantity).await?;
                }
            }
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                for (sku, quantity) in updates {
                    if cart.quantity(sku).is_some() {
                        cart.set(sku.clone(), *quantity);
                    }
                }
                save_guest_cart(self.session, &cart).await?;
            }
        }
        Ok(())
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn remove(&self, sku: &Sku) -> Result<(), CartError> {
        match self.owner {
            CartOwner::Customer(customer_id) => {
                self.carts.remove_item(customer_id, sku).await?;
            }
            CartOwner::Guest => {
                let mut cart = load_guest_cart(self.session).await?;
                if cart.remove(sku) {
                    save_guest_cart(self.session, &cart).await?;
                }
            }
        }
        Ok(())
    }

    /// Current lines and total.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn summary(&self) -> Result<CartSummary, CartError> {
        let lines = match self.owner {
            CartOwner::Customer(customer_id) => self.carts.lines(customer_id).await?,
            CartOwner::Guest => {
                let cart = load_guest_cart(self.session).await?;
                let skus: Vec<Sku> = cart.skus().cloned().collect();
                let products = self.products.get_visible_many(&skus).await?;
                guest_lines(&cart, &products)
            }
        };
        Ok(CartSummary::from_lines(lines))
    }

    /// Header badge count: line count for customers, unit count for guests.
    ///
    /// # Errors
    ///
    /// Returns `CartError` if storage fails.
    pub async fn count(&self) -> Result<i64, CartError> {
        match self.owner {
            CartOwner::Customer(customer_id) => Ok(self.carts.line_count(customer_id).await?),
            CartOwner::Guest => Ok(load_guest_cart(self.session).await?.total_quantity()),
        }
    }
}

/// Move the session cart into the customer's database cart, then clear it.
///
/// # Errors
///
/// Returns `CartError` if the merge transaction or session write fails. The
/// session cart is kept in that case.
#[instrument(skip(pool, session), fields(customer_id = %customer_id))]
pub async fn merge_guest_cart(
    pool: &PgPool,
    session: &Session,
    customer_id: CustomerId,
) -> Result<u64, CartError> {
    let cart = load_guest_cart(session).await?;
    if cart.is_empty() {
        return Ok(0);
    }

    let skus: Vec<Sku> = cart.skus().cloned().collect();
    let visible = ProductRepository::new(pool).get_visible_many(&skus).await?;
    let lines = merge_plan(&cart, &visible);
    let merged = CartRepository::new(pool).merge_lines(customer_id, &lines).await?;
    session.remove::<GuestCart>(session_keys::CART).await?;

    tracing::info!(
        lines = lines.len(),
        dropped = skus.len() - lines.len(),
        merged,
        "Guest cart merged"
    );
    Ok(merged)
}

/// Guest cart lines worth carrying into a customer's cart: those whose
/// product is still visible, in guest cart order.
#[must_use]
pub fn merge_plan(cart: &GuestCart, visible: &[Product]) -> Vec<(Sku, i32)> {
    cart.iter()
        .filter(|(sku, _)| visible.iter().any(|p| &p.sku == *sku))
        .map(|(sku, quantity)| (sku.clone(), quantity))
        .collect()
}

/// Read the guest cart from the session (empty when absent).
///
/// # Errors
///
/// Returns the session error if the store cannot be read.
pub async fn load_guest_cart(session: &Session) -> Result<GuestCart, tower_sessions::session::Error> {
    Ok(session
        .get::<GuestCart>(session_keys::CART)
        .await?
        .unwrap_or_default())
}

async fn save_guest_cart(
    session: &Session,
    cart: &GuestCart,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART, cart).await
}

/// Render guest cart entries against the products that still exist.
///
/// Entries with no matching product are skipped. Lines follow the order of
/// `products`.
#[must_use]
pub fn guest_lines(cart: &GuestCart, products: &[Product]) -> Vec<CartLine> {
    products
        .iter()
        .filter_map(|product| {
            cart.quantity(&product.sku).map(|quantity| CartLine {
                sku: product.sku.clone(),
                name: product.name.clone(),
                unit_price: product.unit_price,
                quantity,
                quantity_on_hand: product.quantity_on_hand,
                available: true,
            })
        })
        .collect()
}

/// Parse `qty_<sku>` form fields into quantity updates.
///
/// Fields with another prefix, an invalid SKU or a non-integer value are
/// ignored.
#[must_use]
pub fn parse_quantity_updates<'f, I>(fields: I) -> Vec<(Sku, i32)>
where
    I: IntoIterator<Item = (&'f str, &'f str)>,
{
    fields
        .into_iter()
        .filter_map(|(name, value)| {
            let sku = Sku::parse(name.strip_prefix("qty_")?).ok()?;
            let quantity = value.trim().parse::<i32>().ok()?;
            Some((sku, quantity))
        })
        .collect()
}
