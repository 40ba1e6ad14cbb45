//! Domain models for storefront.
//!
//! These are validated domain types, separate from the database row types in
//! [`crate::db`].

pub mod cart;
pub mod category;
pub mod customer;
pub mod order;
pub mod product;
pub mod session;
pub mod user;

pub use cart::{CartLine, CartSummary, GuestCart};
pub use category::Category;
pub use customer::{CustomerProfile, ProfileUpdate};
pub use order::{OrderDetail, OrderLine, OrderSummary, PaymentRecord, shipping_fee};
pub use product::Product;
pub use session::{CurrentUser, FlashLevel, FlashMessage, keys as session_keys};
pub use user::Account;
