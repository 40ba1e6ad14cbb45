//! Domain models for the admin panel.
//!
//! Repositories convert database rows into these types; handlers turn them
//! into template views.

pub mod catalogue;
pub mod customer;
pub mod dashboard;
pub mod session;
pub mod staff;

pub use catalogue::{AdminProduct, CategorySummary, SubcategorySummary};
pub use customer::{CustomerOrder, CustomerRecord, CustomerTotals};
pub use dashboard::{InventoryKpis, LowStockItem, SalesKpis, TopProduct};
pub use session::{CurrentStaff, FlashLevel, FlashMessage, keys as session_keys};
pub use staff::StaffUser;
