//! Business services sitting between the routes and the repositories.

pub mod checkout;
pub mod orders;

pub use checkout::{CheckoutError, CheckoutService};
pub use orders::{OrderService, OrderUpdateError};
