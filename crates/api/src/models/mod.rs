//! Request and response models for the JSON API.

pub mod cart;
pub mod envelope;
pub mod order;
pub mod pagination;
pub mod product;
pub mod user;

pub use envelope::ApiResponse;
pub use pagination::{PageQuery, Pagination};
